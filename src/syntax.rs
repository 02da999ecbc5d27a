//! Syntax checking of instance and schema documents.
//!
//! JSON-LD documents are checked as JSON; their RDF interpretation needs the
//! registry contexts and is left to the full validation run. Turtle documents
//! are parsed completely.

use crate::error::{GraphError, ReturnCode};
use crate::graph::{DocumentFormat, GraphLoader, display_path};
use crate::validator::ValidationResult;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};

/// Outcome for a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCheck {
    pub file: String,
    pub format: DocumentFormat,
    /// `None` when the file parsed
    pub error: Option<String>,
    pub triples: usize,
}

impl FileCheck {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Code reported for this file. Only meaningful when the file failed.
    pub fn return_code(&self) -> ReturnCode {
        match (self.is_valid(), self.format) {
            (true, _) => ReturnCode::Success,
            (false, DocumentFormat::JsonLd) => ReturnCode::JsonSyntaxError,
            (false, DocumentFormat::Turtle) => ReturnCode::TurtleSyntaxError,
        }
    }
}

pub struct SyntaxChecker {
    root: PathBuf,
    loader: GraphLoader,
}

impl SyntaxChecker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let loader = GraphLoader::new(root.clone());
        Self { root, loader }
    }

    /// Checks every file without stopping at the first failure.
    ///
    /// The result carries one error line per failing file. When several
    /// formats fail, the Turtle code wins over the JSON one.
    pub fn check<P: AsRef<Path>>(&self, files: &[P]) -> ValidationResult {
        let started = Instant::now();
        if files.is_empty() {
            let mut result =
                ValidationResult::new(ReturnCode::GeneralError, "No files found to check.", Vec::new());
            result.errors.push("No files found to check.".to_string());
            return result.finish(started);
        }

        let checks: Vec<FileCheck> = files.iter().map(|file| self.check_file(file.as_ref())).collect();

        let code = checks
            .iter()
            .filter(|check| !check.is_valid())
            .map(FileCheck::return_code)
            .max_by_key(ReturnCode::code)
            .unwrap_or(ReturnCode::Success);
        let failed = checks.iter().filter(|check| !check.is_valid()).count();

        let report_text = if failed == 0 {
            format!("All {} file(s) are syntactically valid.", checks.len())
        } else {
            format!("{} of {} file(s) failed the syntax check.", failed, checks.len())
        };

        let mut result = ValidationResult::new(
            code,
            report_text,
            checks.iter().map(|check| check.file.clone()).collect(),
        );
        result.loaded_triples = checks.iter().map(|check| check.triples).sum();
        result.total_triples = result.loaded_triples;
        result.errors = checks.into_iter().filter_map(|check| check.error).collect();
        result.finish(started)
    }

    pub fn check_file(&self, path: &Path) -> FileCheck {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        let display_name = display_path(&absolute, &self.root);
        let format = DocumentFormat::from_path(&absolute);

        let mut check = FileCheck {
            file: display_name.clone(),
            format,
            error: None,
            triples: 0,
        };

        if !absolute.is_file() {
            warn!(file = %display_name, "file not found");
            check.error = Some(format!("File not found: {display_name}"));
            return check;
        }

        let outcome = match format {
            DocumentFormat::JsonLd => check_json(&absolute, &display_name),
            DocumentFormat::Turtle => self
                .loader
                .load_document(&absolute)
                .and_then(|(graph, _)| graph.len())
                .map_err(|e| describe_graph_error(&display_name, &e)),
        };

        match outcome {
            Ok(triples) => {
                debug!(file = %display_name, %format, triples, "syntax ok");
                check.triples = triples;
            }
            Err(message) => {
                warn!(file = %display_name, %format, "syntax error");
                check.error = Some(message);
            }
        }
        check
    }
}

fn check_json(path: &Path, display: &str) -> Result<usize, String> {
    let bytes = fs::read(path).map_err(|e| format!("Error reading {display}: {e}"))?;
    serde_json::from_slice::<serde_json::Value>(&bytes)
        .map(|_| 0)
        .map_err(|e| {
            format!(
                "Syntax Error in {display}: line {}, column {}: {e}",
                e.line(),
                e.column()
            )
        })
}

fn describe_graph_error(display: &str, error: &GraphError) -> String {
    match error {
        GraphError::Parse { message, .. } => format!("Syntax Error in {display}: {message}"),
        other => format!("Error reading {display}: {other}"),
    }
}
