//! The validation pipeline: load, discover, infer, check.

use crate::config::{InferenceMode, ValidatorConfig};
use crate::discovery::{SchemaCoverage, SchemaDiscovery};
use crate::error::{ReturnCode, ValidationError};
use crate::graph::{
    DocumentKind, GraphLoader, RdfGraph, display_path, extract_external_references,
    extract_observed_types,
};
use crate::inference::InferenceEngine;
use crate::logging::stage_span;
use crate::registry::RegistryResolver;
use crate::shacl::{ConstraintEngine, ShaclEngine, ShaclResult};
use crate::{log_progress, log_slow_operation};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

const SLOW_ENGINE_MS: u64 = 5_000;

// =============================================================================
// Validation Result
// =============================================================================

fn duration_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Outcome of one run. Built once by the producing stage and read-only afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub(crate) conforms: bool,
    pub(crate) return_code: ReturnCode,
    pub(crate) report_text: String,
    #[serde(skip)]
    pub(crate) report_graph: Option<RdfGraph>,
    pub(crate) files_validated: Vec<String>,
    pub(crate) loaded_triples: usize,
    pub(crate) fixtures_loaded: usize,
    pub(crate) inferred_triples: usize,
    pub(crate) total_triples: usize,
    pub(crate) ontology_files: Vec<String>,
    pub(crate) shape_files: Vec<String>,
    pub(crate) domains: BTreeSet<String>,
    pub(crate) unresolved_types: BTreeSet<String>,
    pub(crate) coverage: Option<SchemaCoverage>,
    pub(crate) results: Vec<ShaclResult>,
    pub(crate) warnings: Vec<String>,
    pub(crate) errors: Vec<String>,
    #[serde(rename = "duration_seconds", serialize_with = "duration_secs")]
    pub(crate) duration: Duration,
    pub(crate) finished_at: DateTime<Utc>,
}

impl ValidationResult {
    /// A result with only the verdict filled in. `conforms` follows the code.
    pub(crate) fn new(
        return_code: ReturnCode,
        report_text: impl Into<String>,
        files_validated: Vec<String>,
    ) -> Self {
        Self {
            conforms: return_code.is_success(),
            return_code,
            report_text: report_text.into(),
            report_graph: None,
            files_validated,
            loaded_triples: 0,
            fixtures_loaded: 0,
            inferred_triples: 0,
            total_triples: 0,
            ontology_files: Vec::new(),
            shape_files: Vec::new(),
            domains: BTreeSet::new(),
            unresolved_types: BTreeSet::new(),
            coverage: None,
            results: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            duration: Duration::ZERO,
            finished_at: Utc::now(),
        }
    }

    pub(crate) fn finish(mut self, started: Instant) -> Self {
        self.duration = started.elapsed();
        self.finished_at = Utc::now();
        self
    }

    pub fn conforms(&self) -> bool {
        self.conforms
    }

    pub fn return_code(&self) -> ReturnCode {
        self.return_code
    }

    pub fn report_text(&self) -> &str {
        &self.report_text
    }

    pub fn report_graph(&self) -> Option<&RdfGraph> {
        self.report_graph.as_ref()
    }

    pub fn files_validated(&self) -> &[String] {
        &self.files_validated
    }

    /// Triples of the instance data, fixtures included.
    pub fn loaded_triples(&self) -> usize {
        self.loaded_triples
    }

    pub fn fixtures_loaded(&self) -> usize {
        self.fixtures_loaded
    }

    pub fn inferred_triples(&self) -> usize {
        self.inferred_triples
    }

    /// Size of the graph handed to the constraint engine.
    pub fn total_triples(&self) -> usize {
        self.total_triples
    }

    pub fn ontology_files(&self) -> &[String] {
        &self.ontology_files
    }

    pub fn shape_files(&self) -> &[String] {
        &self.shape_files
    }

    pub fn domains(&self) -> &BTreeSet<String> {
        &self.domains
    }

    pub fn unresolved_types(&self) -> &BTreeSet<String> {
        &self.unresolved_types
    }

    pub fn coverage(&self) -> Option<SchemaCoverage> {
        self.coverage
    }

    pub fn results(&self) -> &[ShaclResult] {
        &self.results
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    /// One-line verdict for terminals and logs.
    pub fn summary(&self) -> String {
        format!(
            "{} | {} | files: {} | triples: {} ({} inferred) | {:.2}s",
            if self.conforms { "CONFORMS" } else { "DOES NOT CONFORM" },
            self.return_code,
            self.files_validated.len(),
            self.total_triples,
            self.inferred_triples,
            self.duration.as_secs_f64()
        )
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary())?;
        for warning in &self.warnings {
            writeln!(f, "warning: {warning}")?;
        }
        for error in &self.errors {
            writeln!(f, "error: {error}")?;
        }
        if !self.conforms && !self.report_text.is_empty() {
            write!(f, "{}", self.report_text)?;
        }
        Ok(())
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Sequences loading, schema discovery, inference and constraint checking.
///
/// Holds no per-run state, so one orchestrator can validate any number of
/// file sets. The resolver is shared read-only.
pub struct ValidationOrchestrator {
    config: ValidatorConfig,
    resolver: Arc<RegistryResolver>,
    engine: Box<dyn ConstraintEngine>,
    inference: InferenceEngine,
}

impl ValidationOrchestrator {
    pub fn new(config: ValidatorConfig) -> Self {
        let resolver = Arc::new(RegistryResolver::new(&config.root_directory));
        Self {
            config,
            resolver,
            engine: Box::new(ShaclEngine::new()),
            inference: InferenceEngine::new(),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<RegistryResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_engine(mut self, engine: Box<dyn ConstraintEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn resolver(&self) -> &Arc<RegistryResolver> {
        &self.resolver
    }

    /// Validates `files` against the schemas their types resolve to.
    ///
    /// Parse failures of instance or schema documents are returned as errors.
    /// Everything else, including an unavailable engine and non-conformance,
    /// is reported through the result's return code.
    pub fn validate<P: AsRef<Path>>(&self, files: &[P]) -> Result<ValidationResult, ValidationError> {
        let started = Instant::now();
        let verbose = self.config.verbose;
        let root = &self.config.root_directory;
        let files_validated: Vec<String> = files
            .iter()
            .map(|file| display_path(&self.config.resolve_path(file), root))
            .collect();

        if !self.engine.is_available() {
            warn!(engine = self.engine.name(), "constraint engine unavailable");
            let message = format!(
                "Error: constraint engine '{}' is not available",
                self.engine.name()
            );
            return Ok(
                ValidationResult::new(ReturnCode::MissingDependency, message, files_validated)
                    .finish(started),
            );
        }
        self.config.validate()?;

        let loader = GraphLoader::new(root).with_resolver(Arc::clone(&self.resolver));
        let mut warnings: Vec<String> = self.resolver.warnings().to_vec();

        // Stage 1: instance data and the fixtures it references
        let data = {
            let _span = stage_span("load").entered();
            loader.load(files)?
        };
        let prefixes = data.prefixes.len();
        let data = data.graph;
        let data_triples = data.len()?;
        log_progress!(verbose, files = files.len(), triples = data_triples, prefixes, "loaded instance data");

        let references = extract_external_references(&data)?;
        let fixtures_loaded = if references.is_empty() {
            0
        } else {
            let _span = stage_span("fixtures").entered();
            loader.load_fixtures_for(&references, &self.resolver, &data)?
        };
        if fixtures_loaded < references.len() {
            let unresolved = references.len() - fixtures_loaded;
            log_progress!(verbose, unresolved, "some external references were not loaded from fixtures");
        }
        let loaded_triples = data.len()?;

        // Stage 2: schema discovery
        let discovered = {
            let _span = stage_span("discover").entered();
            let observed = extract_observed_types(&data)?;
            log_progress!(verbose, types = observed.len(), "extracted observed types");
            SchemaDiscovery::new(&self.resolver).discover(&observed)
        };
        let coverage = discovered.coverage();
        match coverage {
            SchemaCoverage::Complete => {}
            SchemaCoverage::Partial | SchemaCoverage::Unresolved => {
                let types: Vec<&str> = discovered.unresolved_types.iter().map(String::as_str).collect();
                warnings.push(format!(
                    "no registered domain for {} type(s): {}",
                    types.len(),
                    types.join(", ")
                ));
            }
            SchemaCoverage::Untyped => {
                warnings.push("instance data declares no rdf:type; no domain schemas apply".to_string());
            }
        }

        let (ontology, ontology_files) = {
            let _span = stage_span("ontology").entered();
            self.load_schemas(&loader, &discovered.ontology_paths, SchemaRole::Ontology, &mut warnings)?
        };
        let (shapes, shape_files) = {
            let _span = stage_span("shapes").entered();
            self.load_schemas(&loader, &discovered.shape_paths, SchemaRole::Shapes, &mut warnings)?
        };
        let ontology_triples = ontology.len()?;
        let shape_triples = shapes.len()?;
        log_progress!(
            verbose,
            domains = discovered.domains.len(),
            ontology_files = ontology_files.len(),
            shape_files = shape_files.len(),
            ontology_triples,
            shape_triples,
            "loaded schemas"
        );
        if shape_triples == 0 {
            warn!("no SHACL shapes discovered, the data trivially conforms");
            warnings.push("no SHACL shapes discovered; the data trivially conforms".to_string());
        }

        // Stage 3: inference
        let mode = self.config.inference_mode;
        let (combined, inferred_triples) = {
            let _span = stage_span("inference").entered();
            match mode {
                InferenceMode::Rdfs => {
                    let outcome = self.inference.infer(&data, &ontology)?;
                    if !outcome.stats.reached_fixpoint {
                        warnings.push(format!(
                            "inference stopped after {} rounds without reaching a fixpoint",
                            outcome.stats.rounds
                        ));
                    }
                    let inferred = outcome.inferred();
                    (outcome.graph, inferred)
                }
                InferenceMode::None => (RdfGraph::union(&[&data, &ontology])?, 0),
            }
        };
        let total_triples = combined.len()?;
        log_progress!(verbose, %mode, inferred = inferred_triples, total = total_triples, "inference complete");

        // Stage 4: constraint checking
        let engine_started = Instant::now();
        let outcome = {
            let _span = stage_span("constraints").entered();
            self.engine.check(&combined, &shapes, Some(&ontology), mode)
        };
        log_slow_operation!(
            engine_started.elapsed(),
            SLOW_ENGINE_MS,
            engine = self.engine.name(),
            "constraint engine finished"
        );

        let mut result = match outcome {
            Ok(outcome) => {
                let code = if outcome.conforms {
                    ReturnCode::Success
                } else {
                    ReturnCode::ConformanceError
                };
                let mut result = ValidationResult::new(code, outcome.report_text, files_validated);
                result.report_graph = outcome.report_graph;
                result.results = outcome.results;
                warnings.extend(outcome.warnings);
                result
            }
            Err(e) => {
                let message = format!("Validation error: {e}");
                warn!(engine = self.engine.name(), error = %e, "constraint engine failed");
                let mut result =
                    ValidationResult::new(ReturnCode::ConformanceError, message.clone(), files_validated);
                result.errors.push(message);
                result
            }
        };

        result.loaded_triples = loaded_triples;
        result.fixtures_loaded = fixtures_loaded;
        result.inferred_triples = inferred_triples;
        result.total_triples = total_triples;
        result.ontology_files = ontology_files;
        result.shape_files = shape_files;
        result.domains = discovered.domains;
        result.unresolved_types = discovered.unresolved_types;
        result.coverage = Some(coverage);
        result.warnings = warnings;
        let result = result.finish(started);

        log_progress!(
            verbose,
            conforms = result.conforms,
            code = %result.return_code,
            duration_ms = result.duration.as_millis() as u64,
            "validation finished"
        );
        Ok(result)
    }

    /// Loads schema files into one graph. Files that do not exist are skipped
    /// with a warning; parse failures abort the run.
    fn load_schemas(
        &self,
        loader: &GraphLoader,
        paths: &[PathBuf],
        role: SchemaRole,
        warnings: &mut Vec<String>,
    ) -> Result<(RdfGraph, Vec<String>), ValidationError> {
        let combined = RdfGraph::new()?;
        let mut loaded = Vec::new();

        for path in paths {
            let absolute = self.resolver.to_absolute(path);
            let display_name = display_path(&absolute, &self.config.root_directory);
            if !absolute.is_file() {
                warn!(file = %display_name, ?role, "schema file not found");
                warnings.push(format!("{} file not found: {}", role.label(), display_name));
                continue;
            }

            let (graph, kind) = loader.load_document(&absolute)?;
            if !role.accepts(kind) {
                warn!(file = %display_name, ?kind, ?role, "schema file does not declare what its role expects");
            }
            combined.merge_from(&graph)?;
            loaded.push(display_name);
        }
        Ok((combined, loaded))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchemaRole {
    Ontology,
    Shapes,
}

impl SchemaRole {
    fn label(self) -> &'static str {
        match self {
            SchemaRole::Ontology => "ontology",
            SchemaRole::Shapes => "shapes",
        }
    }

    /// Base vocabularies may only declare properties, so any non-shape
    /// document is acceptable as an ontology.
    fn accepts(self, kind: DocumentKind) -> bool {
        match self {
            SchemaRole::Ontology => kind != DocumentKind::Shapes,
            SchemaRole::Shapes => kind.has_shapes(),
        }
    }
}
