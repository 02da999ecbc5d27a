//! Error types and return codes.
//!
//! Two families live here:
//! - [`ReturnCode`], the stable numeric verdict carried by every
//!   [`ValidationResult`](crate::validator::ValidationResult) and used as the
//!   process exit status
//! - `thiserror` enums for the failures that can escape a stage

use crate::graph::DocumentFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// RETURN CODES
// =============================================================================

/// Numeric outcome of a validation run.
///
/// Codes are grouped by hundreds: 0 success, 1 general failure, 99 missing
/// dependency, 1xx syntax, 2xx coherence and conformance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum ReturnCode {
    /// Everything conforms
    Success = 0,
    /// Unexpected failure
    GeneralError = 1,
    /// The constraint engine is not available
    MissingDependency = 99,
    /// Generic syntax failure
    SyntaxError = 100,
    /// JSON or JSON-LD document failed to parse
    JsonSyntaxError = 101,
    /// Turtle document failed to parse
    TurtleSyntaxError = 102,
    /// Ontology and shapes disagree
    CoherenceError = 200,
    /// A shape targets a class no ontology declares
    MissingTargetClass = 201,
    /// Data does not conform to the discovered shapes
    ConformanceError = 210,
    /// A specific SHACL violation
    ShaclViolation = 211,
}

impl ReturnCode {
    pub fn code(&self) -> i32 {
        *self as i32
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ReturnCode::Success)
    }

    pub fn is_error(&self) -> bool {
        !self.is_success()
    }

    /// Category label used in logs and serialized summaries.
    pub fn category(&self) -> &'static str {
        match self {
            ReturnCode::Success => "success",
            ReturnCode::GeneralError => "general",
            ReturnCode::MissingDependency => "dependency",
            ReturnCode::SyntaxError
            | ReturnCode::JsonSyntaxError
            | ReturnCode::TurtleSyntaxError => "syntax",
            ReturnCode::CoherenceError | ReturnCode::MissingTargetClass => "coherence",
            ReturnCode::ConformanceError | ReturnCode::ShaclViolation => "conformance",
        }
    }

    /// Process exit status for this code. Every code fits in a byte.
    pub fn exit_status(&self) -> u8 {
        u8::try_from(self.code()).unwrap_or(1)
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

// =============================================================================
// GRAPH ERRORS
// =============================================================================

/// Failures while reading, parsing or storing RDF.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {format} document '{path}': {message}")]
    Parse {
        path: String,
        format: DocumentFormat,
        message: String,
    },

    #[error("invalid JSON in '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid IRI '{iri}': {message}")]
    InvalidIri { iri: String, message: String },

    #[error("graph storage error: {0}")]
    Storage(String),

    #[error("SPARQL update failed: {0}")]
    Update(String),
}

impl GraphError {
    /// Return code a syntax check reports for this failure.
    pub fn return_code(&self) -> ReturnCode {
        match self {
            GraphError::Parse {
                format: DocumentFormat::Turtle,
                ..
            } => ReturnCode::TurtleSyntaxError,
            GraphError::Parse {
                format: DocumentFormat::JsonLd,
                ..
            }
            | GraphError::Json { .. } => ReturnCode::JsonSyntaxError,
            GraphError::InvalidIri { .. } => ReturnCode::SyntaxError,
            GraphError::Io { .. } | GraphError::Storage(_) | GraphError::Update(_) => {
                ReturnCode::GeneralError
            }
        }
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(self, GraphError::Parse { .. } | GraphError::Json { .. })
    }
}

impl From<oxigraph::store::StorageError> for GraphError {
    fn from(error: oxigraph::store::StorageError) -> Self {
        GraphError::Storage(error.to_string())
    }
}

// =============================================================================
// REGISTRY AND CATALOG ERRORS
// =============================================================================

/// Failures reading an XML catalog. Always degraded to a warning by the resolver.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog '{path}': {message}")]
    Xml { path: PathBuf, message: String },
}

/// Failures reading the registry document. Always degraded to a warning.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read registry '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed registry '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// =============================================================================
// CONFIGURATION, ENGINE AND PIPELINE ERRORS
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("root directory {0:?} does not exist")]
    RootNotFound(PathBuf),

    #[error("root directory {0:?} is not a directory")]
    RootNotDirectory(PathBuf),
}

/// Failures inside a constraint engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("constraint engine unavailable: {0}")]
    Unavailable(String),

    #[error("constraint evaluation failed: {0}")]
    Execution(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Errors that escape [`ValidationOrchestrator::validate`](crate::validator::ValidationOrchestrator::validate).
///
/// Everything else is reported inside the returned result.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_codes_keep_their_numbers() {
        assert_eq!(ReturnCode::Success.code(), 0);
        assert_eq!(ReturnCode::MissingDependency.code(), 99);
        assert_eq!(ReturnCode::TurtleSyntaxError.code(), 102);
        assert_eq!(ReturnCode::MissingTargetClass.code(), 201);
        assert_eq!(ReturnCode::ConformanceError.code(), 210);
        assert_eq!(ReturnCode::ShaclViolation.exit_status(), 211);
    }

    #[test]
    fn return_code_display_names_the_variant() {
        assert_eq!(ReturnCode::ConformanceError.to_string(), "ConformanceError(210)");
        assert_eq!(ReturnCode::JsonSyntaxError.category(), "syntax");
        assert!(ReturnCode::Success.is_success());
        assert!(ReturnCode::CoherenceError.is_error());
    }

    #[test]
    fn parse_errors_map_to_format_specific_codes() {
        let turtle = GraphError::Parse {
            path: "a.ttl".into(),
            format: DocumentFormat::Turtle,
            message: "unexpected token".into(),
        };
        let jsonld = GraphError::Parse {
            path: "a.json".into(),
            format: DocumentFormat::JsonLd,
            message: "bad context".into(),
        };
        assert_eq!(turtle.return_code(), ReturnCode::TurtleSyntaxError);
        assert_eq!(jsonld.return_code(), ReturnCode::JsonSyntaxError);
        assert!(turtle.is_parse_error());
        assert!(!GraphError::Storage("x".into()).is_parse_error());
    }
}
