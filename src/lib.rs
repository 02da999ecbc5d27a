pub mod coherence;
pub mod collect;
pub mod config;
pub mod discovery;
pub mod error;
pub mod graph;
pub mod inference;
pub mod iri;
pub mod logging;
pub mod registry;
pub mod shacl;
pub mod syntax;
pub mod validator;

pub use coherence::CoherenceChecker;
pub use config::{CliArgs, Command, InferenceMode, ValidatorConfig};
pub use discovery::{DiscoveredSchemas, SchemaCoverage, SchemaDiscovery};
pub use error::{EngineError, GraphError, ReturnCode, ValidationError};
pub use graph::{DocumentKind, GraphLoader, RdfGraph};
pub use inference::{InferenceEngine, InferenceStats};
pub use logging::{LoggingConfig, init_logging};
pub use registry::RegistryResolver;
pub use shacl::{ConstraintEngine, EngineOutcome, ShaclEngine};
pub use syntax::SyntaxChecker;
pub use validator::{ValidationOrchestrator, ValidationResult};

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Runs one subcommand against an already validated configuration.
///
/// Parse failures of the inputs are folded into the result with their syntax
/// return code. Only configuration problems surface as errors.
pub fn run(config: &ValidatorConfig, command: &Command) -> Result<ValidationResult> {
    let started = Instant::now();
    match command {
        Command::Validate { paths } => {
            let collected = collect::collect_rdf_files(&absolute_paths(paths)?);
            if collected.is_empty() {
                let message = "No instance files found to validate.";
                let mut result = ValidationResult::new(ReturnCode::GeneralError, message, Vec::new());
                result.errors.push(message.to_string());
                return Ok(result.finish(started));
            }

            let orchestrator = ValidationOrchestrator::new(config.clone());
            match orchestrator.validate(&collected.files) {
                Ok(result) => Ok(result),
                Err(ValidationError::Graph(e)) => {
                    let message = e.to_string();
                    tracing::error!(error = %message, "validation aborted");
                    let files = collected
                        .files
                        .iter()
                        .map(|file| graph::display_path(file, &config.root_directory))
                        .collect();
                    let mut result = ValidationResult::new(e.return_code(), message.clone(), files);
                    result.errors.push(message);
                    Ok(result.finish(started))
                }
                Err(e) => Err(e.into()),
            }
        }
        Command::Syntax { paths } => {
            let collected = collect::collect_rdf_files(&absolute_paths(paths)?);
            Ok(SyntaxChecker::new(&config.root_directory).check(&collected.files))
        }
        Command::Coherence { domains } => {
            let resolver = Arc::new(RegistryResolver::new(&config.root_directory));
            let checker = CoherenceChecker::new(resolver);
            Ok(if domains.is_empty() {
                checker.check_all()
            } else {
                checker.check_domains(domains)
            })
        }
        Command::Domains => {
            let resolver = RegistryResolver::new(&config.root_directory);
            let info = resolver.registry_info();
            let domains = resolver.list_domains();
            let mut lines = vec![format!(
                "{} domain(s), {} base schema(s), {} fixture(s)",
                info.domains_available, info.base_schemas, info.fixture_mappings
            )];
            for domain in &domains {
                let iri = resolver.get_canonical_iri(domain).unwrap_or("-");
                lines.push(format!("  {domain}\t{iri}"));
            }
            let mut result = ValidationResult::new(ReturnCode::Success, lines.join("\n"), Vec::new());
            result.domains = domains;
            result.warnings = info.warnings;
            Ok(result.finish(started))
        }
    }
}

/// Command line paths are relative to the working directory, not to the root.
fn absolute_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    paths
        .iter()
        .map(|path| Ok(std::path::absolute(path)?))
        .collect()
}
