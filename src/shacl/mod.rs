//! Structural constraint checking.
//!
//! The orchestrator talks to a [`ConstraintEngine`]. [`ShaclEngine`] is the
//! built-in implementation covering SHACL core targets, property paths,
//! value, logical and shape-based constraints. Core features it does not
//! evaluate are reported as warnings instead of being skipped silently. Other
//! engines can be plugged in through
//! [`ValidationOrchestrator::with_engine`](crate::validator::ValidationOrchestrator::with_engine).

mod checker;
mod path;
mod report;
mod shapes;

pub use checker::ConstraintChecker;
pub use path::PropertyPath;
pub use report::{ConstraintComponent, Severity, ShaclReport, ShaclResult};
pub use shapes::{Constraints, NodeKind, QualifiedShape, Shape, ShapeSet, Targets};

use crate::config::InferenceMode;
use crate::error::EngineError;
use crate::graph::RdfGraph;
use tracing::debug;

/// What an engine hands back for one run.
#[derive(Debug)]
pub struct EngineOutcome {
    pub conforms: bool,
    /// W3C validation report, when the engine builds one
    pub report_graph: Option<RdfGraph>,
    pub report_text: String,
    pub results: Vec<ShaclResult>,
    /// Shape features the engine skipped
    pub warnings: Vec<String>,
}

pub trait ConstraintEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the engine can run at all. An unavailable engine makes the
    /// orchestrator stop before loading anything.
    fn is_available(&self) -> bool {
        true
    }

    /// Checks `data` against `shapes`. `ontology` is supplied for engines
    /// that need class hierarchy information beyond what `data` holds.
    fn check(
        &self,
        data: &RdfGraph,
        shapes: &RdfGraph,
        ontology: Option<&RdfGraph>,
        mode: InferenceMode,
    ) -> Result<EngineOutcome, EngineError>;
}

/// Built-in SHACL core engine. Performs no inference of its own; class
/// targets and `sh:class` follow `rdfs:subClassOf` as SHACL requires.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShaclEngine;

impl ShaclEngine {
    pub fn new() -> Self {
        Self
    }

    /// Runs every active shape and collects the report.
    pub fn validate(
        &self,
        data: &RdfGraph,
        shapes: &ShapeSet,
        ontology: Option<&RdfGraph>,
    ) -> Result<ShaclReport, EngineError> {
        let checker = ConstraintChecker::new(data, ontology, shapes);
        let mut report = ShaclReport::new();

        for shape in shapes.targeted().filter(|shape| !shape.deactivated) {
            let focus_nodes = checker.focus_nodes(shape)?;
            debug!(shape = %shape.id, focus_nodes = focus_nodes.len(), "evaluating shape");
            for focus in &focus_nodes {
                report.extend(checker.validate_focus(focus, shape)?);
            }
        }
        Ok(report)
    }
}

impl ConstraintEngine for ShaclEngine {
    fn name(&self) -> &str {
        "builtin-shacl"
    }

    fn check(
        &self,
        data: &RdfGraph,
        shapes: &RdfGraph,
        ontology: Option<&RdfGraph>,
        mode: InferenceMode,
    ) -> Result<EngineOutcome, EngineError> {
        let shape_set = ShapeSet::load(shapes)?;
        debug!(shapes = shape_set.len(), %mode, "running built-in SHACL engine");

        let report = self.validate(data, &shape_set, ontology)?;
        let report_graph = report.to_graph()?;
        Ok(EngineOutcome {
            conforms: report.conforms(),
            report_graph: Some(report_graph),
            report_text: report.to_text(),
            results: report.into_results(),
            warnings: shape_set.warnings().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::vocab::sh;

    const SHAPES: &str = r#"
        @prefix sh: <http://www.w3.org/ns/shacl#> .
        @prefix ex: <http://example.org/> .
        ex:OrganizationShape a sh:NodeShape ;
            sh:targetClass ex:Organization ;
            sh:property [ sh:path ex:name ; sh:minCount 1 ] .
        ex:RetiredShape a sh:NodeShape ;
            sh:deactivated true ;
            sh:targetClass ex:Organization ;
            sh:property [ sh:path ex:founded ; sh:minCount 1 ] .
    "#;

    fn run(data: &str) -> anyhow::Result<EngineOutcome> {
        let data = RdfGraph::from_turtle(data)?;
        let shapes = RdfGraph::from_turtle(SHAPES)?;
        Ok(ShaclEngine::new().check(&data, &shapes, None, InferenceMode::Rdfs)?)
    }

    #[test]
    fn missing_property_fails_with_report() -> anyhow::Result<()> {
        let outcome = run("@prefix ex: <http://example.org/> . ex:acme a ex:Organization .")?;
        assert!(!outcome.conforms);
        assert_eq!(outcome.results.len(), 1);
        assert!(outcome.report_text.contains("http://example.org/acme"));
        assert!(outcome.report_text.contains("http://example.org/name"));

        let graph = outcome.report_graph.expect("report graph");
        assert_eq!(graph.instances_of(sh::VALIDATION_REPORT)?.len(), 1);
        Ok(())
    }

    #[test]
    fn deactivated_shapes_are_ignored() -> anyhow::Result<()> {
        let outcome = run(
            r#"@prefix ex: <http://example.org/> . ex:acme a ex:Organization ; ex:name "Acme" ."#,
        )?;
        assert!(outcome.conforms, "{}", outcome.report_text);
        Ok(())
    }

    #[test]
    fn skipped_features_are_returned_as_warnings() -> anyhow::Result<()> {
        let data = RdfGraph::from_turtle("<http://ex.org/a> <http://ex.org/start> 1 .")?;
        let shapes = RdfGraph::from_turtle(
            r#"@prefix sh: <http://www.w3.org/ns/shacl#> .
               <http://ex.org/S> sh:targetSubjectsOf <http://ex.org/start> ;
                   sh:property [ sh:path <http://ex.org/start> ; sh:lessThan <http://ex.org/end> ] ."#,
        )?;
        let outcome = ShaclEngine::new().check(&data, &shapes, None, InferenceMode::None)?;
        assert!(outcome.conforms);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("sh:lessThan"));
        Ok(())
    }

    #[test]
    fn empty_shapes_conform() -> anyhow::Result<()> {
        let data = RdfGraph::from_turtle("<http://ex.org/a> a <http://ex.org/B> .")?;
        let outcome = ShaclEngine::new().check(&data, &RdfGraph::new()?, None, InferenceMode::None)?;
        assert!(outcome.conforms);
        assert!(outcome.results.is_empty());
        Ok(())
    }
}
