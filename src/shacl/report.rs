use crate::error::GraphError;
use crate::graph::RdfGraph;
use crate::graph::vocab::{rdf, sh};
use oxigraph::model::{BlankNode, Literal, NamedNode, NamedOrBlankNode, Term, TripleRef};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::{self, Write as _};

// =============================================================================
// Severity Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Violation,
}

impl Severity {
    /// Unknown severities are treated as violations.
    pub fn from_iri(iri: &str) -> Self {
        match iri {
            "http://www.w3.org/ns/shacl#Info" => Severity::Info,
            "http://www.w3.org/ns/shacl#Warning" => Severity::Warning,
            _ => Severity::Violation,
        }
    }

    pub fn iri(&self) -> oxigraph::model::NamedNodeRef<'static> {
        match self {
            Severity::Info => sh::INFO,
            Severity::Warning => sh::WARNING,
            Severity::Violation => sh::VIOLATION,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sh:{:?}", self)
    }
}

// =============================================================================
// Constraint Components
// =============================================================================

/// The SHACL core constraint components the built-in engine evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConstraintComponent {
    MinCount,
    MaxCount,
    Datatype,
    Class,
    NodeKind,
    Pattern,
    MinLength,
    MaxLength,
    MinInclusive,
    MaxInclusive,
    MinExclusive,
    MaxExclusive,
    In,
    HasValue,
    UniqueLang,
    LanguageIn,
    Equals,
    Disjoint,
    Node,
    Not,
    And,
    Or,
    Xone,
    Closed,
    QualifiedMinCount,
    QualifiedMaxCount,
}

impl ConstraintComponent {
    /// Local name in the SHACL namespace, e.g. `MinCountConstraintComponent`.
    pub fn local_name(&self) -> String {
        format!("{:?}ConstraintComponent", self)
    }

    pub fn iri(&self) -> NamedNode {
        NamedNode::new_unchecked(format!("{}{}", sh::NAMESPACE, self.local_name()))
    }
}

// =============================================================================
// Validation Result
// =============================================================================

fn display<S: Serializer, T: fmt::Display>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

fn display_opt<S: Serializer, T: fmt::Display>(
    value: &Option<T>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => serializer.collect_str(value),
        None => serializer.serialize_none(),
    }
}

/// One constraint failure on one focus node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShaclResult {
    #[serde(serialize_with = "display")]
    focus_node: Term,
    #[serde(serialize_with = "display_opt")]
    result_path: Option<NamedNode>,
    #[serde(serialize_with = "display_opt")]
    value: Option<Term>,
    message: String,
    severity: Severity,
    #[serde(serialize_with = "display")]
    source_shape: NamedOrBlankNode,
    component: ConstraintComponent,
}

impl ShaclResult {
    pub fn new(
        focus_node: Term,
        component: ConstraintComponent,
        source_shape: NamedOrBlankNode,
        message: String,
    ) -> Self {
        Self {
            focus_node,
            result_path: None,
            value: None,
            message,
            severity: Severity::Violation,
            source_shape,
            component,
        }
    }

    pub fn with_path(mut self, path: NamedNode) -> Self {
        self.result_path = Some(path);
        self
    }

    pub fn with_value(mut self, value: Term) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn focus_node(&self) -> &Term {
        &self.focus_node
    }

    pub fn result_path(&self) -> Option<&NamedNode> {
        self.result_path.as_ref()
    }

    pub fn value(&self) -> Option<&Term> {
        self.value.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn source_shape(&self) -> &NamedOrBlankNode {
        &self.source_shape
    }

    pub fn component(&self) -> ConstraintComponent {
        self.component
    }
}

// =============================================================================
// Validation Report
// =============================================================================

/// Results of one engine run. Any result, whatever its severity, makes the
/// data non-conforming.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ShaclReport {
    results: Vec<ShaclResult>,
}

impl ShaclReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_result(&mut self, result: ShaclResult) {
        self.results.push(result);
    }

    pub fn extend(&mut self, results: impl IntoIterator<Item = ShaclResult>) {
        self.results.extend(results);
    }

    pub fn conforms(&self) -> bool {
        self.results.is_empty()
    }

    pub fn results(&self) -> &[ShaclResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<ShaclResult> {
        self.results
    }

    pub fn violations(&self) -> impl Iterator<Item = &ShaclResult> {
        self.results
            .iter()
            .filter(|r| r.severity == Severity::Violation)
    }

    pub fn violation_count(&self) -> usize {
        self.violations().count()
    }

    pub fn warning_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.severity == Severity::Warning)
            .count()
    }

    /// Human-readable report in the layout common SHACL tools print.
    pub fn to_text(&self) -> String {
        let mut text = String::from("Validation Report\n");
        let _ = writeln!(text, "Conforms: {}", if self.conforms() { "True" } else { "False" });
        if self.results.is_empty() {
            return text;
        }
        let _ = writeln!(text, "Results ({}):", self.results.len());
        for result in &self.results {
            let kind = match result.severity {
                Severity::Violation => "Constraint Violation",
                Severity::Warning => "Constraint Warning",
                Severity::Info => "Constraint Info",
            };
            let _ = writeln!(
                text,
                "{} in {} ({}):",
                kind,
                result.component.local_name(),
                result.component.iri()
            );
            let _ = writeln!(text, "\tSeverity: {}", result.severity);
            let _ = writeln!(text, "\tSource Shape: {}", result.source_shape);
            let _ = writeln!(text, "\tFocus Node: {}", result.focus_node);
            if let Some(value) = &result.value {
                let _ = writeln!(text, "\tValue Node: {}", value);
            }
            if let Some(path) = &result.result_path {
                let _ = writeln!(text, "\tResult Path: {}", path);
            }
            let _ = writeln!(text, "\tMessage: {}", result.message);
        }
        text
    }

    /// Builds the report as RDF using the `sh:ValidationReport` vocabulary.
    pub fn to_graph(&self) -> Result<RdfGraph, GraphError> {
        let graph = RdfGraph::new()?;
        let report = BlankNode::default();
        let conforms = Literal::from(self.conforms());

        graph.insert(TripleRef::new(
            report.as_ref(),
            rdf::TYPE,
            sh::VALIDATION_REPORT,
        ))?;
        graph.insert(TripleRef::new(report.as_ref(), sh::CONFORMS, conforms.as_ref()))?;

        for result in &self.results {
            let node = BlankNode::default();
            let component = result.component.iri();
            let message = Literal::new_simple_literal(&result.message);

            graph.insert_all([
                TripleRef::new(report.as_ref(), sh::RESULT, node.as_ref()),
                TripleRef::new(node.as_ref(), rdf::TYPE, sh::VALIDATION_RESULT),
                TripleRef::new(node.as_ref(), sh::FOCUS_NODE, result.focus_node.as_ref()),
                TripleRef::new(node.as_ref(), sh::RESULT_SEVERITY, result.severity.iri()),
                TripleRef::new(node.as_ref(), sh::SOURCE_SHAPE, result.source_shape.as_ref()),
                TripleRef::new(
                    node.as_ref(),
                    sh::SOURCE_CONSTRAINT_COMPONENT,
                    component.as_ref(),
                ),
                TripleRef::new(node.as_ref(), sh::RESULT_MESSAGE, message.as_ref()),
            ])?;
            if let Some(path) = &result.result_path {
                graph.insert(TripleRef::new(node.as_ref(), sh::RESULT_PATH, path.as_ref()))?;
            }
            if let Some(value) = &result.value {
                graph.insert(TripleRef::new(node.as_ref(), sh::VALUE, value.as_ref()))?;
            }
        }
        Ok(graph)
    }
}
