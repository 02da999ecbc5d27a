//! RDF graph handling on top of oxigraph.
//!
//! [`RdfGraph`] wraps an in-memory [`Store`] and exposes the handful of
//! operations the pipeline needs. Every stage creates its own graph or
//! merges inputs into a fresh one, so a graph handed downstream is never
//! mutated again by the stage that produced it.

pub mod document;
pub mod loader;
pub mod vocab;

pub use document::DocumentKind;
pub use loader::{
    GraphLoader, LoadedGraph, display_path, extract_external_references, extract_observed_types,
};

use crate::error::GraphError;
use oxigraph::io::{RdfFormat, RdfParser, RdfSerializer};
use oxigraph::model::{
    GraphNameRef, NamedNode, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Term,
    TermRef, Triple, TripleRef,
};
use oxigraph::store::Store;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

// =============================================================================
// Document formats
// =============================================================================

/// Serialization of an instance or schema document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Turtle,
    JsonLd,
}

impl DocumentFormat {
    /// `.json` and `.jsonld` are JSON-LD; everything else is read as Turtle.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") | Some("jsonld") => DocumentFormat::JsonLd,
            _ => DocumentFormat::Turtle,
        }
    }

    pub fn rdf_format(self) -> Option<RdfFormat> {
        match self {
            DocumentFormat::Turtle => Some(RdfFormat::Turtle),
            DocumentFormat::JsonLd => RdfFormat::from_extension("jsonld"),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Turtle => write!(f, "Turtle"),
            DocumentFormat::JsonLd => write!(f, "JSON-LD"),
        }
    }
}

// =============================================================================
// RdfGraph
// =============================================================================

/// An unordered set of triples held in the default graph of an oxigraph store.
#[derive(Clone)]
pub struct RdfGraph {
    store: Store,
}

impl fmt::Debug for RdfGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RdfGraph")
            .field("triples", &self.len().ok())
            .finish()
    }
}

impl RdfGraph {
    pub fn new() -> Result<Self, GraphError> {
        Ok(Self {
            store: Store::new()?,
        })
    }

    /// Builds a fresh graph holding the union of `graphs`.
    pub fn union(graphs: &[&RdfGraph]) -> Result<Self, GraphError> {
        let combined = Self::new()?;
        for graph in graphs {
            combined.merge_from(graph)?;
        }
        Ok(combined)
    }

    /// Parses Turtle text into a new graph.
    pub fn from_turtle(turtle: &str) -> Result<Self, GraphError> {
        let graph = Self::new()?;
        graph.parse_bytes(turtle.as_bytes(), DocumentFormat::Turtle, None, "<inline>")?;
        Ok(graph)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn len(&self) -> Result<usize, GraphError> {
        Ok(self.store.len()?)
    }

    pub fn is_empty(&self) -> Result<bool, GraphError> {
        Ok(self.store.is_empty()?)
    }

    /// Parses `bytes` and adds the triples. Blank nodes get fresh identifiers
    /// so documents merged into one graph never share them by accident.
    pub fn parse_bytes(
        &self,
        bytes: &[u8],
        format: DocumentFormat,
        base_iri: Option<&str>,
        display: &str,
    ) -> Result<(), GraphError> {
        let rdf_format = format.rdf_format().ok_or_else(|| GraphError::Parse {
            path: display.to_string(),
            format,
            message: "no parser available for this format".to_string(),
        })?;

        let parser = match base_iri.map(|base| RdfParser::from_format(rdf_format).with_base_iri(base))
        {
            Some(Ok(parser)) => parser,
            _ => RdfParser::from_format(rdf_format),
        };

        self.store
            .load_from_reader(parser.rename_blank_nodes(), bytes)
            .map_err(|e| GraphError::Parse {
                path: display.to_string(),
                format,
                message: e.to_string(),
            })
    }

    /// Copies every triple of `other` into this graph and returns how many were new.
    pub fn merge_from(&self, other: &RdfGraph) -> Result<usize, GraphError> {
        let before = self.len()?;
        for quad in other.store.iter() {
            let quad = quad?;
            self.store.insert(quad.as_ref())?;
        }
        Ok(self.len()? - before)
    }

    pub fn insert(&self, triple: TripleRef<'_>) -> Result<bool, GraphError> {
        let quad = triple.in_graph(GraphNameRef::DefaultGraph);
        let is_new = !self.store.contains(quad)?;
        self.store.insert(quad)?;
        Ok(is_new)
    }

    pub fn contains(&self, triple: TripleRef<'_>) -> Result<bool, GraphError> {
        Ok(self
            .store
            .contains(triple.in_graph(GraphNameRef::DefaultGraph))?)
    }

    /// Convenience lookup for a triple made only of IRIs.
    pub fn contains_iris(
        &self,
        subject: &str,
        predicate: &str,
        object: &str,
    ) -> Result<bool, GraphError> {
        let subject = named_node(subject)?;
        let predicate = named_node(predicate)?;
        let object = named_node(object)?;
        self.contains(TripleRef::new(
            subject.as_ref(),
            predicate.as_ref(),
            object.as_ref(),
        ))
    }

    pub fn has_subject(&self, subject: NamedOrBlankNodeRef<'_>) -> Result<bool, GraphError> {
        match self
            .store
            .quads_for_pattern(Some(subject), None, None, Some(GraphNameRef::DefaultGraph))
            .next()
        {
            Some(quad) => quad.map(|_| true).map_err(GraphError::from),
            None => Ok(false),
        }
    }

    /// All triples matching the pattern, `None` acting as a wildcard.
    pub fn triples_matching(
        &self,
        subject: Option<NamedOrBlankNodeRef<'_>>,
        predicate: Option<NamedNodeRef<'_>>,
        object: Option<TermRef<'_>>,
    ) -> Result<Vec<Triple>, GraphError> {
        self.store
            .quads_for_pattern(subject, predicate, object, Some(GraphNameRef::DefaultGraph))
            .map(|quad| {
                let quad = quad?;
                Ok(Triple::new(quad.subject, quad.predicate, quad.object))
            })
            .collect()
    }

    pub fn objects(
        &self,
        subject: NamedOrBlankNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
    ) -> Result<Vec<Term>, GraphError> {
        Ok(self
            .triples_matching(Some(subject), Some(predicate), None)?
            .into_iter()
            .map(|triple| triple.object)
            .collect())
    }

    pub fn object(
        &self,
        subject: NamedOrBlankNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
    ) -> Result<Option<Term>, GraphError> {
        Ok(self.objects(subject, predicate)?.into_iter().next())
    }

    pub fn subjects(
        &self,
        predicate: Option<NamedNodeRef<'_>>,
        object: Option<TermRef<'_>>,
    ) -> Result<Vec<NamedOrBlankNode>, GraphError> {
        let mut seen = BTreeSet::new();
        let mut subjects = Vec::new();
        for triple in self.triples_matching(None, predicate, object)? {
            if seen.insert(triple.subject.to_string()) {
                subjects.push(triple.subject);
            }
        }
        Ok(subjects)
    }

    pub fn instances_of(&self, class: NamedNodeRef<'_>) -> Result<Vec<NamedOrBlankNode>, GraphError> {
        self.subjects(Some(vocab::rdf::TYPE), Some(class.into()))
    }

    /// Items of the `rdf:first`/`rdf:rest` list starting at `head`. Stops at
    /// `rdf:nil`, at a malformed cell or when a cell repeats.
    pub fn list_items(&self, head: Term) -> Result<Vec<Term>, GraphError> {
        let mut items = Vec::new();
        let mut visited = BTreeSet::new();
        let mut current = head;

        loop {
            let cell = match &current {
                Term::BlankNode(node) => NamedOrBlankNode::from(node.clone()),
                Term::NamedNode(node) if node.as_ref() != vocab::rdf::NIL => {
                    NamedOrBlankNode::from(node.clone())
                }
                _ => break,
            };
            if !visited.insert(cell.to_string()) {
                break;
            }
            if let Some(first) = self.object(cell.as_ref(), vocab::rdf::FIRST)? {
                items.push(first);
            }
            match self.object(cell.as_ref(), vocab::rdf::REST)? {
                Some(rest) => current = rest,
                None => break,
            }
        }
        Ok(items)
    }

    /// Runs a SPARQL UPDATE against the graph.
    pub fn update(&self, sparql: &str) -> Result<(), GraphError> {
        self.store
            .update(sparql)
            .map_err(|e| GraphError::Update(e.to_string()))
    }

    /// Serializes the graph as Turtle.
    pub fn to_turtle(&self) -> Result<String, GraphError> {
        let buffer = self
            .store
            .dump_graph_to_writer(
                GraphNameRef::DefaultGraph,
                RdfSerializer::from_format(RdfFormat::Turtle),
                Vec::new(),
            )
            .map_err(|e| GraphError::Storage(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| GraphError::Storage(e.to_string()))
    }

    /// Inserts the triples without returning per-triple status. Used by
    /// report builders that own the graph outright.
    pub(crate) fn insert_all<'a>(
        &self,
        triples: impl IntoIterator<Item = TripleRef<'a>>,
    ) -> Result<(), GraphError> {
        for triple in triples {
            self.insert(triple)?;
        }
        Ok(())
    }
}

pub(crate) fn named_node(iri: &str) -> Result<NamedNode, GraphError> {
    NamedNode::new(iri).map_err(|e| GraphError::InvalidIri {
        iri: iri.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        @prefix ex: <http://example.org/> .
        ex:acme a ex:Organization ; ex:name "Acme" .
        ex:bob a ex:Person .
    "#;

    #[test]
    fn format_from_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("a/b.json")), DocumentFormat::JsonLd);
        assert_eq!(DocumentFormat::from_path(Path::new("a/b.JSONLD")), DocumentFormat::JsonLd);
        assert_eq!(DocumentFormat::from_path(Path::new("a/b.ttl")), DocumentFormat::Turtle);
        assert_eq!(DocumentFormat::from_path(Path::new("a/b.nt")), DocumentFormat::Turtle);
    }

    #[test]
    fn parse_and_query() -> anyhow::Result<()> {
        let graph = RdfGraph::from_turtle(SAMPLE)?;
        assert_eq!(graph.len()?, 3);
        assert!(graph.contains_iris(
            "http://example.org/acme",
            vocab::rdf::TYPE.as_str(),
            "http://example.org/Organization"
        )?);
        let org = NamedNode::new("http://example.org/Organization")?;
        assert_eq!(graph.instances_of(org.as_ref())?.len(), 1);
        Ok(())
    }

    #[test]
    fn union_is_a_fresh_graph() -> anyhow::Result<()> {
        let a = RdfGraph::from_turtle(SAMPLE)?;
        let b = RdfGraph::from_turtle(
            "@prefix ex: <http://example.org/> . ex:carol a ex:Person . ex:bob a ex:Person .",
        )?;
        let combined = RdfGraph::union(&[&a, &b])?;
        assert_eq!(combined.len()?, 4);
        assert_eq!(a.len()?, 3);
        assert_eq!(b.len()?, 2);
        Ok(())
    }

    #[test]
    fn merge_reports_new_triples_only() -> anyhow::Result<()> {
        let a = RdfGraph::from_turtle(SAMPLE)?;
        let b = RdfGraph::from_turtle(SAMPLE)?;
        assert_eq!(a.merge_from(&b)?, 0);
        Ok(())
    }

    #[test]
    fn turtle_parse_error_is_reported() {
        let err = RdfGraph::from_turtle("@prefix ex: <http://example.org/> . ex:a ex:b").unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn list_items_follow_rest_links() -> anyhow::Result<()> {
        let graph = RdfGraph::from_turtle(
            r#"@prefix ex: <http://example.org/> . ex:s ex:values ( "a" ex:b "c" ) ."#,
        )?;
        let s = NamedNode::new("http://example.org/s")?;
        let values = NamedNode::new("http://example.org/values")?;
        let head = graph.object(s.as_ref().into(), values.as_ref())?;
        let items = graph.list_items(head.expect("list head"))?;
        assert_eq!(items.len(), 3);
        assert_eq!(items[1], Term::from(NamedNode::new("http://example.org/b")?));
        assert!(graph.list_items(vocab::rdf::NIL.into_owned().into())?.is_empty());
        Ok(())
    }

    #[test]
    fn failed_update_is_a_graph_error() -> anyhow::Result<()> {
        let graph = RdfGraph::from_turtle(SAMPLE)?;
        let err = graph.update("INSERT { ?x a } WHERE").unwrap_err();
        assert!(matches!(err, GraphError::Update(_)));
        assert_eq!(graph.len()?, 3);
        Ok(())
    }

    #[test]
    fn serializes_to_turtle() -> anyhow::Result<()> {
        let graph = RdfGraph::from_turtle(SAMPLE)?;
        let text = graph.to_turtle()?;
        let reparsed = RdfGraph::from_turtle(&text)?;
        assert_eq!(reparsed.len()?, 3);
        Ok(())
    }
}
