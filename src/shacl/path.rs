//! SHACL property paths.

use crate::error::EngineError;
use crate::graph::RdfGraph;
use crate::graph::vocab::{rdf, sh};
use oxigraph::model::{NamedNode, NamedOrBlankNodeRef, Term};
use std::fmt;

/// Nesting limit for path expressions read from a shapes graph.
const MAX_PATH_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyPath {
    Predicate(NamedNode),
    Inverse(Box<PropertyPath>),
    Sequence(Vec<PropertyPath>),
    Alternative(Vec<PropertyPath>),
    ZeroOrMore(Box<PropertyPath>),
    OneOrMore(Box<PropertyPath>),
    ZeroOrOne(Box<PropertyPath>),
}

impl PropertyPath {
    /// Reads the path expression rooted at `term`.
    pub fn parse(graph: &RdfGraph, term: &Term) -> Result<Self, EngineError> {
        Self::parse_at(graph, term, 0)
    }

    fn parse_at(graph: &RdfGraph, term: &Term, depth: usize) -> Result<Self, EngineError> {
        if depth > MAX_PATH_DEPTH {
            return Err(EngineError::Execution(format!(
                "property path at {term} nests deeper than {MAX_PATH_DEPTH} levels"
            )));
        }
        let node = match term {
            Term::NamedNode(node) => return Ok(PropertyPath::Predicate(node.clone())),
            Term::BlankNode(node) => NamedOrBlankNodeRef::from(node.as_ref()),
            _ => {
                return Err(EngineError::Execution(format!(
                    "literal {term} is not a property path"
                )));
            }
        };

        let nested = |inner: Term| Self::parse_at(graph, &inner, depth + 1).map(Box::new);
        if let Some(inner) = graph.object(node, sh::INVERSE_PATH)? {
            return Ok(PropertyPath::Inverse(nested(inner)?));
        }
        if let Some(inner) = graph.object(node, sh::ZERO_OR_MORE_PATH)? {
            return Ok(PropertyPath::ZeroOrMore(nested(inner)?));
        }
        if let Some(inner) = graph.object(node, sh::ONE_OR_MORE_PATH)? {
            return Ok(PropertyPath::OneOrMore(nested(inner)?));
        }
        if let Some(inner) = graph.object(node, sh::ZERO_OR_ONE_PATH)? {
            return Ok(PropertyPath::ZeroOrOne(nested(inner)?));
        }
        if let Some(head) = graph.object(node, sh::ALTERNATIVE_PATH)? {
            let members = Self::parse_list(graph, head, depth)?;
            return Ok(PropertyPath::Alternative(members));
        }
        if graph.object(node, rdf::FIRST)?.is_some() {
            let members = Self::parse_list(graph, term.clone(), depth)?;
            return Ok(PropertyPath::Sequence(members));
        }
        Err(EngineError::Execution(format!(
            "unsupported property path expression {term}"
        )))
    }

    fn parse_list(graph: &RdfGraph, head: Term, depth: usize) -> Result<Vec<Self>, EngineError> {
        let members = graph
            .list_items(head.clone())?
            .iter()
            .map(|member| Self::parse_at(graph, member, depth + 1))
            .collect::<Result<Vec<_>, _>>()?;
        if members.is_empty() {
            return Err(EngineError::Execution(format!("empty path list at {head}")));
        }
        Ok(members)
    }

    /// The predicate of a plain `sh:path <iri>`.
    pub fn as_predicate(&self) -> Option<&NamedNode> {
        match self {
            PropertyPath::Predicate(predicate) => Some(predicate),
            _ => None,
        }
    }

    /// The same path walked backwards. Inverses are pushed down to the
    /// predicates.
    pub fn inverse(&self) -> PropertyPath {
        match self {
            PropertyPath::Predicate(_) => PropertyPath::Inverse(Box::new(self.clone())),
            PropertyPath::Inverse(inner) => inner.as_ref().clone(),
            PropertyPath::Sequence(parts) => {
                PropertyPath::Sequence(parts.iter().rev().map(PropertyPath::inverse).collect())
            }
            PropertyPath::Alternative(parts) => {
                PropertyPath::Alternative(parts.iter().map(PropertyPath::inverse).collect())
            }
            PropertyPath::ZeroOrMore(inner) => PropertyPath::ZeroOrMore(Box::new(inner.inverse())),
            PropertyPath::OneOrMore(inner) => PropertyPath::OneOrMore(Box::new(inner.inverse())),
            PropertyPath::ZeroOrOne(inner) => PropertyPath::ZeroOrOne(Box::new(inner.inverse())),
        }
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, parts: &[PropertyPath], separator: &str| {
            write!(f, "(")?;
            for (index, part) in parts.iter().enumerate() {
                if index > 0 {
                    write!(f, "{separator}")?;
                }
                write!(f, "{part}")?;
            }
            write!(f, ")")
        };
        match self {
            PropertyPath::Predicate(predicate) => write!(f, "{predicate}"),
            PropertyPath::Inverse(inner) => write!(f, "^{inner}"),
            PropertyPath::Sequence(parts) => join(f, parts, "/"),
            PropertyPath::Alternative(parts) => join(f, parts, "|"),
            PropertyPath::ZeroOrMore(inner) => write!(f, "{inner}*"),
            PropertyPath::OneOrMore(inner) => write!(f, "{inner}+"),
            PropertyPath::ZeroOrOne(inner) => write!(f, "{inner}?"),
        }
    }
}
