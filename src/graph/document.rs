use super::RdfGraph;
use super::vocab::{owl, rdf, rdfs, sh};
use crate::error::GraphError;
use serde::{Deserialize, Serialize};

/// What a parsed document declares, decided from its triples rather than
/// from its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Declares an ontology or classes
    Ontology,
    /// Declares node shapes or shape targets
    Shapes,
    /// Declares both
    OntologyAndShapes,
    /// Neither, plain instance data
    Data,
}

impl DocumentKind {
    pub fn classify(graph: &RdfGraph) -> Result<Self, GraphError> {
        let ontology = declares_ontology(graph)?;
        let shapes = declares_shapes(graph)?;
        Ok(match (ontology, shapes) {
            (true, true) => DocumentKind::OntologyAndShapes,
            (true, false) => DocumentKind::Ontology,
            (false, true) => DocumentKind::Shapes,
            (false, false) => DocumentKind::Data,
        })
    }

    pub fn has_ontology(self) -> bool {
        matches!(self, DocumentKind::Ontology | DocumentKind::OntologyAndShapes)
    }

    pub fn has_shapes(self) -> bool {
        matches!(self, DocumentKind::Shapes | DocumentKind::OntologyAndShapes)
    }
}

fn declares_ontology(graph: &RdfGraph) -> Result<bool, GraphError> {
    for class in [owl::ONTOLOGY, owl::CLASS, rdfs::CLASS] {
        if !graph
            .triples_matching(None, Some(rdf::TYPE), Some(class.into()))?
            .is_empty()
        {
            return Ok(true);
        }
    }
    Ok(false)
}

fn declares_shapes(graph: &RdfGraph) -> Result<bool, GraphError> {
    if !graph
        .triples_matching(None, Some(rdf::TYPE), Some(sh::NODE_SHAPE.into()))?
        .is_empty()
    {
        return Ok(true);
    }
    Ok(!graph
        .triples_matching(None, Some(sh::TARGET_CLASS), None)?
        .is_empty())
}
