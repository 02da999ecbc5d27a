//! Reads node and property shapes out of a shapes graph.

use super::path::PropertyPath;
use super::report::Severity;
use crate::error::EngineError;
use crate::graph::RdfGraph;
use crate::graph::vocab::{owl, rdf, rdfs, sh, xsd};
use oxigraph::model::{
    Literal, NamedNode, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Term, TripleRef,
};
use regex::{Regex, RegexBuilder};
use std::collections::{BTreeSet, HashMap, VecDeque};
use tracing::warn;

/// `sh:` predicates a shape may carry. Anything else in the SHACL namespace
/// is reported as unsupported.
const RECOGNIZED: &[&str] = &[
    "targetClass",
    "targetNode",
    "targetSubjectsOf",
    "targetObjectsOf",
    "property",
    "path",
    "name",
    "description",
    "message",
    "severity",
    "deactivated",
    "order",
    "group",
    "defaultValue",
    "minCount",
    "maxCount",
    "datatype",
    "class",
    "nodeKind",
    "pattern",
    "flags",
    "minLength",
    "maxLength",
    "minInclusive",
    "maxInclusive",
    "minExclusive",
    "maxExclusive",
    "in",
    "hasValue",
    "uniqueLang",
    "languageIn",
    "equals",
    "disjoint",
    "node",
    "not",
    "and",
    "or",
    "xone",
    "closed",
    "ignoredProperties",
    "qualifiedValueShape",
    "qualifiedMinCount",
    "qualifiedMaxCount",
    "qualifiedValueShapesDisjoint",
];

// =============================================================================
// Node Kinds
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Iri,
    BlankNode,
    Literal,
    BlankNodeOrIri,
    BlankNodeOrLiteral,
    IriOrLiteral,
}

impl NodeKind {
    pub fn from_iri(iri: NamedNodeRef<'_>) -> Option<Self> {
        Some(match iri {
            i if i == sh::IRI => NodeKind::Iri,
            i if i == sh::BLANK_NODE => NodeKind::BlankNode,
            i if i == sh::LITERAL => NodeKind::Literal,
            i if i == sh::BLANK_NODE_OR_IRI => NodeKind::BlankNodeOrIri,
            i if i == sh::BLANK_NODE_OR_LITERAL => NodeKind::BlankNodeOrLiteral,
            i if i == sh::IRI_OR_LITERAL => NodeKind::IriOrLiteral,
            _ => return None,
        })
    }

    pub fn iri(&self) -> NamedNodeRef<'static> {
        match self {
            NodeKind::Iri => sh::IRI,
            NodeKind::BlankNode => sh::BLANK_NODE,
            NodeKind::Literal => sh::LITERAL,
            NodeKind::BlankNodeOrIri => sh::BLANK_NODE_OR_IRI,
            NodeKind::BlankNodeOrLiteral => sh::BLANK_NODE_OR_LITERAL,
            NodeKind::IriOrLiteral => sh::IRI_OR_LITERAL,
        }
    }

    pub fn matches(&self, term: &Term) -> bool {
        let (iri, blank, literal) = match term {
            Term::NamedNode(_) => (true, false, false),
            Term::BlankNode(_) => (false, true, false),
            Term::Literal(_) => (false, false, true),
            #[allow(unreachable_patterns)]
            _ => return false,
        };
        match self {
            NodeKind::Iri => iri,
            NodeKind::BlankNode => blank,
            NodeKind::Literal => literal,
            NodeKind::BlankNodeOrIri => blank || iri,
            NodeKind::BlankNodeOrLiteral => blank || literal,
            NodeKind::IriOrLiteral => iri || literal,
        }
    }
}

// =============================================================================
// Constraints
// =============================================================================

/// A compiled `sh:pattern` with the source text kept for messages.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub source: String,
    pub regex: Regex,
}

/// `sh:qualifiedValueShape` with its bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedShape {
    pub shape: NamedOrBlankNode,
    pub min_count: Option<usize>,
    pub max_count: Option<usize>,
}

/// Constraint parameters of one shape. Cardinality, `sh:uniqueLang`,
/// `sh:equals`, `sh:disjoint` and qualified shapes only apply to property
/// shapes.
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    pub min_count: Option<usize>,
    pub max_count: Option<usize>,
    pub unique_lang: bool,
    pub equals: Vec<NamedNode>,
    pub disjoint: Vec<NamedNode>,
    pub qualified: Option<QualifiedShape>,

    pub datatype: Option<NamedNode>,
    pub classes: Vec<NamedNode>,
    pub node_kind: Option<NodeKind>,
    pub pattern: Option<Pattern>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min_inclusive: Option<Literal>,
    pub max_inclusive: Option<Literal>,
    pub min_exclusive: Option<Literal>,
    pub max_exclusive: Option<Literal>,
    pub in_values: Option<Vec<Term>>,
    pub has_value: Vec<Term>,
    pub language_in: Option<Vec<String>>,

    pub node: Vec<NamedOrBlankNode>,
    pub not: Vec<NamedOrBlankNode>,
    pub and: Vec<Vec<NamedOrBlankNode>>,
    pub or: Vec<Vec<NamedOrBlankNode>>,
    pub xone: Vec<Vec<NamedOrBlankNode>>,

    /// Predicates a closed shape allows: its property paths plus
    /// `sh:ignoredProperties`
    pub closed: Option<BTreeSet<NamedNode>>,
}

impl Constraints {
    /// Shapes these constraints point at.
    fn references(&self) -> impl Iterator<Item = &NamedOrBlankNode> {
        self.node
            .iter()
            .chain(&self.not)
            .chain(self.and.iter().flatten())
            .chain(self.or.iter().flatten())
            .chain(self.xone.iter().flatten())
            .chain(self.qualified.iter().map(|qualified| &qualified.shape))
    }
}

// =============================================================================
// Shapes
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct Targets {
    pub classes: Vec<NamedNode>,
    pub nodes: Vec<Term>,
    pub subjects_of: Vec<NamedNode>,
    pub objects_of: Vec<NamedNode>,
}

impl Targets {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
            && self.nodes.is_empty()
            && self.subjects_of.is_empty()
            && self.objects_of.is_empty()
    }
}

/// A node shape, or a property shape when `path` is set.
#[derive(Debug, Clone)]
pub struct Shape {
    pub id: NamedOrBlankNode,
    pub name: Option<String>,
    pub path: Option<PropertyPath>,
    pub severity: Severity,
    pub message: Option<String>,
    pub deactivated: bool,
    pub targets: Targets,
    pub constraints: Constraints,
    /// `sh:property` shapes, applied to each value node
    pub properties: Vec<NamedOrBlankNode>,
}

impl Shape {
    fn new(id: NamedOrBlankNode) -> Self {
        Self {
            id,
            name: None,
            path: None,
            severity: Severity::Violation,
            message: None,
            deactivated: false,
            targets: Targets::default(),
            constraints: Constraints::default(),
            properties: Vec::new(),
        }
    }

    pub fn is_property_shape(&self) -> bool {
        self.path.is_some()
    }

    fn references(&self) -> impl Iterator<Item = &NamedOrBlankNode> {
        self.properties.iter().chain(self.constraints.references())
    }
}

// =============================================================================
// Shape Loading
// =============================================================================

/// Every shape of a shapes graph, reachable by id.
#[derive(Debug, Clone, Default)]
pub struct ShapeSet {
    shapes: Vec<Shape>,
    index: HashMap<NamedOrBlankNode, usize>,
    warnings: Vec<String>,
}

impl ShapeSet {
    /// Starts from subjects typed `sh:NodeShape` or `sh:PropertyShape` or
    /// carrying a target, then follows every shape they reference.
    pub fn load(graph: &RdfGraph) -> Result<Self, EngineError> {
        let mut reader = ShapeReader {
            graph,
            warnings: Vec::new(),
        };

        let mut roots = graph.instances_of(sh::NODE_SHAPE)?;
        roots.extend(graph.instances_of(sh::PROPERTY_SHAPE)?);
        for predicate in [
            sh::TARGET_CLASS,
            sh::TARGET_NODE,
            sh::TARGET_SUBJECTS_OF,
            sh::TARGET_OBJECTS_OF,
        ] {
            roots.extend(graph.subjects(Some(predicate), None)?);
        }
        roots.sort_by_key(|id| id.to_string());

        let mut set = Self::default();
        let mut queue: VecDeque<NamedOrBlankNode> = roots.into();
        while let Some(id) = queue.pop_front() {
            if set.index.contains_key(&id) {
                continue;
            }
            let shape = reader.shape(id.clone())?;
            queue.extend(shape.references().cloned());
            set.index.insert(id, set.shapes.len());
            set.shapes.push(shape);
        }
        set.warnings = reader.warnings;
        Ok(set)
    }

    pub fn get(&self, id: &NamedOrBlankNode) -> Option<&Shape> {
        self.index.get(id).map(|&position| &self.shapes[position])
    }

    /// Shapes that select focus nodes on their own.
    pub fn targeted(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter().filter(|shape| !shape.targets.is_empty())
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Shape features that were found but are not evaluated.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

struct ShapeReader<'a> {
    graph: &'a RdfGraph,
    warnings: Vec<String>,
}

impl ShapeReader<'_> {
    fn unsupported(&mut self, message: String) {
        warn!(%message, "shape feature not evaluated");
        self.warnings.push(message);
    }

    fn shape(&mut self, id: NamedOrBlankNode) -> Result<Shape, EngineError> {
        let mut shape = Shape::new(id.clone());
        let subject = id.as_ref();

        if !self.graph.has_subject(subject)? {
            self.unsupported(format!("shape {id} is referenced but never defined"));
            return Ok(shape);
        }
        self.check_predicates(subject)?;

        shape.path = match self.graph.object(subject, sh::PATH)? {
            Some(term) => Some(PropertyPath::parse(self.graph, &term)?),
            None => None,
        };
        shape.name = self.string_value(subject, sh::NAME)?;
        if let Some(severity) = self.named_node_value(subject, sh::SEVERITY)? {
            shape.severity = Severity::from_iri(severity.as_str());
        }
        shape.message = self.string_value(subject, sh::MESSAGE)?;
        shape.deactivated = self.boolean_value(subject, sh::DEACTIVATED)?;

        shape.targets = Targets {
            classes: self.named_node_values(subject, sh::TARGET_CLASS)?,
            nodes: self.graph.objects(subject, sh::TARGET_NODE)?,
            subjects_of: self.named_node_values(subject, sh::TARGET_SUBJECTS_OF)?,
            objects_of: self.named_node_values(subject, sh::TARGET_OBJECTS_OF)?,
        };
        if let NamedOrBlankNode::NamedNode(class) = &id {
            if self.is_class(class)? && !shape.targets.classes.contains(class) {
                shape.targets.classes.push(class.clone());
            }
        }

        for property in self.shape_refs(subject, sh::PROPERTY)? {
            if self.graph.object(property.as_ref(), sh::PATH)?.is_some() {
                shape.properties.push(property);
            } else {
                self.unsupported(format!("sh:property {property} of {id} has no sh:path"));
            }
        }

        shape.constraints = self.constraints(&id, &shape.properties)?;
        Ok(shape)
    }

    /// Implicit class target: the shape is itself a class.
    fn is_class(&self, node: &NamedNode) -> Result<bool, EngineError> {
        for class in [rdfs::CLASS, owl::CLASS] {
            if self
                .graph
                .contains(TripleRef::new(node.as_ref(), rdf::TYPE, class))?
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn check_predicates(&mut self, subject: NamedOrBlankNodeRef<'_>) -> Result<(), EngineError> {
        let mut unknown = BTreeSet::new();
        for triple in self.graph.triples_matching(Some(subject), None, None)? {
            if let Some(local) = triple.predicate.as_str().strip_prefix(sh::NAMESPACE) {
                if !RECOGNIZED.contains(&local) {
                    unknown.insert(local.to_string());
                }
            }
        }
        for local in unknown {
            self.unsupported(format!("sh:{local} on {subject} is not supported and was not checked"));
        }
        Ok(())
    }

    fn constraints(
        &mut self,
        id: &NamedOrBlankNode,
        properties: &[NamedOrBlankNode],
    ) -> Result<Constraints, EngineError> {
        let subject = id.as_ref();
        let mut constraints = Constraints {
            min_count: self.count_value(subject, sh::MIN_COUNT)?,
            max_count: self.count_value(subject, sh::MAX_COUNT)?,
            unique_lang: self.boolean_value(subject, sh::UNIQUE_LANG)?,
            equals: self.named_node_values(subject, sh::EQUALS)?,
            disjoint: self.named_node_values(subject, sh::DISJOINT)?,
            datatype: self.named_node_value(subject, sh::DATATYPE)?,
            classes: self.named_node_values(subject, sh::CLASS)?,
            min_length: self.count_value(subject, sh::MIN_LENGTH)?,
            max_length: self.count_value(subject, sh::MAX_LENGTH)?,
            min_inclusive: self.literal_value(subject, sh::MIN_INCLUSIVE)?,
            max_inclusive: self.literal_value(subject, sh::MAX_INCLUSIVE)?,
            min_exclusive: self.literal_value(subject, sh::MIN_EXCLUSIVE)?,
            max_exclusive: self.literal_value(subject, sh::MAX_EXCLUSIVE)?,
            has_value: self.graph.objects(subject, sh::HAS_VALUE)?,
            node: self.shape_refs(subject, sh::NODE)?,
            not: self.shape_refs(subject, sh::NOT)?,
            and: self.shape_lists(subject, sh::AND)?,
            or: self.shape_lists(subject, sh::OR)?,
            xone: self.shape_lists(subject, sh::XONE)?,
            ..Constraints::default()
        };

        constraints.node_kind = match self.named_node_value(subject, sh::NODE_KIND)? {
            Some(kind) => Some(NodeKind::from_iri(kind.as_ref()).ok_or_else(|| {
                EngineError::Execution(format!("unknown sh:nodeKind {kind} on {id}"))
            })?),
            None => None,
        };
        if let Some(source) = self.string_value(subject, sh::PATTERN)? {
            let flags = self.string_value(subject, sh::FLAGS)?.unwrap_or_default();
            let regex = compile_pattern(&source, &flags)?;
            constraints.pattern = Some(Pattern { source, regex });
        }
        if let Some(head) = self.graph.object(subject, sh::IN)? {
            constraints.in_values = Some(self.graph.list_items(head)?);
        }
        if let Some(head) = self.graph.object(subject, sh::LANGUAGE_IN)? {
            let ranges = self
                .graph
                .list_items(head)?
                .into_iter()
                .filter_map(|term| match term {
                    Term::Literal(literal) => Some(literal.value().to_string()),
                    _ => None,
                })
                .collect();
            constraints.language_in = Some(ranges);
        }

        let qualified = self.shape_refs(subject, sh::QUALIFIED_VALUE_SHAPE)?;
        if let Some(shape) = qualified.into_iter().next() {
            constraints.qualified = Some(QualifiedShape {
                shape,
                min_count: self.count_value(subject, sh::QUALIFIED_MIN_COUNT)?,
                max_count: self.count_value(subject, sh::QUALIFIED_MAX_COUNT)?,
            });
            if self.boolean_value(subject, sh::QUALIFIED_VALUE_SHAPES_DISJOINT)? {
                self.unsupported(format!(
                    "sh:qualifiedValueShapesDisjoint on {id} is not supported; sibling shapes were not excluded"
                ));
            }
        }

        if self.boolean_value(subject, sh::CLOSED)? {
            let mut allowed = BTreeSet::new();
            for property in properties {
                if let Some(Term::NamedNode(path)) = self.graph.object(property.as_ref(), sh::PATH)? {
                    allowed.insert(path);
                }
            }
            if let Some(head) = self.graph.object(subject, sh::IGNORED_PROPERTIES)? {
                for term in self.graph.list_items(head)? {
                    if let Term::NamedNode(predicate) = term {
                        allowed.insert(predicate);
                    }
                }
            }
            constraints.closed = Some(allowed);
        }

        Ok(constraints)
    }

    fn literal_value(
        &self,
        subject: NamedOrBlankNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
    ) -> Result<Option<Literal>, EngineError> {
        match self.graph.object(subject, predicate)? {
            Some(Term::Literal(literal)) => Ok(Some(literal)),
            _ => Ok(None),
        }
    }

    fn string_value(
        &self,
        subject: NamedOrBlankNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
    ) -> Result<Option<String>, EngineError> {
        Ok(self
            .literal_value(subject, predicate)?
            .map(|literal| literal.value().to_string()))
    }

    fn count_value(
        &self,
        subject: NamedOrBlankNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
    ) -> Result<Option<usize>, EngineError> {
        match self.string_value(subject, predicate)? {
            Some(text) => text.trim().parse::<usize>().map(Some).map_err(|_| {
                EngineError::Execution(format!(
                    "{predicate} on {subject} must be a non-negative integer, got '{text}'"
                ))
            }),
            None => Ok(None),
        }
    }

    fn boolean_value(
        &self,
        subject: NamedOrBlankNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
    ) -> Result<bool, EngineError> {
        Ok(match self.literal_value(subject, predicate)? {
            Some(literal) => {
                literal.datatype() == xsd::BOOLEAN && matches!(literal.value(), "true" | "1")
            }
            None => false,
        })
    }

    fn named_node_value(
        &self,
        subject: NamedOrBlankNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
    ) -> Result<Option<NamedNode>, EngineError> {
        Ok(self.named_node_values(subject, predicate)?.into_iter().next())
    }

    fn named_node_values(
        &self,
        subject: NamedOrBlankNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
    ) -> Result<Vec<NamedNode>, EngineError> {
        Ok(self
            .graph
            .objects(subject, predicate)?
            .into_iter()
            .filter_map(|object| match object {
                Term::NamedNode(node) => Some(node),
                _ => None,
            })
            .collect())
    }

    fn shape_refs(
        &self,
        subject: NamedOrBlankNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
    ) -> Result<Vec<NamedOrBlankNode>, EngineError> {
        Ok(self
            .graph
            .objects(subject, predicate)?
            .iter()
            .filter_map(as_shape_id)
            .collect())
    }

    /// One entry per `predicate` value, each an RDF list of shapes.
    fn shape_lists(
        &self,
        subject: NamedOrBlankNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
    ) -> Result<Vec<Vec<NamedOrBlankNode>>, EngineError> {
        let mut lists = Vec::new();
        for head in self.graph.objects(subject, predicate)? {
            let members = self.graph.list_items(head)?;
            lists.push(members.iter().filter_map(as_shape_id).collect());
        }
        Ok(lists)
    }
}

fn as_shape_id(term: &Term) -> Option<NamedOrBlankNode> {
    match term {
        Term::NamedNode(node) => Some(node.clone().into()),
        Term::BlankNode(node) => Some(node.clone().into()),
        _ => None,
    }
}

/// Compiles `sh:pattern` with the XPath-style `sh:flags` the regex crate can honour.
fn compile_pattern(pattern: &str, flags: &str) -> Result<Regex, EngineError> {
    let source = if flags.contains('q') {
        regex::escape(pattern)
    } else {
        pattern.to_string()
    };
    RegexBuilder::new(&source)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .ignore_whitespace(flags.contains('x'))
        .build()
        .map_err(|e| EngineError::Execution(format!("invalid sh:pattern '{pattern}': {e}")))
}
