//! Focus node selection and constraint evaluation.

use super::path::PropertyPath;
use super::report::{ConstraintComponent, ShaclResult};
use super::shapes::{Constraints, Shape, ShapeSet};
use crate::error::{EngineError, GraphError};
use crate::graph::RdfGraph;
use crate::graph::vocab::{rdf, rdfs};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use oxigraph::model::{Literal, NamedNode, NamedNodeRef, NamedOrBlankNode, Term};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

/// Nesting limit for shape references. Recursive shapes over cyclic data
/// stop here with an error.
const MAX_DEPTH: usize = 32;

const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

pub struct ConstraintChecker<'a> {
    data: &'a RdfGraph,
    ontology: Option<&'a RdfGraph>,
    shapes: &'a ShapeSet,
}

impl<'a> ConstraintChecker<'a> {
    /// `ontology` is consulted next to `data` for `rdfs:subClassOf` links.
    pub fn new(data: &'a RdfGraph, ontology: Option<&'a RdfGraph>, shapes: &'a ShapeSet) -> Self {
        Self {
            data,
            ontology,
            shapes,
        }
    }

    // =========================================================================
    // Targets
    // =========================================================================

    /// Focus nodes selected by the shape's targets, without duplicates.
    pub fn focus_nodes(&self, shape: &Shape) -> Result<Vec<Term>, GraphError> {
        let targets = &shape.targets;
        let mut nodes = targets.nodes.clone();

        for class in &targets.classes {
            for subclass in self.subclasses_of(class)? {
                nodes.extend(self.data.instances_of(subclass.as_ref())?.into_iter().map(Term::from));
            }
        }
        for predicate in &targets.subjects_of {
            nodes.extend(
                self.data
                    .subjects(Some(predicate.as_ref()), None)?
                    .into_iter()
                    .map(Term::from),
            );
        }
        for predicate in &targets.objects_of {
            for triple in self.data.triples_matching(None, Some(predicate.as_ref()), None)? {
                nodes.push(triple.object);
            }
        }
        Ok(distinct(nodes))
    }

    /// `class` and every class below it through `rdfs:subClassOf`.
    fn subclasses_of(&self, class: &NamedNode) -> Result<Vec<NamedNode>, GraphError> {
        self.walk_hierarchy(class, |graph, current| {
            graph.subjects(Some(rdfs::SUB_CLASS_OF), Some(current.into()))
        })
    }

    /// `class` and every class above it through `rdfs:subClassOf`.
    fn superclasses_of(&self, class: &NamedNode) -> Result<Vec<NamedNode>, GraphError> {
        self.walk_hierarchy(class, |graph, current| {
            Ok(graph
                .objects(current.into(), rdfs::SUB_CLASS_OF)?
                .into_iter()
                .filter_map(|term| match term {
                    Term::NamedNode(node) => Some(NamedOrBlankNode::from(node)),
                    _ => None,
                })
                .collect())
        })
    }

    fn walk_hierarchy(
        &self,
        start: &NamedNode,
        step: impl Fn(&RdfGraph, NamedNodeRef<'_>) -> Result<Vec<NamedOrBlankNode>, GraphError>,
    ) -> Result<Vec<NamedNode>, GraphError> {
        let mut visited = BTreeSet::from([start.clone()]);
        let mut queue = vec![start.clone()];
        while let Some(current) = queue.pop() {
            for graph in std::iter::once(self.data).chain(self.ontology) {
                for next in step(graph, current.as_ref())? {
                    if let NamedOrBlankNode::NamedNode(next) = next {
                        if visited.insert(next.clone()) {
                            queue.push(next);
                        }
                    }
                }
            }
        }
        Ok(visited.into_iter().collect())
    }

    /// SHACL instance check: some `rdf:type` of `value` is `class` or a subclass of it.
    fn is_instance_of(&self, value: &Term, class: &NamedNode) -> Result<bool, GraphError> {
        let Some(node) = as_resource(value) else {
            return Ok(false);
        };
        for term in self.data.objects(node.as_ref(), rdf::TYPE)? {
            if let Term::NamedNode(direct) = term {
                if self.superclasses_of(&direct)?.contains(class) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    // =========================================================================
    // Property paths
    // =========================================================================

    fn objects_of(&self, node: &Term, predicate: &NamedNode) -> Result<Vec<Term>, GraphError> {
        match as_resource(node) {
            Some(subject) => self.data.objects(subject.as_ref(), predicate.as_ref()),
            None => Ok(Vec::new()),
        }
    }

    /// Value nodes reached from `focus` through `path`.
    pub fn path_values(&self, focus: &Term, path: &PropertyPath) -> Result<Vec<Term>, GraphError> {
        self.walk(std::slice::from_ref(focus), path)
    }

    fn walk(&self, start: &[Term], path: &PropertyPath) -> Result<Vec<Term>, GraphError> {
        let mut reached = Vec::new();
        match path {
            PropertyPath::Predicate(predicate) => {
                for node in start {
                    reached.extend(self.objects_of(node, predicate)?);
                }
            }
            PropertyPath::Inverse(inner) => match inner.as_ref() {
                PropertyPath::Predicate(predicate) => {
                    for node in start {
                        let subjects = self.data.subjects(Some(predicate.as_ref()), Some(node.as_ref()))?;
                        reached.extend(subjects.into_iter().map(Term::from));
                    }
                }
                other => reached = self.walk(start, &other.inverse())?,
            },
            PropertyPath::Sequence(parts) => {
                let mut current = start.to_vec();
                for part in parts {
                    current = self.walk(&current, part)?;
                }
                reached = current;
            }
            PropertyPath::Alternative(parts) => {
                for part in parts {
                    reached.extend(self.walk(start, part)?);
                }
            }
            PropertyPath::ZeroOrMore(inner) => reached = self.closure(start, inner, true)?,
            PropertyPath::OneOrMore(inner) => reached = self.closure(start, inner, false)?,
            PropertyPath::ZeroOrOne(inner) => {
                reached.extend(start.iter().cloned());
                reached.extend(self.walk(start, inner)?);
            }
        }
        Ok(distinct(reached))
    }

    fn closure(
        &self,
        start: &[Term],
        inner: &PropertyPath,
        include_start: bool,
    ) -> Result<Vec<Term>, GraphError> {
        let mut seen = HashSet::new();
        let mut reached = Vec::new();
        if include_start {
            for node in start {
                if seen.insert(node.clone()) {
                    reached.push(node.clone());
                }
            }
        }
        let mut frontier = start.to_vec();
        while !frontier.is_empty() {
            frontier = self
                .walk(&frontier, inner)?
                .into_iter()
                .filter(|node| seen.insert(node.clone()))
                .collect();
            reached.extend(frontier.iter().cloned());
        }
        Ok(reached)
    }

    // =========================================================================
    // Shape evaluation
    // =========================================================================

    /// Evaluates `shape` and everything it references on one focus node.
    pub fn validate_focus(&self, focus: &Term, shape: &Shape) -> Result<Vec<ShaclResult>, EngineError> {
        self.evaluate(focus, shape, 0)
    }

    fn shape(&self, id: &NamedOrBlankNode) -> Result<&'a Shape, EngineError> {
        self.shapes
            .get(id)
            .ok_or_else(|| EngineError::Execution(format!("shape {id} is not loaded")))
    }

    fn evaluate(&self, focus: &Term, shape: &Shape, depth: usize) -> Result<Vec<ShaclResult>, EngineError> {
        if shape.deactivated {
            return Ok(Vec::new());
        }
        if depth > MAX_DEPTH {
            return Err(EngineError::Execution(format!(
                "shape {} nests deeper than {MAX_DEPTH} levels at {focus}",
                shape.id
            )));
        }

        let values = match &shape.path {
            Some(path) => self.path_values(focus, path)?,
            None => vec![focus.clone()],
        };
        let mut results = self.check_constraints(focus, shape, &values, depth)?;

        for id in &shape.properties {
            let property = self.shape(id)?;
            for value in &values {
                results.extend(self.evaluate(value, property, depth + 1)?);
            }
        }
        Ok(results)
    }

    /// True when `value` produces no results against the shape `id`.
    fn conforms(&self, value: &Term, id: &NamedOrBlankNode, depth: usize) -> Result<bool, EngineError> {
        let shape = self.shape(id)?;
        Ok(self.evaluate(value, shape, depth + 1)?.is_empty())
    }

    fn result(
        &self,
        focus: &Term,
        shape: &Shape,
        component: ConstraintComponent,
        default_message: String,
    ) -> ShaclResult {
        let result = ShaclResult::new(
            focus.clone(),
            component,
            shape.id.clone(),
            shape.message.clone().unwrap_or(default_message),
        )
        .with_severity(shape.severity);
        match shape.path.as_ref().and_then(PropertyPath::as_predicate) {
            Some(predicate) => result.with_path(predicate.clone()),
            None => result,
        }
    }

    fn check_constraints(
        &self,
        focus: &Term,
        shape: &Shape,
        values: &[Term],
        depth: usize,
    ) -> Result<Vec<ShaclResult>, EngineError> {
        let constraints = &shape.constraints;
        let mut results = Vec::new();
        let result = |component, message| self.result(focus, shape, component, message);

        if let Some(path) = &shape.path {
            if let Some(min) = constraints.min_count {
                if values.len() < min {
                    results.push(result(
                        ConstraintComponent::MinCount,
                        format!("Less than {min} values on {focus}->{path}"),
                    ));
                }
            }
            if let Some(max) = constraints.max_count {
                if values.len() > max {
                    results.push(result(
                        ConstraintComponent::MaxCount,
                        format!("More than {max} values on {focus}->{path}"),
                    ));
                }
            }

            if constraints.unique_lang {
                let mut seen = BTreeSet::new();
                let mut reported = BTreeSet::new();
                for value in values {
                    if let Term::Literal(literal) = value {
                        if let Some(lang) = literal.language() {
                            if !seen.insert(lang.to_string()) && reported.insert(lang.to_string()) {
                                results.push(result(
                                    ConstraintComponent::UniqueLang,
                                    format!("More than one String shares language \"{lang}\""),
                                ));
                            }
                        }
                    }
                }
            }

            if let Some(qualified) = &constraints.qualified {
                let mut matching = 0;
                for value in values {
                    if self.conforms(value, &qualified.shape, depth)? {
                        matching += 1;
                    }
                }
                if let Some(min) = qualified.min_count {
                    if matching < min {
                        results.push(result(
                            ConstraintComponent::QualifiedMinCount,
                            format!(
                                "Less than {min} values on {focus}->{path} conform to {}",
                                qualified.shape
                            ),
                        ));
                    }
                }
                if let Some(max) = qualified.max_count {
                    if matching > max {
                        results.push(result(
                            ConstraintComponent::QualifiedMaxCount,
                            format!(
                                "More than {max} values on {focus}->{path} conform to {}",
                                qualified.shape
                            ),
                        ));
                    }
                }
            }
        }

        for value in values {
            for (component, message) in self.check_value(value, constraints, depth)? {
                results.push(result(component, message).with_value(value.clone()));
            }
        }

        for expected in &constraints.has_value {
            if !values.contains(expected) {
                results.push(result(
                    ConstraintComponent::HasValue,
                    format!("Missing expected value {expected}"),
                ));
            }
        }

        for predicate in &constraints.equals {
            let others = self.objects_of(focus, predicate)?;
            for value in values.iter().filter(|value| !others.contains(value)) {
                results.push(
                    result(
                        ConstraintComponent::Equals,
                        format!("Value {value} is missing from {predicate}"),
                    )
                    .with_value(value.clone()),
                );
            }
            for other in others.iter().filter(|other| !values.contains(other)) {
                results.push(
                    result(
                        ConstraintComponent::Equals,
                        format!("Value {other} of {predicate} is missing from the path values"),
                    )
                    .with_value(other.clone()),
                );
            }
        }
        for predicate in &constraints.disjoint {
            let others = self.objects_of(focus, predicate)?;
            for value in values.iter().filter(|value| others.contains(value)) {
                results.push(
                    result(
                        ConstraintComponent::Disjoint,
                        format!("Value {value} is shared with {predicate}"),
                    )
                    .with_value(value.clone()),
                );
            }
        }

        if let Some(allowed) = &constraints.closed {
            for value in values {
                let Some(node) = as_resource(value) else {
                    continue;
                };
                for triple in self.data.triples_matching(Some(node.as_ref()), None, None)? {
                    if allowed.contains(&triple.predicate) {
                        continue;
                    }
                    let message = shape.message.clone().unwrap_or_else(|| {
                        format!("Predicate {} is not allowed on closed shape", triple.predicate)
                    });
                    results.push(
                        ShaclResult::new(value.clone(), ConstraintComponent::Closed, shape.id.clone(), message)
                            .with_severity(shape.severity)
                            .with_path(triple.predicate.clone())
                            .with_value(triple.object.clone()),
                    );
                }
            }
        }

        Ok(results)
    }

    /// Value-level constraints. Returns the failing components with their default messages.
    fn check_value(
        &self,
        value: &Term,
        constraints: &Constraints,
        depth: usize,
    ) -> Result<Vec<(ConstraintComponent, String)>, EngineError> {
        let mut failures = Vec::new();

        if let Some(datatype) = &constraints.datatype {
            let matches = matches!(value, Term::Literal(literal) if literal.datatype() == datatype.as_ref());
            if !matches {
                failures.push((
                    ConstraintComponent::Datatype,
                    format!("Value {value} does not have datatype {datatype}"),
                ));
            }
        }

        for class in &constraints.classes {
            if !self.is_instance_of(value, class)? {
                failures.push((
                    ConstraintComponent::Class,
                    format!("Value {value} does not have class {class}"),
                ));
            }
        }

        if let Some(kind) = constraints.node_kind {
            if !kind.matches(value) {
                failures.push((
                    ConstraintComponent::NodeKind,
                    format!("Value {value} is not of Node Kind {}", kind.iri()),
                ));
            }
        }

        let text = lexical_form(value);

        if let Some(pattern) = &constraints.pattern {
            if !text.is_some_and(|text| pattern.regex.is_match(text)) {
                failures.push((
                    ConstraintComponent::Pattern,
                    format!("Value {value} does not match pattern \"{}\"", pattern.source),
                ));
            }
        }

        let length = text.map(|text| text.chars().count());
        if let Some(min) = constraints.min_length {
            if !length.is_some_and(|length| length >= min) {
                failures.push((
                    ConstraintComponent::MinLength,
                    format!("String length of {value} is less than {min}"),
                ));
            }
        }
        if let Some(max) = constraints.max_length {
            if !length.is_some_and(|length| length <= max) {
                failures.push((
                    ConstraintComponent::MaxLength,
                    format!("String length of {value} is greater than {max}"),
                ));
            }
        }

        let bounds: [(&Option<Literal>, ConstraintComponent, &str, fn(Ordering) -> bool); 4] = [
            (&constraints.min_inclusive, ConstraintComponent::MinInclusive, ">=", Ordering::is_ge),
            (&constraints.max_inclusive, ConstraintComponent::MaxInclusive, "<=", Ordering::is_le),
            (&constraints.min_exclusive, ConstraintComponent::MinExclusive, ">", Ordering::is_gt),
            (&constraints.max_exclusive, ConstraintComponent::MaxExclusive, "<", Ordering::is_lt),
        ];
        for (bound, component, symbol, accept) in bounds {
            if let Some(bound) = bound {
                if !compare(value, bound).is_some_and(accept) {
                    failures.push((component, format!("Value {value} is not {symbol} {}", bound.value())));
                }
            }
        }

        if let Some(allowed) = &constraints.in_values {
            if !allowed.contains(value) {
                let list: Vec<String> = allowed.iter().map(|v| v.to_string()).collect();
                failures.push((
                    ConstraintComponent::In,
                    format!("Value {value} not in list [{}]", list.join(", ")),
                ));
            }
        }

        if let Some(ranges) = &constraints.language_in {
            let tag = match value {
                Term::Literal(literal) => literal.language(),
                _ => None,
            };
            if !tag.is_some_and(|tag| ranges.iter().any(|range| language_matches(tag, range))) {
                failures.push((
                    ConstraintComponent::LanguageIn,
                    format!("Language of {value} is not in [{}]", ranges.join(", ")),
                ));
            }
        }

        for id in &constraints.node {
            if !self.conforms(value, id, depth)? {
                failures.push((
                    ConstraintComponent::Node,
                    format!("Value {value} does not conform to shape {id}"),
                ));
            }
        }
        for id in &constraints.not {
            if self.conforms(value, id, depth)? {
                failures.push((
                    ConstraintComponent::Not,
                    format!("Value {value} conforms to shape {id}"),
                ));
            }
        }
        for members in &constraints.and {
            let mut all = true;
            for id in members {
                if !self.conforms(value, id, depth)? {
                    all = false;
                    break;
                }
            }
            if !all {
                failures.push((
                    ConstraintComponent::And,
                    format!("Value {value} does not conform to all of {} shapes", members.len()),
                ));
            }
        }
        for members in &constraints.or {
            let mut any = false;
            for id in members {
                if self.conforms(value, id, depth)? {
                    any = true;
                    break;
                }
            }
            if !any {
                failures.push((
                    ConstraintComponent::Or,
                    format!("Value {value} conforms to none of {} shapes", members.len()),
                ));
            }
        }
        for members in &constraints.xone {
            let mut matching = 0;
            for id in members {
                if self.conforms(value, id, depth)? {
                    matching += 1;
                }
            }
            if matching != 1 {
                failures.push((
                    ConstraintComponent::Xone,
                    format!("Value {value} conforms to {matching} shapes instead of exactly one"),
                ));
            }
        }

        Ok(failures)
    }
}

fn as_resource(term: &Term) -> Option<NamedOrBlankNode> {
    match term {
        Term::NamedNode(node) => Some(node.clone().into()),
        Term::BlankNode(node) => Some(node.clone().into()),
        _ => None,
    }
}

fn distinct(terms: Vec<Term>) -> Vec<Term> {
    let mut seen = HashSet::new();
    terms.into_iter().filter(|term| seen.insert(term.clone())).collect()
}

/// String form used by pattern and length checks. Blank nodes have none.
fn lexical_form(term: &Term) -> Option<&str> {
    match term {
        Term::NamedNode(node) => Some(node.as_str()),
        Term::Literal(literal) => Some(literal.value()),
        _ => None,
    }
}

/// Basic language range matching. `*` matches any tag.
fn language_matches(tag: &str, range: &str) -> bool {
    if range == "*" {
        return true;
    }
    let tag = tag.to_ascii_lowercase();
    let range = range.to_ascii_lowercase();
    tag == range || tag.strip_prefix(&range).is_some_and(|rest| rest.starts_with('-'))
}

enum Comparable {
    Number(f64),
    DateTime(DateTime<FixedOffset>),
    Date(NaiveDate),
    Text(String),
}

fn comparable(literal: &Literal) -> Option<Comparable> {
    let local = literal.datatype().as_str().strip_prefix(XSD)?;
    let text = literal.value().trim();
    match local {
        "integer" | "decimal" | "double" | "float" | "int" | "long" | "short" | "byte"
        | "nonNegativeInteger" | "positiveInteger" | "nonPositiveInteger" | "negativeInteger"
        | "unsignedInt" | "unsignedLong" | "unsignedShort" | "unsignedByte" => {
            text.parse::<f64>().ok().map(Comparable::Number)
        }
        "dateTime" | "dateTimeStamp" => DateTime::parse_from_rfc3339(text)
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc().fixed_offset())
            })
            .map(Comparable::DateTime),
        "date" => NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().map(Comparable::Date),
        "string" => Some(Comparable::Text(literal.value().to_string())),
        _ => None,
    }
}

/// Orders `value` against a range bound. `None` when the two cannot be
/// compared, which fails the constraint.
fn compare(value: &Term, bound: &Literal) -> Option<Ordering> {
    let Term::Literal(value) = value else {
        return None;
    };
    match (comparable(value)?, comparable(bound)?) {
        (Comparable::Number(value), Comparable::Number(bound)) => value.partial_cmp(&bound),
        (Comparable::DateTime(value), Comparable::DateTime(bound)) => Some(value.cmp(&bound)),
        (Comparable::Date(value), Comparable::Date(bound)) => Some(value.cmp(&bound)),
        (Comparable::Text(value), Comparable::Text(bound)) => Some(value.cmp(&bound)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::vocab::xsd;

    const PREFIXES: &str = r#"
        @prefix sh: <http://www.w3.org/ns/shacl#> .
        @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
        @prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
        @prefix ex: <http://example.org/> .
    "#;

    const AGENT_SHAPES: &str = r#"
        ex:AgentShape a sh:NodeShape ;
            sh:targetClass ex:Agent ;
            sh:property [ sh:path ex:name ; sh:minCount 1 ; sh:maxLength 5 ] ,
                        [ sh:path ex:age ; sh:datatype xsd:integer ; sh:minInclusive 0 ] ,
                        [ sh:path ex:employer ; sh:class ex:Organization ; sh:nodeKind sh:IRI ] ,
                        [ sh:path ex:label ; sh:uniqueLang true ] ,
                        [ sh:path ex:status ; sh:hasValue ex:Active ] .
    "#;

    fn evaluate(
        shapes: &str,
        data: &str,
        ontology: Option<&RdfGraph>,
    ) -> Result<Vec<ShaclResult>, EngineError> {
        let shapes = ShapeSet::load(&RdfGraph::from_turtle(&format!("{PREFIXES}{shapes}"))?)?;
        let data = RdfGraph::from_turtle(&format!("{PREFIXES}{data}"))?;
        let checker = ConstraintChecker::new(&data, ontology, &shapes);
        let mut results = Vec::new();
        for shape in shapes.targeted() {
            for focus in checker.focus_nodes(shape)? {
                results.extend(checker.validate_focus(&focus, shape)?);
            }
        }
        Ok(results)
    }

    fn check(data: &str) -> anyhow::Result<Vec<ShaclResult>> {
        let ontology = RdfGraph::from_turtle(&format!(
            "{PREFIXES}
             ex:Person rdfs:subClassOf ex:Agent .
             ex:Company rdfs:subClassOf ex:Organization ."
        ))?;
        Ok(evaluate(AGENT_SHAPES, data, Some(&ontology))?)
    }

    fn components(results: &[ShaclResult]) -> Vec<ConstraintComponent> {
        results.iter().map(ShaclResult::component).collect()
    }

    /// `(focus node, component)` pairs, order-free.
    fn outcomes(results: &[ShaclResult]) -> BTreeSet<(String, String)> {
        results
            .iter()
            .map(|r| (r.focus_node().to_string(), format!("{:?}", r.component())))
            .collect()
    }

    fn pair(focus: &str, component: &str) -> (String, String) {
        (format!("<http://example.org/{focus}>"), component.to_string())
    }

    #[test]
    fn subclass_instances_are_targeted() -> anyhow::Result<()> {
        let results = check("ex:bob a ex:Person ; ex:status ex:Active .")?;
        assert_eq!(components(&results), vec![ConstraintComponent::MinCount]);
        assert_eq!(results[0].focus_node().to_string(), "<http://example.org/bob>");
        assert!(results[0].message().contains("http://example.org/name"));
        Ok(())
    }

    #[test]
    fn conforming_node_has_no_results() -> anyhow::Result<()> {
        let results = check(
            r#"ex:acme a ex:Company .
               ex:bob a ex:Agent ; ex:name "Bob" ; ex:age 42 ; ex:employer ex:acme ;
                   ex:label "Bob"@en, "Robert"@fr ; ex:status ex:Active ."#,
        )?;
        assert!(results.is_empty(), "{results:?}");
        Ok(())
    }

    #[test]
    fn value_constraints_report_the_value() -> anyhow::Result<()> {
        let results = check(
            r#"ex:bob a ex:Agent ; ex:name "Roberto" ; ex:age -1 ; ex:employer ex:nobody ;
                   ex:label "Bob"@en, "Bobby"@en ; ex:status ex:Retired ."#,
        )?;
        let found: BTreeSet<_> = components(&results).into_iter().map(|c| format!("{c:?}")).collect();
        let expected: BTreeSet<_> = ["MaxLength", "MinInclusive", "Class", "UniqueLang", "HasValue"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(found, expected);
        let age = results
            .iter()
            .find(|r| r.component() == ConstraintComponent::MinInclusive)
            .and_then(ShaclResult::value);
        assert!(age.is_some());
        Ok(())
    }

    #[test]
    fn datatype_mismatch_is_reported() -> anyhow::Result<()> {
        let results = check(r#"ex:bob a ex:Agent ; ex:name "Bob" ; ex:age "old" ; ex:status ex:Active ."#)?;
        assert_eq!(
            components(&results),
            vec![ConstraintComponent::Datatype, ConstraintComponent::MinInclusive]
        );
        Ok(())
    }

    #[test]
    fn node_reference_checks_nested_values() -> anyhow::Result<()> {
        let results = evaluate(
            r#"ex:PersonShape sh:targetClass ex:Person ;
                   sh:property [ sh:path ex:address ; sh:node ex:AddressShape ] .
               ex:AddressShape sh:property [ sh:path ex:city ; sh:minCount 1 ] ."#,
            r#"ex:bob a ex:Person ; ex:address ex:home . ex:home ex:street "Main" .
               ex:ann a ex:Person ; ex:address ex:flat . ex:flat ex:city "Paris" ."#,
            None,
        )?;
        assert_eq!(components(&results), vec![ConstraintComponent::Node]);
        assert_eq!(results[0].focus_node().to_string(), "<http://example.org/bob>");
        assert_eq!(results[0].value().map(ToString::to_string).as_deref(), Some("<http://example.org/home>"));
        Ok(())
    }

    #[test]
    fn closed_shape_rejects_other_predicates() -> anyhow::Result<()> {
        let results = evaluate(
            r#"ex:PointShape sh:targetClass ex:Point ;
                   sh:closed true ;
                   sh:ignoredProperties ( rdf:type ) ;
                   sh:property [ sh:path ex:x ] , [ sh:path ex:y ] ."#,
            "ex:p a ex:Point ; ex:x 1 ; ex:y 2 ; ex:z 3 .",
            None,
        )?;
        assert_eq!(components(&results), vec![ConstraintComponent::Closed]);
        assert_eq!(
            results[0].result_path().map(NamedNode::as_str),
            Some("http://example.org/z")
        );
        assert_eq!(
            results[0].value(),
            Some(&Term::from(Literal::new_typed_literal("3", xsd::INTEGER)))
        );
        Ok(())
    }

    #[test]
    fn exclusive_bounds_reject_the_bound_itself() -> anyhow::Result<()> {
        let results = evaluate(
            r#"ex:PriceShape sh:targetClass ex:Item ;
                   sh:property [ sh:path ex:price ; sh:minExclusive 0 ; sh:maxExclusive 100 ] ."#,
            r#"ex:a a ex:Item ; ex:price 0 .
               ex:b a ex:Item ; ex:price 50 .
               ex:c a ex:Item ; ex:price 100.0 .
               ex:d a ex:Item ; ex:price "cheap" ."#,
            None,
        )?;
        assert_eq!(
            outcomes(&results),
            BTreeSet::from([
                pair("a", "MinExclusive"),
                pair("c", "MaxExclusive"),
                pair("d", "MinExclusive"),
                pair("d", "MaxExclusive"),
            ])
        );
        Ok(())
    }

    #[test]
    fn date_bounds_compare_chronologically() -> anyhow::Result<()> {
        let results = evaluate(
            r#"ex:EventShape sh:targetClass ex:Event ;
                   sh:property [ sh:path ex:on ; sh:minInclusive "2020-01-01"^^xsd:date ] ,
                               [ sh:path ex:at ; sh:maxExclusive "2020-01-01T00:00:00Z"^^xsd:dateTime ] ."#,
            r#"ex:early a ex:Event ; ex:on "2019-12-31"^^xsd:date ; ex:at "2019-12-31T23:00:00-02:00"^^xsd:dateTime .
               ex:fine a ex:Event ; ex:on "2020-01-01"^^xsd:date ; ex:at "2019-12-31T23:59:59"^^xsd:dateTime ."#,
            None,
        )?;
        assert_eq!(
            outcomes(&results),
            BTreeSet::from([pair("early", "MinInclusive"), pair("early", "MaxExclusive")])
        );
        Ok(())
    }

    #[test]
    fn logical_operators_combine_shapes() -> anyhow::Result<()> {
        let results = evaluate(
            r#"ex:ContactShape sh:targetClass ex:Contact ;
                   sh:or ( [ sh:path ex:email ; sh:minCount 1 ] [ sh:path ex:phone ; sh:minCount 1 ] ) ;
                   sh:not [ sh:path ex:banned ; sh:hasValue true ] ;
                   sh:xone ( [ sh:path ex:personal ; sh:minCount 1 ] [ sh:path ex:business ; sh:minCount 1 ] ) ;
                   sh:and ( [ sh:path ex:name ; sh:minCount 1 ] [ sh:path ex:name ; sh:maxCount 1 ] ) ."#,
            r#"ex:ok a ex:Contact ; ex:email "ok@example.org" ; ex:personal true ; ex:name "Ok" .
               ex:bad a ex:Contact ; ex:banned true ; ex:personal true ; ex:business true ."#,
            None,
        )?;
        assert_eq!(
            outcomes(&results),
            BTreeSet::from([
                pair("bad", "Or"),
                pair("bad", "Not"),
                pair("bad", "Xone"),
                pair("bad", "And"),
            ])
        );
        Ok(())
    }

    #[test]
    fn language_in_matches_ranges() -> anyhow::Result<()> {
        let results = evaluate(
            r#"ex:DocShape sh:targetNode ex:doc ;
                   sh:property [ sh:path ex:title ; sh:languageIn ( "en" "fr" ) ] ."#,
            r#"ex:doc ex:title "Hello"@en-GB , "Bonjour"@fr , "Hallo"@de , "untagged" ."#,
            None,
        )?;
        let rejected: BTreeSet<String> = results
            .iter()
            .filter(|r| r.component() == ConstraintComponent::LanguageIn)
            .filter_map(|r| r.value().map(ToString::to_string))
            .collect();
        assert_eq!(
            rejected,
            BTreeSet::from(["\"Hallo\"@de".to_string(), "\"untagged\"".to_string()])
        );
        assert_eq!(results.len(), 2);
        Ok(())
    }

    #[test]
    fn qualified_value_shape_counts_conforming_values() -> anyhow::Result<()> {
        let results = evaluate(
            r#"ex:HandShape sh:targetClass ex:Hand ;
                   sh:property [ sh:path ex:digit ;
                                 sh:qualifiedValueShape [ sh:class ex:Thumb ] ;
                                 sh:qualifiedMinCount 1 ;
                                 sh:qualifiedMaxCount 1 ] ."#,
            r#"ex:left a ex:Hand ; ex:digit ex:t1 , ex:f1 . ex:t1 a ex:Thumb . ex:f1 a ex:Finger .
               ex:odd a ex:Hand ; ex:digit ex:t2 , ex:t3 . ex:t2 a ex:Thumb . ex:t3 a ex:Thumb .
               ex:none a ex:Hand ; ex:digit ex:f2 . ex:f2 a ex:Finger ."#,
            None,
        )?;
        assert_eq!(
            outcomes(&results),
            BTreeSet::from([pair("odd", "QualifiedMaxCount"), pair("none", "QualifiedMinCount")])
        );
        Ok(())
    }

    #[test]
    fn node_shape_constraints_apply_to_the_focus() -> anyhow::Result<()> {
        let results = evaluate(
            r#"ex:PageShape sh:targetClass ex:Page ;
                   sh:nodeKind sh:IRI ;
                   sh:pattern "^http://example.org/pages/" ;
                   sh:class ex:Document ."#,
            r#"ex:Page rdfs:subClassOf ex:Document .
               <http://example.org/pages/home> a ex:Page .
               <http://example.org/other> a ex:Page .
               _:draft a ex:Page ."#,
            None,
        )?;
        let found = components(&results);
        assert_eq!(found.len(), 3, "{results:?}");
        assert_eq!(found.iter().filter(|c| **c == ConstraintComponent::Pattern).count(), 2);
        assert_eq!(found.iter().filter(|c| **c == ConstraintComponent::NodeKind).count(), 1);
        for result in &results {
            assert_eq!(result.value(), Some(result.focus_node()));
            assert!(result.result_path().is_none());
        }
        Ok(())
    }

    #[test]
    fn equals_and_disjoint_compare_sibling_properties() -> anyhow::Result<()> {
        let results = evaluate(
            r#"ex:NameShape sh:targetNode ex:a ;
                   sh:property [ sh:path ex:name ; sh:equals ex:label ; sh:disjoint ex:alias ] ."#,
            r#"ex:a ex:name "A" ; ex:label "B" ; ex:alias "A" ."#,
            None,
        )?;
        let found = components(&results);
        assert_eq!(found.iter().filter(|c| **c == ConstraintComponent::Equals).count(), 2);
        assert_eq!(found.iter().filter(|c| **c == ConstraintComponent::Disjoint).count(), 1);
        assert_eq!(found.len(), 3);
        Ok(())
    }

    #[test]
    fn complex_paths_reach_values() -> anyhow::Result<()> {
        let shapes = r#"ex:CityShape sh:targetNode ex:paris ;
                   sh:property [ sh:path [ sh:inversePath ex:livesIn ] ; sh:minCount 2 ] ,
                               [ sh:path ( ex:country ex:capital ) ; sh:hasValue ex:paris ] ,
                               [ sh:path [ sh:oneOrMorePath ex:partOf ] ; sh:hasValue ex:earth ] ."#;
        let data = "ex:ann ex:livesIn ex:paris .
                    ex:paris ex:country ex:france ; ex:partOf ex:france .
                    ex:france ex:capital ex:paris ; ex:partOf ex:europe .
                    ex:europe ex:partOf ex:earth .";

        let results = evaluate(shapes, data, None)?;
        assert_eq!(components(&results), vec![ConstraintComponent::MinCount]);
        assert!(results[0].result_path().is_none());
        assert!(results[0].message().contains("^<http://example.org/livesIn>"));

        let crowded = format!("{data} ex:bob ex:livesIn ex:paris .");
        assert!(evaluate(shapes, &crowded, None)?.is_empty());
        Ok(())
    }

    #[test]
    fn recursive_shapes_stop_at_the_depth_limit() {
        let outcome = evaluate(
            r#"ex:FriendShape sh:targetNode ex:a ;
                   sh:property [ sh:path ex:knows ; sh:node ex:FriendShape ] ."#,
            "ex:a ex:knows ex:a .",
            None,
        );
        assert!(
            matches!(&outcome, Err(EngineError::Execution(message)) if message.contains("deeper")),
            "{outcome:?}"
        );
    }

    #[test]
    fn literal_target_nodes_are_checked() -> anyhow::Result<()> {
        let results = evaluate(
            r#"ex:CodeShape sh:targetNode "ab" , "abc" ; sh:minLength 3 ."#,
            "ex:unrelated ex:p ex:o .",
            None,
        )?;
        assert_eq!(components(&results), vec![ConstraintComponent::MinLength]);
        assert_eq!(results[0].focus_node().to_string(), "\"ab\"");
        Ok(())
    }
}
