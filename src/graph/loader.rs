//! Loading instance and schema documents into graphs.

use super::vocab::rdf;
use super::{DocumentFormat, DocumentKind, RdfGraph};
use crate::error::GraphError;
use crate::iri;
use crate::registry::RegistryResolver;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use oxigraph::model::{NamedNode, NamedOrBlankNode, Term};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

static TURTLE_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?mi)^\s*@?prefix\s+([A-Za-z][\w.-]*)?:\s*<([^>]*)>").expect("static regex")
});

/// Depth limit when inlining contexts that themselves reference contexts.
const MAX_CONTEXT_DEPTH: usize = 4;

/// Result of [`GraphLoader::load`].
#[derive(Debug)]
pub struct LoadedGraph {
    pub graph: RdfGraph,
    /// Prefix to namespace, for namespaces ending in `/` or `#`. Later
    /// documents override earlier ones.
    pub prefixes: IndexMap<String, String>,
    /// Display paths of the loaded files, in load order
    pub files: Vec<String>,
}

/// Parses documents from disk into [`RdfGraph`]s.
///
/// Relative paths are read against `root`. When a resolver is attached,
/// remote JSON-LD context IRIs it knows are replaced by their local copies
/// before parsing; nothing is ever fetched over the network.
#[derive(Debug, Clone)]
pub struct GraphLoader {
    root: PathBuf,
    resolver: Option<Arc<RegistryResolver>>,
}

impl GraphLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            resolver: None,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<RegistryResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Loads every file into one graph. The first parse failure aborts the
    /// whole load.
    pub fn load<P: AsRef<Path>>(&self, files: &[P]) -> Result<LoadedGraph, GraphError> {
        let graph = RdfGraph::new()?;
        let mut prefixes = IndexMap::new();
        let mut loaded = Vec::with_capacity(files.len());

        for file in files {
            let path = self.absolute(file.as_ref());
            self.load_into(&graph, &path, &mut prefixes)?;
            loaded.push(display_path(&path, &self.root));
        }

        Ok(LoadedGraph {
            graph,
            prefixes,
            files: loaded,
        })
    }

    /// Parses one file into `graph`, recording its prefixes.
    pub fn load_into(
        &self,
        graph: &RdfGraph,
        path: &Path,
        prefixes: &mut IndexMap<String, String>,
    ) -> Result<(), GraphError> {
        let path = self.absolute(path);
        let display_name = display_path(&path, &self.root);
        let format = DocumentFormat::from_path(&path);
        let bytes = fs::read(&path).map_err(|source| GraphError::Io {
            path: display_name.clone(),
            source,
        })?;

        let bytes = match format {
            DocumentFormat::JsonLd => {
                let mut document: Value =
                    serde_json::from_slice(&bytes).map_err(|source| GraphError::Json {
                        path: display_name.clone(),
                        source,
                    })?;
                collect_jsonld_prefixes(&document, prefixes);
                if self.inline_contexts(&mut document) {
                    serde_json::to_vec(&document).map_err(|source| GraphError::Json {
                        path: display_name.clone(),
                        source,
                    })?
                } else {
                    bytes
                }
            }
            DocumentFormat::Turtle => {
                collect_turtle_prefixes(&String::from_utf8_lossy(&bytes), prefixes);
                bytes
            }
        };

        let base = base_iri(&path);
        graph.parse_bytes(&bytes, format, base.as_deref(), &display_name)?;
        debug!(file = %display_name, %format, "loaded document");
        Ok(())
    }

    /// Parses a single file into its own graph and classifies it.
    pub fn load_document(&self, path: &Path) -> Result<(RdfGraph, DocumentKind), GraphError> {
        let graph = RdfGraph::new()?;
        let mut prefixes = IndexMap::new();
        self.load_into(&graph, path, &mut prefixes)?;
        let kind = DocumentKind::classify(&graph)?;
        Ok((graph, kind))
    }

    /// Loads fixture documents for external identifiers that the graph does
    /// not describe yet. Returns how many fixtures were merged.
    ///
    /// Unknown identifiers, missing files and unparsable fixtures are skipped
    /// with a warning. Each fixture is parsed into a scratch graph first so a
    /// broken fixture never leaves partial triples behind.
    pub fn load_fixtures_for(
        &self,
        identifiers: &BTreeSet<String>,
        resolver: &RegistryResolver,
        graph: &RdfGraph,
    ) -> Result<usize, GraphError> {
        let mut loaded = 0;
        for identifier in identifiers {
            let Ok(node) = NamedNode::new(identifier.as_str()) else {
                warn!(identifier = %identifier, "skipping external reference that is not a valid IRI");
                continue;
            };
            if graph.has_subject(node.as_ref().into())? {
                continue;
            }

            let Some(relative) = resolver.resolve_fixture(identifier) else {
                warn!(identifier = %identifier, "no fixture registered for external reference");
                continue;
            };
            let path = resolver.to_absolute(relative);
            if !path.is_file() {
                warn!(
                    identifier = %identifier,
                    fixture = %display_path(&path, &self.root),
                    "fixture file does not exist"
                );
                continue;
            }

            let scratch = RdfGraph::new()?;
            let mut ignored = IndexMap::new();
            match self.load_into(&scratch, &path, &mut ignored) {
                Ok(()) => {
                    graph.merge_from(&scratch)?;
                    debug!(
                        identifier = %identifier,
                        fixture = %display_path(&path, &self.root),
                        "loaded fixture"
                    );
                    loaded += 1;
                }
                Err(e) => warn!(identifier = %identifier, error = %e, "could not load fixture"),
            }
        }
        Ok(loaded)
    }

    /// Replaces remote context IRIs in the top-level `@context` of each node
    /// object by the contents of the local files the resolver maps them to.
    /// Returns true when anything changed.
    fn inline_contexts(&self, document: &mut Value) -> bool {
        let Some(resolver) = self.resolver.as_deref() else {
            return false;
        };
        match document {
            Value::Object(map) => map
                .get_mut("@context")
                .is_some_and(|context| self.inline_context_value(context, resolver, 0)),
            Value::Array(items) => items
                .iter_mut()
                .map(|item| self.inline_contexts(item))
                .fold(false, |changed, item| changed | item),
            _ => false,
        }
    }

    fn inline_context_value(
        &self,
        context: &mut Value,
        resolver: &RegistryResolver,
        depth: usize,
    ) -> bool {
        if depth >= MAX_CONTEXT_DEPTH {
            return false;
        }
        match context {
            Value::String(reference) => {
                let Some(local) = resolver.resolve_context(reference) else {
                    return false;
                };
                let path = resolver.to_absolute(local);
                let loaded = fs::read(&path)
                    .ok()
                    .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok());
                match loaded {
                    Some(Value::Object(mut map)) => {
                        let mut inner = map.remove("@context").unwrap_or(Value::Object(map));
                        self.inline_context_value(&mut inner, resolver, depth + 1);
                        debug!(context = %reference, local = %path.display(), "inlined remote context");
                        *context = inner;
                        true
                    }
                    _ => {
                        warn!(context = %reference, local = %path.display(), "could not read local context");
                        false
                    }
                }
            }
            Value::Array(items) => items
                .iter_mut()
                .map(|item| self.inline_context_value(item, resolver, depth))
                .fold(false, |changed, item| changed | item),
            _ => false,
        }
    }
}

/// IRIs of every `rdf:type` object.
pub fn extract_observed_types(graph: &RdfGraph) -> Result<BTreeSet<String>, GraphError> {
    Ok(graph
        .triples_matching(None, Some(rdf::TYPE), None)?
        .into_iter()
        .filter_map(|triple| match triple.object {
            Term::NamedNode(class) => Some(class.into_string()),
            _ => None,
        })
        .collect())
}

/// `did:web:` identifiers used as subject or object.
pub fn extract_external_references(graph: &RdfGraph) -> Result<BTreeSet<String>, GraphError> {
    let mut references = BTreeSet::new();
    for triple in graph.triples_matching(None, None, None)? {
        if let NamedOrBlankNode::NamedNode(subject) = &triple.subject {
            if iri::is_did_web(subject.as_str()) {
                references.insert(subject.as_str().to_string());
            }
        }
        if let Term::NamedNode(object) = &triple.object {
            if iri::is_did_web(object.as_str()) {
                references.insert(object.as_str().to_string());
            }
        }
    }
    Ok(references)
}

/// Path relative to `root` when it lives there, otherwise unchanged.
pub fn display_path(path: &Path, root: &Path) -> String {
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let candidate = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    candidate
        .strip_prefix(&root)
        .or_else(|_| path.strip_prefix(&root))
        .map(|relative| relative.display().to_string())
        .unwrap_or_else(|_| path.display().to_string())
}

fn base_iri(path: &Path) -> Option<String> {
    let absolute = std::path::absolute(path).ok()?;
    let text = absolute.to_str()?;
    if text.contains(char::is_whitespace) {
        return None;
    }
    Some(format!("file://{}", text.replace('\\', "/")))
}

fn is_namespace(value: &str) -> bool {
    value.ends_with('/') || value.ends_with('#')
}

fn collect_context_terms(context: &Value, prefixes: &mut IndexMap<String, String>) {
    match context {
        Value::Object(terms) => {
            for (term, value) in terms {
                if term.starts_with('@') {
                    continue;
                }
                if let Value::String(namespace) = value {
                    if is_namespace(namespace) {
                        prefixes.insert(term.clone(), namespace.clone());
                    }
                }
            }
        }
        Value::Array(contexts) => {
            for context in contexts {
                if context.is_object() {
                    collect_context_terms(context, prefixes);
                }
            }
        }
        _ => {}
    }
}

fn collect_jsonld_prefixes(document: &Value, prefixes: &mut IndexMap<String, String>) {
    match document {
        Value::Object(map) => {
            if let Some(context) = map.get("@context") {
                collect_context_terms(context, prefixes);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_jsonld_prefixes(item, prefixes);
            }
        }
        _ => {}
    }
}

fn collect_turtle_prefixes(text: &str, prefixes: &mut IndexMap<String, String>) {
    for captures in TURTLE_PREFIX.captures_iter(text) {
        let prefix = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
        let Some(namespace) = captures.get(2).map(|m| m.as_str()) else {
            continue;
        };
        if is_namespace(namespace) {
            prefixes.insert(prefix.to_string(), namespace.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ORG_JSONLD: &str = r#"{
        "@context": {
            "ex": "http://example.org/",
            "xsd": "http://www.w3.org/2001/XMLSchema#",
            "name": "http://example.org/name",
            "@vocab": "http://example.org/vocab/"
        },
        "@id": "ex:acme",
        "@type": "ex:Organization",
        "name": "Acme",
        "ex:parent": {"@id": "did:web:example:Org"}
    }"#;

    #[test]
    fn loads_jsonld_and_extracts_prefixes() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("org.json"), ORG_JSONLD)?;

        let loader = GraphLoader::new(dir.path());
        let loaded = loader.load(&["org.json"])?;

        assert_eq!(loaded.files, vec!["org.json"]);
        assert_eq!(loaded.prefixes.get("ex").map(String::as_str), Some("http://example.org/"));
        assert_eq!(
            loaded.prefixes.get("xsd").map(String::as_str),
            Some("http://www.w3.org/2001/XMLSchema#")
        );
        assert!(!loaded.prefixes.contains_key("name"));
        assert!(!loaded.prefixes.contains_key("@vocab"));

        let types = extract_observed_types(&loaded.graph)?;
        assert!(types.contains("http://example.org/Organization"));
        let external = extract_external_references(&loaded.graph)?;
        assert_eq!(external.into_iter().collect::<Vec<_>>(), vec!["did:web:example:Org"]);
        Ok(())
    }

    #[test]
    fn turtle_prefixes_are_collected() {
        let mut prefixes = IndexMap::new();
        collect_turtle_prefixes(
            "@prefix ex: <http://example.org/> .\nPREFIX sh: <http://www.w3.org/ns/shacl#>\n@prefix : <http://default.org/> .\n@prefix bad: <http://no-terminator.org/x> .",
            &mut prefixes,
        );
        assert_eq!(prefixes.get("ex").map(String::as_str), Some("http://example.org/"));
        assert_eq!(prefixes.get("sh").map(String::as_str), Some("http://www.w3.org/ns/shacl#"));
        assert_eq!(prefixes.get("").map(String::as_str), Some("http://default.org/"));
        assert!(!prefixes.contains_key("bad"));
    }

    #[test]
    fn parse_failure_aborts_load() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("good.ttl"), "<http://ex.org/a> a <http://ex.org/A> .")?;
        fs::write(dir.path().join("bad.json"), "{ \"@id\": ")?;

        let loader = GraphLoader::new(dir.path());
        let err = loader.load(&["good.ttl", "bad.json"]).unwrap_err();
        assert!(matches!(err, GraphError::Json { .. }));

        let err = loader.load(&["missing.ttl"]).unwrap_err();
        assert!(matches!(err, GraphError::Io { .. }));
        Ok(())
    }

    #[test]
    fn load_document_classifies() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        fs::write(
            dir.path().join("shapes.ttl"),
            "@prefix sh: <http://www.w3.org/ns/shacl#> . <http://ex.org/S> a sh:NodeShape .",
        )?;
        let (graph, kind) = GraphLoader::new(dir.path()).load_document(Path::new("shapes.ttl"))?;
        assert_eq!(kind, DocumentKind::Shapes);
        assert_eq!(graph.len()?, 1);
        Ok(())
    }

    #[test]
    fn display_path_is_root_relative() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        fs::create_dir_all(dir.path().join("a"))?;
        fs::write(dir.path().join("a/b.ttl"), "")?;
        assert_eq!(display_path(&dir.path().join("a/b.ttl"), dir.path()), format!("a{}b.ttl", std::path::MAIN_SEPARATOR));
        assert_eq!(display_path(Path::new("/elsewhere/x.ttl"), dir.path()), "/elsewhere/x.ttl");
        Ok(())
    }
}
