//! OASIS XML catalogs (`catalog-v001.xml`).
//!
//! A catalog is a flat list of `<uri name="..." uri="..."/>` elements, with
//! optional `domain`, `test-type` and `category` attributes on test catalogs.
//! The catalog namespace is optional; elements are matched by local name.

use crate::error::CatalogError;
use crate::iri;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CATALOG_NAMESPACE: &str = "urn:oasis:names:tc:entity:xmlns:xml:catalog";

/// File extensions that hold ontology graphs.
const ONTOLOGY_EXTENSIONS: &[&str] = &["ttl", "rdf", "owl", "xml", "nt", "n3"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub uri: String,
    pub domain: Option<String>,
    pub test_type: Option<String>,
    pub category: Option<String>,
}

/// What a catalogued artifact file holds, judged by its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Ontology,
    Shapes,
    Context,
    Other,
}

impl ArtifactKind {
    pub fn from_path(path: &str) -> Self {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".context.jsonld") || lower.ends_with(".context.json") {
            return ArtifactKind::Context;
        }
        if lower.contains(".shacl.") {
            return ArtifactKind::Shapes;
        }
        let extension = Path::new(&lower)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_string();
        if ONTOLOGY_EXTENSIONS.contains(&extension.as_str()) {
            ArtifactKind::Ontology
        } else {
            ArtifactKind::Other
        }
    }
}

pub fn read_catalog(path: &Path) -> Result<Vec<CatalogEntry>, CatalogError> {
    let xml = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_catalog(&xml, path)
}

pub fn parse_catalog(xml: &str, path: &Path) -> Result<Vec<CatalogEntry>, CatalogError> {
    let malformed = |message: String| CatalogError::Xml {
        path: path.to_path_buf(),
        message,
    };

    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut entries = Vec::new();
    let mut saw_root = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                let local = element.local_name();
                match local.as_ref() {
                    b"catalog" => saw_root = true,
                    b"uri" => {
                        if let Some(entry) = entry_from_element(&element).map_err(malformed)? {
                            entries.push(entry);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(malformed(format!(
                    "at byte {}: {e}",
                    reader.buffer_position()
                )));
            }
        }
    }

    if !saw_root {
        return Err(malformed("missing <catalog> root element".to_string()));
    }
    Ok(entries)
}

fn entry_from_element(element: &BytesStart<'_>) -> Result<Option<CatalogEntry>, String> {
    let mut name = None;
    let mut uri = None;
    let mut domain = None;
    let mut test_type = None;
    let mut category = None;

    for attribute in element.attributes() {
        let attribute = attribute.map_err(|e| e.to_string())?;
        let value = attribute
            .unescape_value()
            .map_err(|e| e.to_string())?
            .into_owned();
        match attribute.key.local_name().as_ref() {
            b"name" => name = Some(value),
            b"uri" => uri = Some(value),
            b"domain" => domain = Some(value),
            b"test-type" => test_type = Some(value),
            b"category" => category = Some(value),
            _ => {}
        }
    }

    Ok(match (name, uri) {
        (Some(name), Some(uri)) if !name.is_empty() && !uri.is_empty() => Some(CatalogEntry {
            name,
            uri,
            domain,
            test_type,
            category,
        }),
        _ => None,
    })
}

/// Joins a catalog `uri` onto the directory the catalog lives in, unless the
/// uri already starts with that directory.
pub fn normalize_entry_path(base_dir: Option<&str>, uri: &str) -> PathBuf {
    let uri = uri.trim_start_matches("./");
    match base_dir {
        Some(base) if !uri.starts_with(&format!("{base}/")) => Path::new(base).join(uri),
        _ => PathBuf::from(uri),
    }
}

/// Domain of an `artifacts/<domain>/...` path.
pub fn artifact_domain(path: &Path) -> Option<String> {
    let mut components = path.components().map(|c| c.as_os_str().to_string_lossy());
    match (components.next(), components.next(), components.next()) {
        (Some(first), Some(domain), Some(_)) if first == "artifacts" => Some(domain.into_owned()),
        _ => None,
    }
}

// =============================================================================
// Identifier index
// =============================================================================

/// Ways an identifier is matched against catalogued names, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogLookup {
    Exact,
    /// Longest catalogued namespace the identifier lives under
    LongestPrefix,
}

pub const CATALOG_LOOKUP_ORDER: [CatalogLookup; 2] =
    [CatalogLookup::Exact, CatalogLookup::LongestPrefix];

/// Identifier to repository-relative path map with exact-then-prefix lookup.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    entries: BTreeMap<String, PathBuf>,
}

impl CatalogIndex {
    /// Adds a mapping. The first path registered for an identifier wins;
    /// returns false for a duplicate.
    pub fn insert(&mut self, identifier: impl Into<String>, path: PathBuf) -> bool {
        let identifier = identifier.into();
        if self.entries.contains_key(&identifier) {
            return false;
        }
        self.entries.insert(identifier, path);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries
            .iter()
            .map(|(identifier, path)| (identifier.as_str(), path.as_path()))
    }

    pub fn resolve_exact(&self, identifier: &str) -> Option<&Path> {
        self.entries.get(identifier).map(PathBuf::as_path)
    }

    pub fn resolve(&self, identifier: &str) -> Option<&Path> {
        CATALOG_LOOKUP_ORDER
            .iter()
            .find_map(|lookup| self.lookup(*lookup, identifier))
    }

    fn lookup(&self, lookup: CatalogLookup, identifier: &str) -> Option<&Path> {
        match lookup {
            CatalogLookup::Exact => self.resolve_exact(identifier),
            CatalogLookup::LongestPrefix => self
                .entries
                .iter()
                .filter(|(name, _)| iri::matches_namespace(identifier, name))
                .max_by_key(|(name, _)| iri::trim_terminators(name).len())
                .map(|(_, path)| path.as_path()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMESPACED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE catalog PUBLIC "-//OASIS//DTD XML Catalogs V1.1//EN" "http://www.oasis-open.org/committees/entity/release/1.1/catalog.dtd">
<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog" prefer="public">
  <uri name="https://w3id.org/ascs-ev/envited-x/scenario/v5/" uri="scenario/scenario.owl.ttl"/>
  <uri name="https://w3id.org/ascs-ev/envited-x/scenario/v5/shacl" uri="scenario/scenario.shacl.ttl"/>
  <uri name="https://w3id.org/ascs-ev/envited-x/scenario/v5/context" uri="scenario/scenario.context.jsonld"/>
</catalog>"#;

    #[test]
    fn parses_namespaced_catalog() -> anyhow::Result<()> {
        let entries = parse_catalog(NAMESPACED, Path::new("artifacts/catalog-v001.xml"))?;
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].uri, "scenario/scenario.owl.ttl");
        assert_eq!(entries[0].domain, None);
        Ok(())
    }

    #[test]
    fn parses_plain_catalog_with_test_attributes() -> anyhow::Result<()> {
        let xml = r#"<catalog>
            <uri name="did:web:example:Org" uri="tests/fixtures/org.json" category="fixture"/>
            <uri name="urn:test:valid-1" uri="tests/data/scenario/valid/one.json" domain="scenario" test-type="valid" category="test-data"/>
            <uri name="" uri="ignored.json"/>
        </catalog>"#;
        let entries = parse_catalog(xml, Path::new("tests/catalog-v001.xml"))?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].category.as_deref(), Some("fixture"));
        assert_eq!(entries[1].test_type.as_deref(), Some("valid"));
        assert_eq!(entries[1].domain.as_deref(), Some("scenario"));
        Ok(())
    }

    #[test]
    fn rejects_malformed_xml() {
        let result = parse_catalog("<catalog><uri name=\"a\"", Path::new("broken.xml"));
        assert!(matches!(result, Err(CatalogError::Xml { .. })));
        let result = parse_catalog("<other/>", Path::new("broken.xml"));
        assert!(matches!(result, Err(CatalogError::Xml { .. })));
    }

    #[test]
    fn classifies_artifacts_by_name() {
        assert_eq!(ArtifactKind::from_path("a/b.context.jsonld"), ArtifactKind::Context);
        assert_eq!(ArtifactKind::from_path("a/b.shacl.ttl"), ArtifactKind::Shapes);
        assert_eq!(ArtifactKind::from_path("a/b.owl.ttl"), ArtifactKind::Ontology);
        assert_eq!(ArtifactKind::from_path("a/b.rdf"), ArtifactKind::Ontology);
        assert_eq!(ArtifactKind::from_path("a/README.md"), ArtifactKind::Other);
    }

    #[test]
    fn entry_paths_are_rooted_once() {
        assert_eq!(
            normalize_entry_path(Some("artifacts"), "scenario/s.owl.ttl"),
            PathBuf::from("artifacts/scenario/s.owl.ttl")
        );
        assert_eq!(
            normalize_entry_path(Some("artifacts"), "artifacts/scenario/s.owl.ttl"),
            PathBuf::from("artifacts/scenario/s.owl.ttl")
        );
        assert_eq!(
            normalize_entry_path(None, "tests/fixtures/org.json"),
            PathBuf::from("tests/fixtures/org.json")
        );
    }

    #[test]
    fn artifact_domain_from_path() {
        assert_eq!(
            artifact_domain(Path::new("artifacts/scenario/s.owl.ttl")).as_deref(),
            Some("scenario")
        );
        assert_eq!(artifact_domain(Path::new("imports/owl/owl.ttl")), None);
        assert_eq!(artifact_domain(Path::new("artifacts/top.ttl")), None);
    }

    #[test]
    fn index_prefers_exact_then_longest_prefix() {
        let mut index = CatalogIndex::default();
        index.insert("http://ex.org/a/", PathBuf::from("short.ttl"));
        index.insert("http://ex.org/a/b/", PathBuf::from("long.ttl"));
        index.insert("http://ex.org/a/b/exact", PathBuf::from("exact.ttl"));
        assert!(!index.insert("http://ex.org/a/", PathBuf::from("dup.ttl")));

        assert_eq!(index.resolve("http://ex.org/a/b/exact"), Some(Path::new("exact.ttl")));
        assert_eq!(index.resolve("http://ex.org/a/b/other"), Some(Path::new("long.ttl")));
        assert_eq!(index.resolve("http://ex.org/a/x"), Some(Path::new("short.ttl")));
        assert_eq!(index.resolve("http://ex.org/ab/x"), None);
    }
}
