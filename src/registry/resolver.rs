use super::catalog::{
    self, ArtifactKind, CatalogEntry, CatalogIndex, artifact_domain, normalize_entry_path,
};
use super::document::RegistryDocument;
use crate::error::RegistryError;
use crate::iri;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

// =============================================================================
// Source locations
// =============================================================================

/// Where the resolver looks for a configuration document. Candidates are
/// tried in order and the first file that exists is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentLocation {
    pub candidates: &'static [&'static str],
    /// Directory catalog `uri` attributes are relative to
    pub base_dir: Option<&'static str>,
}

impl DocumentLocation {
    fn find(&self, root: &Path) -> Option<PathBuf> {
        self.candidates
            .iter()
            .map(|candidate| root.join(candidate))
            .find(|path| path.is_file())
    }
}

pub const REGISTRY_LOCATION: DocumentLocation = DocumentLocation {
    candidates: &["docs/registry.json", "registry.json"],
    base_dir: None,
};

pub const ARTIFACTS_CATALOG: DocumentLocation = DocumentLocation {
    candidates: &["artifacts/catalog-v001.xml"],
    base_dir: Some("artifacts"),
};

pub const IMPORTS_CATALOG: DocumentLocation = DocumentLocation {
    candidates: &["imports/catalog-v001.xml"],
    base_dir: Some("imports"),
};

pub const TESTS_CATALOG: DocumentLocation = DocumentLocation {
    candidates: &["tests/catalog-v001.xml"],
    base_dir: None,
};

pub const FIXTURE_CATEGORY: &str = "fixture";
pub const TEST_DATA_CATEGORY: &str = "test-data";

/// Strategies for mapping a type IRI to a domain, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeResolution {
    /// The IRI equals a domain's canonical IRI or namespace
    ExactIri,
    /// The IRI lives under a domain namespace; the longest namespace wins
    BoundaryPrefix,
}

pub const TYPE_RESOLUTION_ORDER: [TypeResolution; 2] =
    [TypeResolution::ExactIri, TypeResolution::BoundaryPrefix];

// =============================================================================
// Domain records
// =============================================================================

/// Where a domain's record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainSource {
    Registry,
    ArtifactsCatalog,
}

/// Artifacts of a domain's latest version, as repository-relative paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DomainArtifacts {
    pub ontology: Option<PathBuf>,
    pub shapes: Vec<PathBuf>,
    pub context: Option<PathBuf>,
    pub instance: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DomainRecord {
    pub name: String,
    pub canonical_iri: Option<String>,
    pub namespace: Option<String>,
    pub latest: Option<String>,
    pub artifacts: DomainArtifacts,
    pub source: DomainSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BaseSchema {
    path: PathBuf,
    iri: Option<String>,
}

/// Summary of what the resolver loaded.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryInfo {
    pub root_dir: String,
    pub registry_version: Option<String>,
    pub domains_available: usize,
    pub total_ontologies: usize,
    pub total_shape_files: usize,
    pub base_schemas: usize,
    pub fixture_mappings: usize,
    pub context_mappings: usize,
    pub test_entries: usize,
    pub warnings: Vec<String>,
}

// =============================================================================
// Resolver
// =============================================================================

/// Maps domains and type identifiers to schema files.
///
/// Built once from the registry document and the XML catalogs under `root`,
/// then read-only. Missing or malformed sources leave the corresponding
/// mappings empty and are recorded as warnings; construction never fails.
#[derive(Debug, Clone)]
pub struct RegistryResolver {
    root: PathBuf,
    registry_version: Option<String>,
    domains: BTreeMap<String, DomainRecord>,
    iri_index: BTreeMap<String, String>,
    base_schemas: Vec<BaseSchema>,
    contexts: CatalogIndex,
    fixtures: CatalogIndex,
    test_entries: Vec<CatalogEntry>,
    warnings: Vec<String>,
}

impl RegistryResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let mut resolver = Self {
            root: root.into(),
            registry_version: None,
            domains: BTreeMap::new(),
            iri_index: BTreeMap::new(),
            base_schemas: Vec::new(),
            contexts: CatalogIndex::default(),
            fixtures: CatalogIndex::default(),
            test_entries: Vec::new(),
            warnings: Vec::new(),
        };

        resolver.load_registry();
        resolver.load_artifacts_catalog();
        resolver.load_imports_catalog();
        resolver.load_tests_catalog();
        resolver.build_iri_index();

        debug!(
            root = %resolver.root.display(),
            domains = resolver.domains.len(),
            base_schemas = resolver.base_schemas.len(),
            fixtures = resolver.fixtures.len(),
            "registry resolver initialized"
        );
        resolver
    }

    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }

    fn load_registry(&mut self) {
        let Some(path) = REGISTRY_LOCATION.find(&self.root) else {
            self.warn(format!(
                "registry document not found under {}",
                self.root.display()
            ));
            return;
        };

        let document = match read_registry(&path) {
            Ok(document) => document,
            Err(e) => {
                self.warn(e.to_string());
                return;
            }
        };

        self.registry_version = document.version.clone();

        for (name, entry) in &document.ontologies {
            let mut artifacts = DomainArtifacts::default();
            match entry.latest_version() {
                Some(version) => {
                    artifacts.ontology = version.files.ontology.as_ref().map(PathBuf::from);
                    artifacts.shapes = version
                        .files
                        .shape_files()
                        .into_iter()
                        .map(PathBuf::from)
                        .collect();
                    artifacts.context = version.files.jsonld.as_ref().map(PathBuf::from);
                    artifacts.instance = version.files.instance.as_ref().map(PathBuf::from);
                }
                None => self.warn(format!(
                    "domain '{name}' has no version entry for latest pointer {:?}",
                    entry.latest
                )),
            }

            self.domains.insert(
                name.clone(),
                DomainRecord {
                    name: name.clone(),
                    canonical_iri: entry.iri.clone(),
                    namespace: entry.namespace.clone(),
                    latest: entry.latest.clone(),
                    artifacts,
                    source: DomainSource::Registry,
                },
            );
        }

        for base in &document.base_ontologies {
            self.push_base_schema(PathBuf::from(base), None);
        }
    }

    fn read_catalog_at(&mut self, location: &DocumentLocation) -> Option<Vec<CatalogEntry>> {
        let Some(path) = location.find(&self.root) else {
            debug!(candidates = ?location.candidates, "catalog not present");
            return None;
        };
        match catalog::read_catalog(&path) {
            Ok(entries) => Some(entries),
            Err(e) => {
                self.warn(e.to_string());
                None
            }
        }
    }

    fn load_artifacts_catalog(&mut self) {
        let Some(entries) = self.read_catalog_at(&ARTIFACTS_CATALOG) else {
            return;
        };

        let mut catalogued: BTreeMap<String, DomainRecord> = BTreeMap::new();
        for entry in entries {
            let path = normalize_entry_path(ARTIFACTS_CATALOG.base_dir, &entry.uri);
            let kind = ArtifactKind::from_path(&entry.uri);
            if kind == ArtifactKind::Context {
                self.contexts.insert(entry.name.clone(), path.clone());
            }
            let Some(domain) = artifact_domain(&path) else {
                continue;
            };

            let record = catalogued
                .entry(domain.clone())
                .or_insert_with(|| DomainRecord {
                    name: domain,
                    canonical_iri: None,
                    namespace: None,
                    latest: None,
                    artifacts: DomainArtifacts::default(),
                    source: DomainSource::ArtifactsCatalog,
                });
            match kind {
                ArtifactKind::Ontology if record.artifacts.ontology.is_none() => {
                    record.canonical_iri = Some(entry.name.clone());
                    record.artifacts.ontology = Some(path);
                }
                ArtifactKind::Shapes => record.artifacts.shapes.push(path),
                ArtifactKind::Context if record.artifacts.context.is_none() => {
                    record.artifacts.context = Some(path);
                }
                _ => {}
            }
        }

        for (name, mut found) in catalogued {
            found.artifacts.shapes.sort();
            found.artifacts.shapes.dedup();
            match self.domains.get_mut(&name) {
                // Registry records stay authoritative; the catalog only fills gaps.
                Some(existing) => {
                    let artifacts = &mut existing.artifacts;
                    if artifacts.ontology.is_none() {
                        artifacts.ontology = found.artifacts.ontology;
                    }
                    if artifacts.shapes.is_empty() {
                        artifacts.shapes = found.artifacts.shapes;
                    }
                    if artifacts.context.is_none() {
                        artifacts.context = found.artifacts.context;
                    }
                    if existing.canonical_iri.is_none() {
                        existing.canonical_iri = found.canonical_iri;
                    }
                }
                None => {
                    self.domains.insert(name, found);
                }
            }
        }
    }

    fn load_imports_catalog(&mut self) {
        let Some(entries) = self.read_catalog_at(&IMPORTS_CATALOG) else {
            return;
        };
        for entry in entries {
            let path = normalize_entry_path(IMPORTS_CATALOG.base_dir, &entry.uri);
            match ArtifactKind::from_path(&entry.uri) {
                ArtifactKind::Ontology => self.push_base_schema(path, Some(entry.name)),
                ArtifactKind::Context => {
                    self.contexts.insert(entry.name, path);
                }
                _ => {}
            }
        }
    }

    fn load_tests_catalog(&mut self) {
        let Some(entries) = self.read_catalog_at(&TESTS_CATALOG) else {
            return;
        };
        for entry in entries {
            if entry.category.as_deref() == Some(FIXTURE_CATEGORY) {
                let path = normalize_entry_path(TESTS_CATALOG.base_dir, &entry.uri);
                if !self.fixtures.insert(entry.name.clone(), path) {
                    self.warn(format!("duplicate fixture identifier '{}'", entry.name));
                }
            }
            self.test_entries.push(entry);
        }
    }

    fn push_base_schema(&mut self, path: PathBuf, iri: Option<String>) {
        match self.base_schemas.iter_mut().find(|base| base.path == path) {
            Some(existing) => {
                if existing.iri.is_none() {
                    existing.iri = iri;
                }
            }
            None => self.base_schemas.push(BaseSchema { path, iri }),
        }
    }

    fn build_iri_index(&mut self) {
        let mut index = BTreeMap::new();
        let mut collisions = Vec::new();
        for record in self.domains.values() {
            let keys = [record.canonical_iri.as_deref(), record.namespace.as_deref()];
            for key in keys.into_iter().flatten() {
                let key = iri::trim_terminators(key).to_string();
                if key.is_empty() {
                    continue;
                }
                match index.get(&key) {
                    Some(owner) if owner != &record.name => {
                        collisions.push(format!(
                            "IRI '{key}' claimed by domains '{owner}' and '{}'",
                            record.name
                        ));
                    }
                    Some(_) => {}
                    None => {
                        index.insert(key, record.name.clone());
                    }
                }
            }
        }
        self.iri_index = index;
        for collision in collisions {
            self.warn(collision);
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Warnings collected while loading the registry and catalogs.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn list_domains(&self) -> BTreeSet<String> {
        self.domains.keys().cloned().collect()
    }

    pub fn domain(&self, domain: &str) -> Option<&DomainRecord> {
        self.domains.get(domain)
    }

    pub fn get_canonical_iri(&self, domain: &str) -> Option<&str> {
        self.domains.get(domain)?.canonical_iri.as_deref()
    }

    pub fn get_ontology_path(&self, domain: &str) -> Option<&Path> {
        self.domains.get(domain)?.artifacts.ontology.as_deref()
    }

    pub fn get_shape_paths(&self, domain: &str) -> Vec<PathBuf> {
        self.domains
            .get(domain)
            .map(|record| record.artifacts.shapes.clone())
            .unwrap_or_default()
    }

    pub fn get_context_path(&self, domain: &str) -> Option<&Path> {
        self.domains.get(domain)?.artifacts.context.as_deref()
    }

    pub fn get_all_ontology_paths(&self) -> Vec<PathBuf> {
        let paths: BTreeSet<PathBuf> = self
            .domains
            .values()
            .filter_map(|record| record.artifacts.ontology.clone())
            .collect();
        paths.into_iter().collect()
    }

    pub fn get_all_shape_paths(&self) -> Vec<PathBuf> {
        let paths: BTreeSet<PathBuf> = self
            .domains
            .values()
            .flat_map(|record| record.artifacts.shapes.iter().cloned())
            .collect();
        paths.into_iter().collect()
    }

    /// Maps a type IRI to the domain whose namespace it lives under.
    pub fn resolve_type_to_domain(&self, type_iri: &str) -> Option<&str> {
        TYPE_RESOLUTION_ORDER
            .iter()
            .find_map(|strategy| self.resolve_with(*strategy, type_iri))
    }

    fn resolve_with(&self, strategy: TypeResolution, type_iri: &str) -> Option<&str> {
        match strategy {
            TypeResolution::ExactIri => self
                .iri_index
                .get(iri::trim_terminators(type_iri))
                .map(String::as_str),
            TypeResolution::BoundaryPrefix => self
                .iri_index
                .iter()
                .filter(|(key, _)| iri::matches_namespace(type_iri, key))
                .max_by_key(|(key, _)| key.len())
                .map(|(_, domain)| domain.as_str()),
        }
    }

    /// Local file for an external identifier, from the fixture catalog.
    pub fn resolve_fixture(&self, identifier: &str) -> Option<&Path> {
        self.fixtures.resolve_exact(identifier)
    }

    /// Local file for a remote JSON-LD context IRI.
    pub fn resolve_context(&self, context_iri: &str) -> Option<&Path> {
        self.contexts.resolve(context_iri)
    }

    /// Foundational vocabulary files that exist on disk, sorted.
    pub fn get_base_schema_paths(&self) -> Vec<PathBuf> {
        let paths: BTreeSet<PathBuf> = self
            .base_schemas
            .iter()
            .filter(|base| self.to_absolute(&base.path).is_file())
            .map(|base| base.path.clone())
            .collect();
        paths.into_iter().collect()
    }

    /// Base schemas whose IRI namespace is used by any of `iris`.
    /// `http` and `https` forms of a namespace are treated as equal.
    pub fn get_base_schema_paths_for(&self, iris: &BTreeSet<String>) -> Vec<PathBuf> {
        let normalized: Vec<String> = iris.iter().map(|i| iri::normalize_scheme(i)).collect();
        let paths: BTreeSet<PathBuf> = self
            .base_schemas
            .iter()
            .filter(|base| {
                base.iri.as_deref().is_some_and(|base_iri| {
                    let base_iri = iri::normalize_scheme(base_iri);
                    normalized
                        .iter()
                        .any(|used| used.starts_with(&base_iri) || iri::matches_namespace(used, &base_iri))
                })
            })
            .filter(|base| self.to_absolute(&base.path).is_file())
            .map(|base| base.path.clone())
            .collect();
        paths.into_iter().collect()
    }

    /// Test files of `domain` in `category`, optionally limited to one test type.
    /// Only files that exist are returned, as absolute paths.
    pub fn get_test_files(
        &self,
        domain: &str,
        test_type: Option<&str>,
        category: &str,
    ) -> Vec<PathBuf> {
        let files: BTreeSet<PathBuf> = self
            .test_entries
            .iter()
            .filter(|entry| entry.category.as_deref() == Some(category))
            .filter(|entry| entry.domain.as_deref() == Some(domain))
            .filter(|entry| test_type.is_none() || entry.test_type.as_deref() == test_type)
            .map(|entry| self.to_absolute(&normalize_entry_path(TESTS_CATALOG.base_dir, &entry.uri)))
            .filter(|path| path.is_file())
            .collect();
        files.into_iter().collect()
    }

    pub fn get_test_domains(&self, category: &str) -> BTreeSet<String> {
        self.test_entries
            .iter()
            .filter(|entry| entry.category.as_deref() == Some(category))
            .filter_map(|entry| entry.domain.clone())
            .collect()
    }

    pub fn to_absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn registry_info(&self) -> RegistryInfo {
        RegistryInfo {
            root_dir: self.root.display().to_string(),
            registry_version: self.registry_version.clone(),
            domains_available: self.domains.len(),
            total_ontologies: self.get_all_ontology_paths().len(),
            total_shape_files: self.get_all_shape_paths().len(),
            base_schemas: self.base_schemas.len(),
            fixture_mappings: self.fixtures.len(),
            context_mappings: self.contexts.len(),
            test_entries: self.test_entries.len(),
            warnings: self.warnings.clone(),
        }
    }
}

fn read_registry(path: &Path) -> Result<RegistryDocument, RegistryError> {
    let contents = fs::read_to_string(path).map_err(|source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| RegistryError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, contents: &str) -> anyhow::Result<()> {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
        Ok(())
    }

    fn registry_fixture() -> anyhow::Result<TempDir> {
        let dir = TempDir::new()?;
        write(
            dir.path(),
            "docs/registry.json",
            r#"{
                "version": "1.0",
                "ontologies": {
                    "scenario": {
                        "namespace": "http://ex.org/scenario/v5/",
                        "iri": "http://ex.org/scenario/v5",
                        "latest": "v5",
                        "versions": {
                            "v5": {"files": {
                                "ontology": "artifacts/scenario/scenario.owl.ttl",
                                "shacl": ["artifacts/scenario/scenario.shacl.ttl", "artifacts/scenario/extra.shacl.ttl"],
                                "jsonld": "artifacts/scenario/scenario.context.jsonld"
                            }}
                        }
                    },
                    "scenario-ext": {
                        "iri": "http://ex.org/scenario/v5/ext",
                        "latest": "v1",
                        "versions": {"v1": {"files": {"shacl": "artifacts/scenario-ext/ext.shacl.ttl"}}}
                    },
                    "broken": {"iri": "http://ex.org/broken", "latest": "v2", "versions": {"v1": {"files": {}}}}
                },
                "base_ontologies": ["imports/rdfs/rdfs.ttl", "imports/missing/missing.ttl"]
            }"#,
        )?;
        write(dir.path(), "imports/rdfs/rdfs.ttl", "")?;
        Ok(dir)
    }

    #[test]
    fn missing_sources_yield_empty_mappings() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let resolver = RegistryResolver::new(dir.path());
        assert!(resolver.list_domains().is_empty());
        assert!(resolver.get_base_schema_paths().is_empty());
        assert_eq!(resolver.resolve_type_to_domain("http://ex.org/A"), None);
        assert_eq!(resolver.resolve_fixture("did:web:example"), None);
        assert!(!resolver.warnings().is_empty());
        Ok(())
    }

    #[test]
    fn malformed_registry_is_a_warning() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(dir.path(), "docs/registry.json", "{ not json")?;
        let resolver = RegistryResolver::new(dir.path());
        assert!(resolver.list_domains().is_empty());
        assert!(resolver.warnings().iter().any(|w| w.contains("malformed registry")));
        Ok(())
    }

    #[test]
    fn resolves_artifacts_through_latest_pointer() -> anyhow::Result<()> {
        let dir = registry_fixture()?;
        let resolver = RegistryResolver::new(dir.path());

        assert_eq!(
            resolver.get_ontology_path("scenario"),
            Some(Path::new("artifacts/scenario/scenario.owl.ttl"))
        );
        assert_eq!(resolver.get_shape_paths("scenario").len(), 2);
        assert_eq!(
            resolver.get_context_path("scenario"),
            Some(Path::new("artifacts/scenario/scenario.context.jsonld"))
        );
        assert_eq!(resolver.get_canonical_iri("scenario"), Some("http://ex.org/scenario/v5"));
        assert_eq!(resolver.get_ontology_path("unknown"), None);
        assert!(resolver.get_shape_paths("unknown").is_empty());
        Ok(())
    }

    #[test]
    fn dangling_latest_pointer_has_no_artifacts() -> anyhow::Result<()> {
        let dir = registry_fixture()?;
        let resolver = RegistryResolver::new(dir.path());
        assert!(resolver.list_domains().contains("broken"));
        assert_eq!(resolver.get_ontology_path("broken"), None);
        assert!(resolver.warnings().iter().any(|w| w.contains("'broken'")));
        Ok(())
    }

    #[test]
    fn type_resolution_respects_boundaries() -> anyhow::Result<()> {
        let dir = registry_fixture()?;
        let resolver = RegistryResolver::new(dir.path());

        assert_eq!(resolver.resolve_type_to_domain("http://ex.org/scenario/v5/Foo"), Some("scenario"));
        assert_eq!(resolver.resolve_type_to_domain("http://ex.org/scenario/v5#Foo"), Some("scenario"));
        assert_eq!(resolver.resolve_type_to_domain("http://ex.org/scenario/v5/"), Some("scenario"));
        assert_eq!(resolver.resolve_type_to_domain("http://ex.org/scenario/v55/Foo"), None);
        assert_eq!(
            resolver.resolve_type_to_domain("http://ex.org/scenario/v5/ext/Thing"),
            Some("scenario-ext")
        );
        Ok(())
    }

    #[test]
    fn base_schemas_are_filtered_to_existing_files() -> anyhow::Result<()> {
        let dir = registry_fixture()?;
        let resolver = RegistryResolver::new(dir.path());
        assert_eq!(
            resolver.get_base_schema_paths(),
            vec![PathBuf::from("imports/rdfs/rdfs.ttl")]
        );
        Ok(())
    }

    #[test]
    fn catalogs_fill_domains_fixtures_and_contexts() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(
            dir.path(),
            "artifacts/catalog-v001.xml",
            r#"<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog">
                <uri name="http://ex.org/hdmap/v6/" uri="hdmap/hdmap.owl.ttl"/>
                <uri name="http://ex.org/hdmap/v6/shapes" uri="hdmap/hdmap.shacl.ttl"/>
                <uri name="http://ex.org/hdmap/v6/context" uri="hdmap/hdmap.context.jsonld"/>
            </catalog>"#,
        )?;
        write(
            dir.path(),
            "imports/catalog-v001.xml",
            r#"<catalog>
                <uri name="http://schema.org/" uri="schema/schema.ttl"/>
                <uri name="https://www.w3.org/2018/credentials/v1" uri="cred/cred.context.jsonld"/>
            </catalog>"#,
        )?;
        write(dir.path(), "imports/schema/schema.ttl", "")?;
        write(
            dir.path(),
            "tests/catalog-v001.xml",
            r#"<catalog>
                <uri name="did:web:example:Org" uri="tests/fixtures/org.json" category="fixture"/>
                <uri name="urn:t:1" uri="tests/data/hdmap/valid/one.json" domain="hdmap" test-type="valid" category="test-data"/>
                <uri name="urn:t:2" uri="tests/data/hdmap/invalid/two.json" domain="hdmap" test-type="invalid" category="test-data"/>
            </catalog>"#,
        )?;
        write(dir.path(), "tests/data/hdmap/valid/one.json", "{}")?;
        write(dir.path(), "tests/data/hdmap/invalid/two.json", "{}")?;

        let resolver = RegistryResolver::new(dir.path());

        assert_eq!(resolver.list_domains().into_iter().collect::<Vec<_>>(), vec!["hdmap"]);
        assert_eq!(resolver.resolve_type_to_domain("http://ex.org/hdmap/v6/Road"), Some("hdmap"));
        assert_eq!(
            resolver.get_shape_paths("hdmap"),
            vec![PathBuf::from("artifacts/hdmap/hdmap.shacl.ttl")]
        );
        assert_eq!(
            resolver.resolve_fixture("did:web:example:Org"),
            Some(Path::new("tests/fixtures/org.json"))
        );
        assert_eq!(
            resolver.resolve_context("https://www.w3.org/2018/credentials/v1"),
            Some(Path::new("imports/cred/cred.context.jsonld"))
        );

        let used: BTreeSet<String> = ["https://schema.org/name".to_string()].into();
        assert_eq!(
            resolver.get_base_schema_paths_for(&used),
            vec![PathBuf::from("imports/schema/schema.ttl")]
        );
        let unrelated: BTreeSet<String> = ["http://other.org/x".to_string()].into();
        assert!(resolver.get_base_schema_paths_for(&unrelated).is_empty());

        assert_eq!(resolver.get_test_files("hdmap", None, TEST_DATA_CATEGORY).len(), 2);
        assert_eq!(resolver.get_test_files("hdmap", Some("valid"), TEST_DATA_CATEGORY).len(), 1);
        assert!(resolver.get_test_domains(TEST_DATA_CATEGORY).contains("hdmap"));

        let info = resolver.registry_info();
        assert_eq!(info.fixture_mappings, 1);
        assert_eq!(info.domains_available, 1);
        Ok(())
    }
}
