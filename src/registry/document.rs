//! Serde model of the registry document (`docs/registry.json`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub ontologies: BTreeMap<String, DomainEntry>,
    #[serde(default)]
    pub base_ontologies: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainEntry {
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub iri: Option<String>,
    #[serde(default)]
    pub latest: Option<String>,
    #[serde(default)]
    pub versions: BTreeMap<String, VersionEntry>,
}

impl DomainEntry {
    /// The version entry the `latest` pointer names, if both exist.
    pub fn latest_version(&self) -> Option<&VersionEntry> {
        self.latest.as_ref().and_then(|tag| self.versions.get(tag))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionEntry {
    #[serde(default)]
    pub files: VersionFiles,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionFiles {
    #[serde(default)]
    pub ontology: Option<String>,
    #[serde(default)]
    pub shacl: Option<OneOrMany>,
    #[serde(default)]
    pub jsonld: Option<String>,
    #[serde(default)]
    pub instance: Option<String>,
}

impl VersionFiles {
    pub fn shape_files(&self) -> Vec<String> {
        match &self.shacl {
            Some(OneOrMany::One(path)) => vec![path.clone()],
            Some(OneOrMany::Many(paths)) => paths.clone(),
            None => Vec::new(),
        }
    }
}

/// Shape files may be listed as a single path or as an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}
