#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use ontology_conformance::{InferenceMode, ValidatorConfig};
use tempfile::TempDir;

pub const REGISTRY: &str = r#"{
    "version": "1.0",
    "ontologies": {
        "example": {
            "namespace": "http://example.org/",
            "iri": "http://example.org",
            "latest": "v1",
            "versions": {"v1": {"files": {
                "ontology": "artifacts/example/example.owl.ttl",
                "shacl": "artifacts/example/example.shacl.ttl"
            }}}
        },
        "geo": {
            "iri": "http://geo.example.net/ont",
            "latest": "v2",
            "versions": {"v2": {"files": {
                "ontology": "artifacts/geo/geo.owl.ttl",
                "shacl": ["artifacts/geo/geo.shacl.ttl"]
            }}}
        },
        "loose": {
            "iri": "http://loose.example.net/ont",
            "latest": "v1",
            "versions": {"v1": {"files": {"ontology": "artifacts/loose/loose.owl.ttl"}}}
        }
    },
    "base_ontologies": []
}"#;

pub const EXAMPLE_ONTOLOGY: &str = r#"
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix ex: <http://example.org/> .

<http://example.org> a owl:Ontology .
ex:Organization a owl:Class .
ex:Company a owl:Class ; rdfs:subClassOf ex:Organization .
ex:employs rdfs:domain ex:Organization .
"#;

pub const EXAMPLE_SHAPES: &str = r#"
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
@prefix ex: <http://example.org/> .

ex:OrganizationShape a sh:NodeShape ;
    sh:targetClass ex:Organization ;
    sh:property [
        sh:path ex:name ;
        sh:minCount 1 ;
        sh:datatype xsd:string ;
    ] .
"#;

pub const GEO_ONTOLOGY: &str = r#"
@prefix owl: <http://www.w3.org/2002/07/owl#> .
<http://geo.example.net/ont/Place> a owl:Class .
"#;

pub const GEO_SHAPES: &str = r#"
@prefix sh: <http://www.w3.org/ns/shacl#> .
<http://geo.example.net/ont/PlaceShape> a sh:NodeShape ;
    sh:targetClass <http://geo.example.net/ont/Place> ;
    sh:property [ sh:path <http://geo.example.net/ont/lat> ; sh:minCount 1 ] .
"#;

pub const LOOSE_ONTOLOGY: &str = r#"
@prefix owl: <http://www.w3.org/2002/07/owl#> .
<http://loose.example.net/ont/Thing> a owl:Class .
"#;

pub const FIXTURE_CATALOG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog">
    <uri name="did:web:example:Org" uri="tests/fixtures/org.jsonld" category="fixture"/>
</catalog>"#;

/// A throwaway repository with a registry, schema artifacts and a fixture catalog.
pub struct Repository {
    dir: TempDir,
}

impl Repository {
    pub fn new() -> Result<Self> {
        let repository = Self {
            dir: TempDir::new()?,
        };
        repository.write("docs/registry.json", REGISTRY)?;
        repository.write("artifacts/example/example.owl.ttl", EXAMPLE_ONTOLOGY)?;
        repository.write("artifacts/example/example.shacl.ttl", EXAMPLE_SHAPES)?;
        repository.write("artifacts/geo/geo.owl.ttl", GEO_ONTOLOGY)?;
        repository.write("artifacts/geo/geo.shacl.ttl", GEO_SHAPES)?;
        repository.write("artifacts/loose/loose.owl.ttl", LOOSE_ONTOLOGY)?;
        repository.write("tests/catalog-v001.xml", FIXTURE_CATALOG)?;
        Ok(repository)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn config(&self) -> ValidatorConfig {
        ValidatorConfig::new(self.root())
    }

    pub fn config_with(&self, mode: InferenceMode) -> ValidatorConfig {
        self.config().with_inference_mode(mode)
    }
}

/// A JSON-LD organization document with an inline context.
pub fn organization(id: &str, class: &str, name: Option<&str>) -> String {
    let mut node = serde_json::json!({
        "@context": {
            "ex": "http://example.org/",
            "name": "http://example.org/name",
            "partner": {"@id": "http://example.org/partner", "@type": "@id"}
        },
        "@id": id,
        "@type": format!("http://example.org/{class}"),
    });
    if let Some(name) = name {
        node["name"] = serde_json::Value::String(name.to_string());
    }
    node.to_string()
}
