//! Schema discovery: from observed types to the schema files that govern them.

use crate::registry::RegistryResolver;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::debug;

/// How many of the observed types were mapped to a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaCoverage {
    /// Every observed type resolved
    Complete,
    /// Some types resolved, some did not
    Partial,
    /// No type resolved to a domain
    Unresolved,
    /// The data declared no types at all
    Untyped,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveredSchemas {
    /// Domain ontologies plus base schemas, sorted and deduplicated
    pub ontology_paths: Vec<PathBuf>,
    /// Shape files of every resolved domain, sorted and deduplicated
    pub shape_paths: Vec<PathBuf>,
    pub domains: BTreeSet<String>,
    pub unresolved_types: BTreeSet<String>,
}

impl DiscoveredSchemas {
    pub fn coverage(&self) -> SchemaCoverage {
        match (self.domains.is_empty(), self.unresolved_types.is_empty()) {
            (true, true) => SchemaCoverage::Untyped,
            (true, false) => SchemaCoverage::Unresolved,
            (false, true) => SchemaCoverage::Complete,
            (false, false) => SchemaCoverage::Partial,
        }
    }
}

pub struct SchemaDiscovery<'a> {
    resolver: &'a RegistryResolver,
}

impl<'a> SchemaDiscovery<'a> {
    pub fn new(resolver: &'a RegistryResolver) -> Self {
        Self { resolver }
    }

    /// Resolves each type to its domain and collects that domain's ontology
    /// and shapes once. Base schemas are always included.
    pub fn discover(&self, observed_types: &BTreeSet<String>) -> DiscoveredSchemas {
        let mut ontologies = BTreeSet::new();
        let mut shapes = BTreeSet::new();
        let mut domains = BTreeSet::new();
        let mut unresolved = BTreeSet::new();

        for type_iri in observed_types {
            let Some(domain) = self.resolver.resolve_type_to_domain(type_iri) else {
                unresolved.insert(type_iri.clone());
                continue;
            };
            if !domains.insert(domain.to_string()) {
                continue;
            }
            if let Some(ontology) = self.resolver.get_ontology_path(domain) {
                ontologies.insert(ontology.to_path_buf());
            }
            shapes.extend(self.resolver.get_shape_paths(domain));
            debug!(domain, type_iri = %type_iri, "discovered schema domain");
        }

        ontologies.extend(self.resolver.get_base_schema_paths());

        DiscoveredSchemas {
            ontology_paths: ontologies.into_iter().collect(),
            shape_paths: shapes.into_iter().collect(),
            domains,
            unresolved_types: unresolved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn resolver_with_two_domains() -> anyhow::Result<(TempDir, RegistryResolver)> {
        let dir = TempDir::new()?;
        fs::create_dir_all(dir.path().join("docs"))?;
        fs::write(
            dir.path().join("docs/registry.json"),
            r#"{"ontologies": {
                "org": {"iri": "http://ex.org/org", "latest": "v1",
                        "versions": {"v1": {"files": {"ontology": "artifacts/org/org.owl.ttl",
                                                       "shacl": ["artifacts/org/org.shacl.ttl", "artifacts/org/extra.shacl.ttl"]}}}},
                "geo": {"iri": "http://ex.org/geo", "latest": "v1",
                        "versions": {"v1": {"files": {"ontology": "artifacts/geo/geo.owl.ttl",
                                                       "shacl": "artifacts/geo/geo.shacl.ttl"}}}}
            }}"#,
        )?;
        let resolver = RegistryResolver::new(dir.path());
        Ok((dir, resolver))
    }

    #[test]
    fn only_resolved_domains_contribute() -> anyhow::Result<()> {
        let (_dir, resolver) = resolver_with_two_domains()?;
        let types: BTreeSet<String> = [
            "http://ex.org/org/Organization".to_string(),
            "http://ex.org/org/Person".to_string(),
            "http://elsewhere.org/Thing".to_string(),
        ]
        .into();

        let found = SchemaDiscovery::new(&resolver).discover(&types);
        assert_eq!(found.ontology_paths, vec![PathBuf::from("artifacts/org/org.owl.ttl")]);
        assert_eq!(
            found.shape_paths,
            vec![
                PathBuf::from("artifacts/org/extra.shacl.ttl"),
                PathBuf::from("artifacts/org/org.shacl.ttl"),
            ]
        );
        assert_eq!(found.domains.len(), 1);
        assert!(found.unresolved_types.contains("http://elsewhere.org/Thing"));
        assert_eq!(found.coverage(), SchemaCoverage::Partial);
        Ok(())
    }

    #[test]
    fn no_types_is_not_an_error() -> anyhow::Result<()> {
        let (_dir, resolver) = resolver_with_two_domains()?;
        let found = SchemaDiscovery::new(&resolver).discover(&BTreeSet::new());
        assert!(found.shape_paths.is_empty());
        assert!(found.ontology_paths.is_empty());
        assert_eq!(found.coverage(), SchemaCoverage::Untyped);
        Ok(())
    }
}
