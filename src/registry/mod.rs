//! Registry and catalog resolution.
//!
//! Answers "which files define domain X" and "which domain owns type T"
//! from `docs/registry.json` plus the artifact, imports and test catalogs.

pub mod catalog;
pub mod document;
mod resolver;

pub use catalog::{ArtifactKind, CatalogEntry, CatalogIndex, CatalogLookup};
pub use document::RegistryDocument;
pub use resolver::{
    ARTIFACTS_CATALOG, DocumentLocation, DomainArtifacts, DomainRecord, DomainSource,
    FIXTURE_CATEGORY, IMPORTS_CATALOG, REGISTRY_LOCATION, RegistryInfo, RegistryResolver,
    TESTS_CATALOG, TEST_DATA_CATEGORY, TYPE_RESOLUTION_ORDER, TypeResolution,
};
