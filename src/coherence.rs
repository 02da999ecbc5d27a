//! Checks that every class a domain's shapes target is declared somewhere.
//!
//! Classes are compared by lowercased local name, so a shape targeting
//! `https://ex.org/org#Organization` is satisfied by an ontology declaring
//! `http://ex.org/org/Organization`. A class may also be matched through its
//! `rdfs:label`.

use crate::error::{GraphError, ReturnCode};
use crate::graph::vocab::{owl, rdfs, sh};
use crate::graph::{GraphLoader, RdfGraph, display_path};
use crate::iri;
use crate::registry::RegistryResolver;
use crate::validator::ValidationResult;
use oxigraph::model::{NamedOrBlankNode, Term};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Class names an ontology and its base schemas declare.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredClasses {
    /// Lowercased local names of `owl:Class` and `rdfs:Class` instances
    pub names: BTreeSet<String>,
    /// Lowercased `rdfs:label` values of those classes
    pub labels: BTreeSet<String>,
}

impl DeclaredClasses {
    pub fn from_graph(graph: &RdfGraph) -> Result<Self, GraphError> {
        let mut declared = Self::default();
        declared.add_graph(graph)?;
        Ok(declared)
    }

    pub fn add_graph(&mut self, graph: &RdfGraph) -> Result<(), GraphError> {
        for class_type in [owl::CLASS, rdfs::CLASS] {
            for class in graph.instances_of(class_type)? {
                let NamedOrBlankNode::NamedNode(node) = &class else {
                    continue;
                };
                self.names.insert(iri::local_name(node.as_str()).to_lowercase());
                for label in graph.objects(class.as_ref(), rdfs::LABEL)? {
                    if let Term::Literal(literal) = label {
                        self.labels.insert(literal.value().to_lowercase());
                    }
                }
            }
        }
        Ok(())
    }

    pub fn declares(&self, class_iri: &str) -> bool {
        let local = iri::local_name(class_iri).to_lowercase();
        self.names.contains(&local) || self.labels.contains(&local)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// IRIs named by `sh:targetClass` in a shapes graph.
fn target_classes(graph: &RdfGraph) -> Result<BTreeSet<String>, GraphError> {
    Ok(graph
        .triples_matching(None, Some(sh::TARGET_CLASS), None)?
        .into_iter()
        .filter_map(|triple| match triple.object {
            Term::NamedNode(node) => Some(node.into_string()),
            _ => None,
        })
        .collect())
}

pub struct CoherenceChecker {
    resolver: Arc<RegistryResolver>,
    loader: GraphLoader,
}

impl CoherenceChecker {
    pub fn new(resolver: Arc<RegistryResolver>) -> Self {
        let loader = GraphLoader::new(resolver.root()).with_resolver(Arc::clone(&resolver));
        Self { resolver, loader }
    }

    fn display(&self, path: &Path) -> String {
        display_path(&self.resolver.to_absolute(path), self.resolver.root())
    }

    /// Classes declared by every readable base schema. Unreadable or
    /// unparsable base schemas are skipped.
    fn base_classes(&self, warnings: &mut Vec<String>) -> DeclaredClasses {
        let mut declared = DeclaredClasses::default();
        for path in self.resolver.get_base_schema_paths() {
            let absolute = self.resolver.to_absolute(&path);
            let loaded = self
                .loader
                .load_document(&absolute)
                .and_then(|(graph, _)| declared.add_graph(&graph));
            if let Err(e) = loaded {
                debug!(file = %self.display(&path), error = %e, "skipping base schema");
                warnings.push(format!("base schema skipped: {e}"));
            }
        }
        declared
    }

    /// Checks one domain's shape targets against its ontology and the base
    /// schemas.
    pub fn check_domain(&self, domain: &str) -> ValidationResult {
        let started = Instant::now();
        let mut warnings = Vec::new();

        if self.resolver.domain(domain).is_none() {
            let message = format!("Unknown domain: {domain}");
            let mut result = ValidationResult::new(ReturnCode::GeneralError, message.clone(), Vec::new());
            result.errors.push(message);
            return result.finish(started);
        }

        let ontology_path = self
            .resolver
            .get_ontology_path(domain)
            .filter(|path| self.resolver.to_absolute(path).is_file())
            .map(Path::to_path_buf);
        let shape_paths: Vec<_> = self
            .resolver
            .get_shape_paths(domain)
            .into_iter()
            .filter(|path| self.resolver.to_absolute(path).is_file())
            .collect();

        let Some(ontology_path) = ontology_path.filter(|_| !shape_paths.is_empty()) else {
            let message = format!(
                "Skipping target class validation for '{domain}': ontology or shapes file not found"
            );
            warn!(domain, "ontology or shapes missing, skipping coherence check");
            let mut result = ValidationResult::new(ReturnCode::SyntaxError, message.clone(), Vec::new());
            result.domains.insert(domain.to_string());
            result.warnings.push(message);
            return result.finish(started);
        };

        let mut declared = self.base_classes(&mut warnings);
        let ontology_display = self.display(&ontology_path);
        let ontology = self
            .loader
            .load_document(&self.resolver.to_absolute(&ontology_path))
            .and_then(|(graph, _)| declared.add_graph(&graph));
        if let Err(e) = ontology {
            let message = e.to_string();
            let mut result = ValidationResult::new(e.return_code(), message.clone(), Vec::new());
            result.domains.insert(domain.to_string());
            result.errors.push(message);
            return result.finish(started);
        }

        let mut missing: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut shape_files = Vec::with_capacity(shape_paths.len());
        let mut errors = Vec::new();
        let mut parse_failure = None;
        for path in &shape_paths {
            let display = self.display(path);
            let targets = self
                .loader
                .load_document(&self.resolver.to_absolute(path))
                .and_then(|(graph, _)| target_classes(&graph));
            match targets {
                Ok(targets) => {
                    for target in targets.into_iter().filter(|target| !declared.declares(target)) {
                        missing.entry(target).or_default().insert(display.clone());
                    }
                }
                Err(e) => {
                    parse_failure.get_or_insert(e.return_code());
                    errors.push(e.to_string());
                }
            }
            shape_files.push(display);
        }

        for (target, files) in &missing {
            let files: Vec<&str> = files.iter().map(String::as_str).collect();
            errors.push(format!(
                "Target class {target} ({}) in {} is not declared by {ontology_display} or the base schemas",
                iri::local_name(target),
                files.join(", ")
            ));
        }

        let code = match (parse_failure, missing.is_empty()) {
            (Some(code), _) => code,
            (None, false) => ReturnCode::MissingTargetClass,
            (None, true) => ReturnCode::Success,
        };
        let report_text = if code.is_success() {
            format!(
                "All target classes of '{domain}' are declared ({} classes known).",
                declared.len()
            )
        } else {
            format!("{} problem(s) found for '{domain}':\n{}", errors.len(), errors.join("\n"))
        };
        debug!(domain, classes = declared.len(), missing = missing.len(), "coherence check finished");

        let mut result = ValidationResult::new(code, report_text, shape_files.clone());
        result.domains.insert(domain.to_string());
        result.ontology_files = vec![ontology_display];
        result.shape_files = shape_files;
        result.warnings = warnings;
        result.errors = errors;
        result.finish(started)
    }

    /// Checks several domains and folds the results. The highest code wins.
    pub fn check_domains<S: AsRef<str>>(&self, domains: &[S]) -> ValidationResult {
        let started = Instant::now();
        if domains.is_empty() {
            let message = "No domains to check.".to_string();
            let mut result = ValidationResult::new(ReturnCode::GeneralError, message.clone(), Vec::new());
            result.errors.push(message);
            return result.finish(started);
        }

        let results: Vec<ValidationResult> = domains
            .iter()
            .map(|domain| self.check_domain(domain.as_ref()))
            .collect();
        let code = results
            .iter()
            .map(ValidationResult::return_code)
            .max_by_key(ReturnCode::code)
            .unwrap_or(ReturnCode::Success);
        let report_text = results
            .iter()
            .map(|result| result.report_text().to_string())
            .collect::<Vec<_>>()
            .join("\n");

        let mut combined = ValidationResult::new(code, report_text, Vec::new());
        for result in results {
            combined.files_validated.extend(result.files_validated);
            combined.ontology_files.extend(result.ontology_files);
            combined.shape_files.extend(result.shape_files);
            combined.domains.extend(result.domains);
            combined.warnings.extend(result.warnings);
            combined.errors.extend(result.errors);
        }
        combined.warnings.sort();
        combined.warnings.dedup();
        combined.finish(started)
    }

    /// Checks every registered domain.
    pub fn check_all(&self) -> ValidationResult {
        let domains: Vec<String> = self.resolver.list_domains().into_iter().collect();
        self.check_domains(&domains)
    }
}
