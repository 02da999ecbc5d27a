//! Forward-chaining RDFS inference over class and property hierarchies.
//!
//! Rules are SPARQL UPDATE statements run against the working graph:
//!
//! 1. the hierarchy rules (`rdfs:subClassOf`, `rdfs:subPropertyOf`) run in
//!    rounds until a round adds nothing or the round cap is hit;
//! 2. the typing rules (`rdfs:domain`, `rdfs:range`) run once each;
//! 3. when typing added facts, the subclass rule runs again until stable so
//!    those types get their superclasses too.
//!
//! Steps 1 and 3 share one round budget.
//!
//! Only this narrow closure is computed. There is no OWL reasoning.

use crate::error::GraphError;
use crate::graph::RdfGraph;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const DEFAULT_MAX_ROUNDS: usize = 10;

/// A named SPARQL UPDATE rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceRule {
    pub id: &'static str,
    pub update: &'static str,
}

pub const SUBCLASS_RULE: InferenceRule = InferenceRule {
    id: "rdfs9-subclass",
    update: "INSERT { ?x a ?super } WHERE { \
                 ?x a ?class . \
                 ?class <http://www.w3.org/2000/01/rdf-schema#subClassOf> ?super . \
                 FILTER(?class != ?super) \
             }",
};

pub const SUBPROPERTY_RULE: InferenceRule = InferenceRule {
    id: "rdfs7-subproperty",
    update: "INSERT { ?s ?super ?o } WHERE { \
                 ?s ?property ?o . \
                 ?property <http://www.w3.org/2000/01/rdf-schema#subPropertyOf> ?super . \
                 FILTER(?property != ?super) \
             }",
};

pub const DOMAIN_RULE: InferenceRule = InferenceRule {
    id: "rdfs2-domain",
    update: "INSERT { ?s a ?class } WHERE { \
                 ?s ?property ?o . \
                 ?property <http://www.w3.org/2000/01/rdf-schema#domain> ?class . \
             }",
};

pub const RANGE_RULE: InferenceRule = InferenceRule {
    id: "rdfs3-range",
    update: "INSERT { ?o a ?class } WHERE { \
                 ?s ?property ?o . \
                 ?property <http://www.w3.org/2000/01/rdf-schema#range> ?class . \
                 FILTER(!isLiteral(?o)) \
             }",
};

pub const HIERARCHY_RULES: [InferenceRule; 2] = [SUBCLASS_RULE, SUBPROPERTY_RULE];
pub const TYPING_RULES: [InferenceRule; 2] = [DOMAIN_RULE, RANGE_RULE];

#[derive(Debug, Clone, Default, Serialize)]
pub struct InferenceStats {
    pub initial_triples: usize,
    pub inferred_triples: usize,
    /// Rounds executed across both hierarchy phases, including any round
    /// that added nothing
    pub rounds: usize,
    pub reached_fixpoint: bool,
    /// Rules whose execution failed and were skipped
    pub skipped_rules: Vec<String>,
    #[serde(skip)]
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct InferenceOutcome {
    pub graph: RdfGraph,
    pub stats: InferenceStats,
}

impl InferenceOutcome {
    pub fn inferred(&self) -> usize {
        self.stats.inferred_triples
    }
}

#[derive(Debug, Clone)]
pub struct InferenceEngine {
    max_rounds: usize,
}

impl Default for InferenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceEngine {
    pub fn new() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// Computes the closure of `data` and `ontology` in a fresh graph.
    /// Neither input is modified.
    pub fn infer(
        &self,
        data: &RdfGraph,
        ontology: &RdfGraph,
    ) -> Result<InferenceOutcome, GraphError> {
        let graph = RdfGraph::union(&[data, ontology])?;
        let stats = self.materialize(&graph)?;
        Ok(InferenceOutcome { graph, stats })
    }

    /// Adds the closure to `graph` in place.
    pub fn materialize(&self, graph: &RdfGraph) -> Result<InferenceStats, GraphError> {
        let started = Instant::now();
        let mut stats = InferenceStats {
            initial_triples: graph.len()?,
            ..InferenceStats::default()
        };

        stats.reached_fixpoint = self.run_to_fixpoint(graph, &HIERARCHY_RULES, &mut stats)?;

        let before_typing = graph.len()?;
        for rule in &TYPING_RULES {
            apply_rule(graph, rule, &mut stats.skipped_rules);
        }
        let typed = graph.len()? - before_typing;

        if typed > 0 && stats.reached_fixpoint {
            stats.reached_fixpoint = self.run_to_fixpoint(graph, &[SUBCLASS_RULE], &mut stats)?;
        }

        if !stats.reached_fixpoint {
            warn!(
                max_rounds = self.max_rounds,
                "inference stopped at the round cap before reaching a fixpoint"
            );
        }

        stats.inferred_triples = graph.len()? - stats.initial_triples;
        stats.elapsed = started.elapsed();
        debug!(
            inferred = stats.inferred_triples,
            rounds = stats.rounds,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "inference complete"
        );
        Ok(stats)
    }

    /// Runs `rules` in rounds until one adds nothing. Rounds are charged to
    /// `stats.rounds`; returns false when the round cap stopped it first.
    fn run_to_fixpoint(
        &self,
        graph: &RdfGraph,
        rules: &[InferenceRule],
        stats: &mut InferenceStats,
    ) -> Result<bool, GraphError> {
        while stats.rounds < self.max_rounds {
            stats.rounds += 1;
            let before = graph.len()?;
            for rule in rules {
                apply_rule(graph, rule, &mut stats.skipped_rules);
            }
            let added = graph.len()? - before;
            debug!(round = stats.rounds, added, "inference round");
            if added == 0 {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn apply_rule(graph: &RdfGraph, rule: &InferenceRule, skipped: &mut Vec<String>) {
    if let Err(error) = graph.update(rule.update) {
        debug!(rule = rule.id, %error, "inference rule failed, skipping");
        if !skipped.iter().any(|id| id == rule.id) {
            skipped.push(rule.id.to_string());
        }
    }
}
