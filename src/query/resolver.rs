//! Multi-strategy candidate resolution.
//!
//! Each anchor is resolved independently with up to four passes, appended in
//! this order: direct, edit-distance, similarity, synonym. A pass that fails
//! because an external backend is down or slow is recorded as skipped and
//! logged; the other passes still contribute.

use std::sync::Arc;
use std::time::Duration;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::graph::ontology::GraphResult;
use crate::graph::{Matchable, OntologyGraph, Referent};
use crate::synonym::{collect_bounded, SynonymSource};

use super::candidate::{Candidate, MatchKind};
use super::Anchor;

/// Upper bound accepted for [`ResolverConfig::max_synonyms`].
pub const MAX_SYNONYMS_CEILING: usize = 4096;

/// Tuning knobs for candidate resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Largest edit distance reported by the edit-distance pass.
    pub edit_distance_max: usize,
    /// Distances at or below this are not reported (0 skips exact matches).
    pub edit_distance_exclude: Option<usize>,
    /// Run the edit-distance pass on bigrams too.
    pub edit_distance_all_cardinalities: bool,
    /// Accept a similarity proposal identical to the anchor text.
    pub similarity_allow_exact: bool,
    /// Synonyms consumed per anchor.
    pub max_synonyms: usize,
    /// Wall-clock budget for one synonym request.
    pub backend_timeout_ms: u64,
    /// Resolve anchors on the rayon pool.
    pub parallel: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            edit_distance_max: 1,
            edit_distance_exclude: Some(0),
            edit_distance_all_cardinalities: false,
            similarity_allow_exact: false,
            max_synonyms: 64,
            backend_timeout_ms: 2000,
            parallel: true,
        }
    }
}

impl ResolverConfig {
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_timeout_ms)
    }
}

/// A pass abandoned because of a backend failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedPass {
    pub pass: MatchKind,
    pub error: String,
}

/// An anchor together with everything proposed for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedAnchor {
    pub anchor: Anchor,
    pub candidates: Vec<Candidate>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedPass>,
}

impl ResolvedAnchor {
    pub fn of_kind(&self, kind: MatchKind) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter().filter(move |c| c.kind == kind)
    }
}

/// Distinct referents across all resolved anchors, in first-seen order.
pub fn terminals(resolved: &[ResolvedAnchor]) -> Vec<Referent> {
    let mut out: Vec<Referent> = Vec::new();
    for candidate in resolved.iter().flat_map(|r| &r.candidates) {
        if !out.contains(&candidate.referent) {
            out.push(candidate.referent.clone());
        }
    }
    out
}

/// Proposes graph elements for query anchors.
pub struct CandidateResolver<'g> {
    graph: &'g OntologyGraph,
    synonyms: Option<Arc<dyn SynonymSource>>,
    config: ResolverConfig,
}

impl<'g> CandidateResolver<'g> {
    pub fn new(graph: &'g OntologyGraph) -> Self {
        Self {
            graph,
            synonyms: None,
            config: ResolverConfig::default(),
        }
    }

    pub fn with_synonyms(mut self, source: Arc<dyn SynonymSource>) -> Self {
        self.synonyms = Some(source);
        self
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn graph(&self) -> &'g OntologyGraph {
        self.graph
    }

    /// Resolve every anchor. Output order follows `anchors`.
    pub fn resolve(&self, anchors: &[Anchor]) -> GraphResult<Vec<ResolvedAnchor>> {
        self.graph.ensure_populated()?;
        let resolved = if self.config.parallel {
            anchors.par_iter().map(|a| self.resolve_anchor(a)).collect()
        } else {
            anchors.iter().map(|a| self.resolve_anchor(a)).collect()
        };
        Ok(resolved)
    }

    fn elements(&self) -> impl Iterator<Item = &'g dyn Matchable> {
        let graph: &'g OntologyGraph = self.graph;
        let nodes = graph.nodes().map(|n| n as &dyn Matchable);
        let edges = graph.edges().map(|e| e as &dyn Matchable);
        nodes.chain(edges)
    }

    fn resolve_anchor(&self, anchor: &Anchor) -> ResolvedAnchor {
        let mut candidates = self.direct(&anchor.text);
        let mut skipped = Vec::new();

        if anchor.is_unigram() || self.config.edit_distance_all_cardinalities {
            candidates.extend(self.edit_distance(&anchor.text));
        }

        let mut passes: Vec<(MatchKind, Result<Vec<Candidate>, BackendError>)> = Vec::new();
        if anchor.is_unigram() {
            passes.push((MatchKind::Similarity, self.similarity(&anchor.text)));
        }
        if let Some(source) = &self.synonyms {
            passes.push((MatchKind::Synonym, self.synonym(source, &anchor.text)));
        }

        for (pass, result) in passes {
            match result {
                Ok(found) => candidates.extend(found),
                Err(e) => {
                    tracing::warn!(anchor = %anchor.text, %pass, error = %e, "candidate pass skipped");
                    skipped.push(SkippedPass {
                        pass,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            anchor = %anchor.text,
            candidates = candidates.len(),
            skipped = skipped.len(),
            "anchor resolved"
        );
        ResolvedAnchor {
            anchor: anchor.clone(),
            candidates,
            skipped,
        }
    }

    fn direct(&self, term: &str) -> Vec<Candidate> {
        self.elements()
            .filter(|e| e.exact_match(term))
            .map(|e| Candidate::direct(e.referent()))
            .collect()
    }

    fn edit_distance(&self, term: &str) -> Vec<Candidate> {
        let (max, exclude) = (
            self.config.edit_distance_max,
            self.config.edit_distance_exclude,
        );
        self.elements()
            .filter_map(|e| {
                let (value, distance) = e.fuzzy_match(term, max, exclude)?;
                Some(Candidate::edit_distance(e.referent(), value, distance))
            })
            .collect()
    }

    fn similarity(&self, term: &str) -> Result<Vec<Candidate>, BackendError> {
        let mut found = Vec::new();
        for element in self.elements().filter(|e| e.matcher().is_some()) {
            if let Some(value) = element.similarity_match(term, self.config.similarity_allow_exact)? {
                found.push(Candidate::similarity(element.referent(), value));
            }
        }
        Ok(found)
    }

    fn synonym(
        &self,
        source: &Arc<dyn SynonymSource>,
        term: &str,
    ) -> Result<Vec<Candidate>, BackendError> {
        let synonyms = collect_bounded(
            Arc::clone(source),
            term,
            self.config.max_synonyms,
            self.config.backend_timeout(),
        )?;
        let mut found = Vec::new();
        for synonym in synonyms {
            for element in self.elements().filter(|e| e.exact_match(&synonym.target)) {
                found.push(Candidate::synonym(element.referent(), synonym.clone()));
            }
        }
        Ok(found)
    }
}
