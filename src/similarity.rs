//! Similarity matchers: per-leaf fuzzy lookups against curated reference values.
//!
//! A [`SimilarityMatcher`] is attached to a leaf node at schema-build time and
//! proposes the canonical value closest to a query term. The graph only
//! accepts the proposal if it is also one of the leaf's lexicon values.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::error::{BackendError, SchemaError};
use crate::graph::lexicon::{levenshtein, normalize};

/// Opaque per-leaf capability returning the best reference value for a term.
pub trait SimilarityMatcher: Send + Sync + fmt::Debug {
    /// Short backend name used in logs and skipped-pass reports.
    fn name(&self) -> &str;

    /// Best reference value for `term`, or `None` if nothing is close enough.
    fn find_best_match(&self, term: &str) -> Result<Option<String>, BackendError>;
}

/// Schema-level configuration of a [`HybridJaccard`] matcher.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatcherSpec {
    /// Minimum set score for a reference value to be proposed.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Minimum per-token similarity for two tokens to count as shared.
    #[serde(default = "default_token_threshold")]
    pub token_threshold: f64,
    /// Canonical value → known aliases.
    pub references: BTreeMap<String, Vec<String>>,
}

fn default_threshold() -> f64 {
    0.5
}

fn default_token_threshold() -> f64 {
    0.75
}

/// Token-set Jaccard similarity with soft token equality.
///
/// Two tokens are considered shared when their normalised edit similarity
/// (`1 - distance / longest`) reaches `token_threshold`; shared tokens
/// contribute their similarity instead of a flat 1 to the intersection.
#[derive(Debug, Clone)]
pub struct HybridJaccard {
    threshold: f64,
    token_threshold: f64,
    /// (canonical, [canonical, aliases...]) with every string normalised.
    references: Vec<(String, Vec<String>)>,
}

impl HybridJaccard {
    /// Build a matcher for the leaf `node_id` from its schema spec.
    pub fn from_spec(node_id: &str, spec: &MatcherSpec) -> Result<Self, SchemaError> {
        let invalid = |message: &str| SchemaError::InvalidMatcher {
            id: node_id.to_string(),
            message: message.to_string(),
        };
        if !(spec.threshold > 0.0 && spec.threshold <= 1.0) {
            return Err(invalid("threshold out of range"));
        }
        if !(spec.token_threshold > 0.0 && spec.token_threshold <= 1.0) {
            return Err(invalid("token_threshold out of range"));
        }
        if spec.references.is_empty() {
            return Err(invalid("no reference values"));
        }

        let references = spec
            .references
            .iter()
            .map(|(canonical, aliases)| {
                let canonical = normalize(canonical);
                let mut forms = vec![canonical.clone()];
                forms.extend(aliases.iter().map(|a| normalize(a)));
                (canonical, forms)
            })
            .collect();

        Ok(Self {
            threshold: spec.threshold,
            token_threshold: spec.token_threshold,
            references,
        })
    }

    fn token_similarity(a: &str, b: &str) -> f64 {
        let longest = a.chars().count().max(b.chars().count());
        if longest == 0 {
            return 1.0;
        }
        1.0 - levenshtein(a, b) as f64 / longest as f64
    }

    /// Score two strings; 1.0 means identical token sets.
    pub fn score(&self, a: &str, b: &str) -> f64 {
        let a: Vec<&str> = a.split_whitespace().collect();
        let b: Vec<&str> = b.split_whitespace().collect();
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        let mut used = vec![false; b.len()];
        let mut shared = 0usize;
        let mut weight = 0.0;
        for ta in &a {
            let best = b
                .iter()
                .enumerate()
                .filter(|(j, _)| !used[*j])
                .map(|(j, tb)| (j, Self::token_similarity(ta, tb)))
                .filter(|(_, sim)| *sim >= self.token_threshold)
                .max_by(|x, y| x.1.total_cmp(&y.1));
            if let Some((j, sim)) = best {
                used[j] = true;
                shared += 1;
                weight += sim;
            }
        }

        weight / (a.len() + b.len() - shared) as f64
    }
}

impl SimilarityMatcher for HybridJaccard {
    fn name(&self) -> &str {
        "hybrid-jaccard"
    }

    fn find_best_match(&self, term: &str) -> Result<Option<String>, BackendError> {
        let term = normalize(term);
        let mut best: Option<(&str, f64)> = None;
        for (canonical, forms) in &self.references {
            let score = forms
                .iter()
                .map(|form| self.score(&term, form))
                .fold(0.0, f64::max);
            if score >= self.threshold && best.is_none_or(|(_, s)| score > s) {
                best = Some((canonical, score));
            }
        }
        Ok(best.map(|(canonical, _)| canonical.to_string()))
    }
}
