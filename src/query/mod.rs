//! Query interpretation: anchors, candidates, and candidate resolution.
//!
//! A query is an ordered list of already-tokenized terms. Every unigram and
//! every adjacent bigram becomes an [`Anchor`]; the [`CandidateResolver`]
//! then proposes graph elements each anchor could refer to.

pub mod candidate;
pub mod resolver;

use serde::Serialize;

pub use candidate::{Candidate, MatchKind};
pub use resolver::{CandidateResolver, ResolvedAnchor, ResolverConfig, SkippedPass};

/// A contiguous span of query terms considered as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Anchor {
    /// Span text; bigram words are joined with `_`.
    pub text: String,
    pub words: Vec<String>,
    /// Unigram `i` sits at `2i`, the bigram starting at `i` at `2i + 1`.
    pub index: usize,
    pub cardinality: usize,
}

impl Anchor {
    fn unigram(term: &str, position: usize) -> Self {
        Self {
            text: term.to_string(),
            words: vec![term.to_string()],
            index: 2 * position,
            cardinality: 1,
        }
    }

    fn bigram(first: &str, second: &str, position: usize) -> Self {
        Self {
            text: format!("{first}_{second}"),
            words: vec![first.to_string(), second.to_string()],
            index: 2 * position + 1,
            cardinality: 2,
        }
    }

    pub fn is_unigram(&self) -> bool {
        self.cardinality == 1
    }
}

impl std::fmt::Display for Anchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}. {}", self.index, self.text)
    }
}

/// All unigram and bigram anchors of `terms`, in left-to-right order.
pub fn generate_anchors<S: AsRef<str>>(terms: &[S]) -> Vec<Anchor> {
    let mut anchors = Vec::with_capacity(terms.len() * 2);
    for (i, term) in terms.iter().enumerate() {
        anchors.push(Anchor::unigram(term.as_ref(), i));
        if let Some(next) = terms.get(i + 1) {
            anchors.push(Anchor::bigram(term.as_ref(), next.as_ref(), i));
        }
    }
    anchors
}
