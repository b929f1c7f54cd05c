//! Concatenation of several synonym sources.

use super::{SynonymIter, SynonymSource};
use crate::error::BackendError;

/// Runs each registered source in order and chains their sequences.
///
/// A source that fails to start is logged and skipped; the others still
/// contribute.
#[derive(Default)]
pub struct Thesaurus {
    sources: Vec<Box<dyn SynonymSource>>,
}

impl Thesaurus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: impl SynonymSource + 'static) -> Self {
        self.push(Box::new(source));
        self
    }

    pub fn push(&mut self, source: Box<dyn SynonymSource>) {
        self.sources.push(source);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}

impl SynonymSource for Thesaurus {
    fn name(&self) -> &str {
        "thesaurus"
    }

    fn generate<'a>(&'a self, seed: &str) -> Result<SynonymIter<'a>, BackendError> {
        let seed = seed.to_string();
        Ok(Box::new(self.sources.iter().flat_map(move |source| {
            match source.generate(&seed) {
                Ok(synonyms) => synonyms,
                Err(e) => {
                    tracing::warn!(source = source.name(), error = %e, "synonym source failed, skipping");
                    Box::new(std::iter::empty())
                }
            }
        })))
    }
}
