//! Leaf vocabularies: observed values for data-property leaves.
//!
//! A [`VocabularyStore`] answers one question: given a descriptor, which
//! values were observed for it, most frequent first. [`HistogramStore`] reads
//! precomputed `<descriptor>.json` histograms from a directory and caches them
//! so graphs built for several roots share one load per descriptor.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;

use crate::error::VocabLoadError;

/// Source of ranked leaf values.
pub trait VocabularyStore: Send + Sync {
    /// Values for `descriptor`, ranked by descending observation frequency.
    fn load(&self, descriptor: &str) -> Result<Vec<String>, VocabLoadError>;
}

/// In-memory store, mostly for tests and embedding callers.
#[derive(Debug, Clone, Default)]
pub struct MemoryVocabulary {
    entries: HashMap<String, Vec<String>>,
}

impl MemoryVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `values` (already ranked) under `descriptor`.
    pub fn with(mut self, descriptor: &str, values: &[&str]) -> Self {
        self.insert(descriptor, values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn insert(&mut self, descriptor: &str, values: Vec<String>) {
        self.entries.insert(descriptor.to_string(), values);
    }
}

impl VocabularyStore for MemoryVocabulary {
    fn load(&self, descriptor: &str) -> Result<Vec<String>, VocabLoadError> {
        self.entries
            .get(descriptor)
            .cloned()
            .ok_or_else(|| VocabLoadError::UnknownDescriptor {
                descriptor: descriptor.to_string(),
            })
    }
}

#[derive(Debug, Deserialize)]
struct Histogram {
    histo: HashMap<String, u64>,
}

/// Directory of JSON histograms: `{"histo": {"value": count, ...}}`.
#[derive(Debug)]
pub struct HistogramStore {
    dir: PathBuf,
    cache: DashMap<String, Arc<Vec<String>>>,
}

impl HistogramStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: DashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of descriptors loaded so far.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn read(&self, descriptor: &str) -> Result<Vec<String>, VocabLoadError> {
        let path = self.dir.join(format!("{descriptor}.json"));
        if !path.is_file() {
            return Err(VocabLoadError::UnknownDescriptor {
                descriptor: descriptor.to_string(),
            });
        }
        let content = std::fs::read_to_string(&path).map_err(|e| VocabLoadError::Io {
            descriptor: descriptor.to_string(),
            path: path.display().to_string(),
            source: e,
        })?;
        let histogram: Histogram =
            serde_json::from_str(&content).map_err(|e| VocabLoadError::Malformed {
                descriptor: descriptor.to_string(),
                message: e.to_string(),
            })?;
        Ok(rank(histogram.histo))
    }
}

/// Order values by count, then by value, both descending.
fn rank(histo: HashMap<String, u64>) -> Vec<String> {
    let mut by_count: Vec<(u64, String)> = histo.into_iter().map(|(v, c)| (c, v)).collect();
    by_count.sort_by(|a, b| b.cmp(a));
    by_count.into_iter().map(|(_, v)| v).collect()
}

impl VocabularyStore for HistogramStore {
    fn load(&self, descriptor: &str) -> Result<Vec<String>, VocabLoadError> {
        if let Some(values) = self.cache.get(descriptor) {
            return Ok(values.value().as_ref().clone());
        }
        let values = Arc::new(self.read(descriptor)?);
        tracing::debug!(descriptor, values = values.len(), "loaded leaf vocabulary");
        self.cache.insert(descriptor.to_string(), Arc::clone(&values));
        Ok(values.as_ref().clone())
    }
}
