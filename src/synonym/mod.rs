//! Synonym sources used to expand query anchors.
//!
//! A [`SynonymSource`] turns a seed term into a lazy, unordered sequence of
//! scored [`Synonym`]s. Sources may be slow, remote, or unbounded, so callers
//! consume them through [`collect_bounded`], which caps both the number of
//! items and the wall-clock time spent waiting.

pub mod dictionary;
pub mod embedding;
pub mod http;
pub mod thesaurus;

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::BackendError;
use crate::graph::lexicon::normalize;

pub use dictionary::DictionarySynonyms;
pub use embedding::EmbeddingSynonyms;
pub use http::HttpSynonyms;
pub use thesaurus::Thesaurus;

/// A scored alternative for a seed term.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Synonym {
    pub seed: String,
    pub target: String,
    pub score: f64,
    /// Name of the source that proposed it.
    pub source: String,
}

impl Synonym {
    pub fn new(seed: &str, target: impl Into<String>, score: f64, source: &str) -> Self {
        Self {
            seed: seed.to_string(),
            target: target.into(),
            score,
            source: source.to_string(),
        }
    }
}

impl std::fmt::Display for Synonym {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})={}", self.source, self.seed, self.target)
    }
}

/// Lazy synonym sequence borrowed from its source.
pub type SynonymIter<'a> = Box<dyn Iterator<Item = Synonym> + Send + 'a>;

/// Producer of synonym candidates for a seed term.
pub trait SynonymSource: Send + Sync {
    fn name(&self) -> &str;

    /// Start generating synonyms for `seed`. The sequence may be infinite.
    fn generate<'a>(&'a self, seed: &str) -> Result<SynonymIter<'a>, BackendError>;
}

/// Synonyms buffered between the worker and the caller.
const CHANNEL_BOUND: usize = 64;

/// Drain at most `limit` synonyms for `seed`, giving up after `timeout`.
///
/// Generation runs on its own thread so a stalled backend cannot block the
/// caller past the deadline; a timeout discards what was received and
/// reports [`BackendError::Timeout`]. Synonyms equal to the seed (after
/// normalisation) are dropped. The worker stops pulling from the source once
/// the deadline has passed, even if it has nothing to send.
pub fn collect_bounded(
    source: Arc<dyn SynonymSource>,
    seed: &str,
    limit: usize,
    timeout: Duration,
) -> Result<Vec<Synonym>, BackendError> {
    if limit == 0 {
        return Ok(vec![]);
    }

    let backend = source.name().to_string();
    let deadline = Instant::now() + timeout;
    let (tx, rx) = mpsc::sync_channel::<Result<Synonym, BackendError>>(limit.min(CHANNEL_BOUND));
    let worker_seed = seed.to_string();
    std::thread::Builder::new()
        .name(format!("synonyms-{backend}"))
        .spawn(move || {
            let normalized_seed = normalize(&worker_seed);
            let synonyms = match source.generate(&worker_seed) {
                Ok(synonyms) => synonyms,
                Err(e) => {
                    let _ = tx.send(Err(e));
                    return;
                }
            };
            let mut sent = 0;
            for synonym in synonyms {
                if Instant::now() >= deadline {
                    break;
                }
                if normalize(&synonym.target) == normalized_seed {
                    continue;
                }
                if tx.send(Ok(synonym)).is_err() {
                    break;
                }
                sent += 1;
                if sent == limit {
                    break;
                }
            }
        })
        .map_err(|e| BackendError::Unavailable {
            backend: backend.clone(),
            message: format!("cannot spawn worker: {e}"),
        })?;

    let mut collected = Vec::new();
    while collected.len() < limit {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(Ok(synonym)) => collected.push(synonym),
            Ok(Err(e)) => return Err(e),
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                return Err(BackendError::Timeout {
                    backend,
                    millis: timeout.as_millis() as u64,
                });
            }
        }
    }
    Ok(collected)
}
