//! Distributional synonyms from word vectors.
//!
//! Reads the plain-text word2vec format (`word v1 v2 ...` per line, with an
//! optional `count dims` header). Multi-word seeds are looked up as
//! underscore-joined phrases, the convention phrase models are trained with.

use std::collections::HashMap;
use std::path::Path;

use crate::error::BackendError;

use super::{Synonym, SynonymIter, SynonymSource};

pub const DEFAULT_SIZE: usize = 10;
pub const DEFAULT_MIN_SCORE: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct EmbeddingSynonyms {
    words: Vec<String>,
    vectors: Vec<Vec<f32>>,
    lookup: HashMap<String, usize>,
    /// Neighbours considered per seed.
    size: usize,
    /// Minimum cosine similarity for a neighbour to be emitted.
    min_score: f64,
}

impl EmbeddingSynonyms {
    pub fn new(size: usize, min_score: f64) -> Self {
        Self {
            words: Vec::new(),
            vectors: Vec::new(),
            lookup: HashMap::new(),
            size,
            min_score,
        }
    }

    /// Add one word vector; later duplicates replace earlier ones.
    pub fn insert(&mut self, word: &str, vector: Vec<f32>) {
        match self.lookup.get(word) {
            Some(&i) => self.vectors[i] = vector,
            None => {
                self.lookup.insert(word.to_string(), self.words.len());
                self.words.push(word.to_string());
                self.vectors.push(vector);
            }
        }
    }

    pub fn parse(content: &str, origin: &str, size: usize, min_score: f64) -> Result<Self, BackendError> {
        let mut model = Self::new(size, min_score);
        let mut dims: Option<usize> = None;
        for (line_no, line) in content.lines().enumerate() {
            let mut fields = line.split_whitespace();
            let Some(word) = fields.next() else {
                continue;
            };
            let values: Result<Vec<f32>, _> = fields.map(str::parse::<f32>).collect();
            let values = values.map_err(|e| BackendError::Parse {
                origin: origin.to_string(),
                message: format!("line {}: {e}", line_no + 1),
            })?;
            if line_no == 0 && values.len() == 1 && word.parse::<usize>().is_ok() {
                continue;
            }
            match dims {
                None => dims = Some(values.len()),
                Some(d) if d != values.len() => {
                    return Err(BackendError::Parse {
                        origin: origin.to_string(),
                        message: format!(
                            "line {}: expected {d} dimensions, found {}",
                            line_no + 1,
                            values.len()
                        ),
                    });
                }
                Some(_) => {}
            }
            model.insert(word, values);
        }
        Ok(model)
    }

    pub fn load(path: &Path, size: usize, min_score: f64) -> Result<Self, BackendError> {
        let content = std::fs::read_to_string(path).map_err(|e| BackendError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let model = Self::parse(&content, &path.display().to_string(), size, min_score)?;
        tracing::info!(path = %path.display(), words = model.len(), "loaded word vectors");
        Ok(model)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn cosine(a: &[f32], b: &[f32]) -> f64 {
        let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
        for (x, y) in a.iter().zip(b) {
            let (x, y) = (f64::from(*x), f64::from(*y));
            dot += x * y;
            na += x * x;
            nb += y * y;
        }
        if na == 0.0 || nb == 0.0 {
            return 0.0;
        }
        dot / (na.sqrt() * nb.sqrt())
    }

    /// The `size` nearest words to `phrase` by cosine similarity.
    pub fn neighbours(&self, phrase: &str) -> Vec<(&str, f64)> {
        let Some(&i) = self.lookup.get(phrase) else {
            return vec![];
        };
        let query = &self.vectors[i];
        let mut scored: Vec<(usize, f64)> = self
            .vectors
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(j, v)| (j, Self::cosine(query, v)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored
            .into_iter()
            .take(self.size)
            .map(|(j, score)| (self.words[j].as_str(), score))
            .collect()
    }
}

impl SynonymSource for EmbeddingSynonyms {
    fn name(&self) -> &str {
        "word2vec"
    }

    fn generate<'a>(&'a self, seed: &str) -> Result<SynonymIter<'a>, BackendError> {
        let phrase = seed.split_whitespace().collect::<Vec<_>>().join("_");
        let min_score = self.min_score;
        let seed = seed.to_string();
        let found = self.neighbours(&phrase);
        Ok(Box::new(found.into_iter().filter(move |(_, s)| *s >= min_score).map(
            move |(word, score)| Synonym::new(&seed, word, score, "word2vec"),
        )))
    }
}
