//! Curated synonym groups loaded from JSON.
//!
//! The file holds an array of groups. A plain array lists terms that are all
//! synonyms of each other. An object may also name broader and narrower
//! terms, which are proposed with a lower score:
//!
//! ```json
//! [
//!   ["eye color", "eyes"],
//!   {
//!     "terms": ["seller", "vendor"],
//!     "broader": ["agent"],
//!     "narrower": ["reseller"]
//!   }
//! ]
//! ```
//!
//! Broader and narrower terms are only emitted for seeds found in `terms`.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::BackendError;
use crate::graph::lexicon::normalize;

use super::{Synonym, SynonymIter, SynonymSource};

/// Score of a member of the seed's own group.
pub const SAME_SCORE: f64 = 1.0;
/// Default score of a broader (more general) term.
pub const BROADER_SCORE: f64 = 0.5;
/// Default score of a narrower (more specific) term.
pub const NARROWER_SCORE: f64 = 0.5;

fn default_broader_score() -> f64 {
    BROADER_SCORE
}

fn default_narrower_score() -> f64 {
    NARROWER_SCORE
}

/// One entry of the dictionary file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum GroupDecl {
    Plain(Vec<String>),
    Related {
        terms: Vec<String>,
        #[serde(default)]
        broader: Vec<String>,
        #[serde(default)]
        narrower: Vec<String>,
        #[serde(default = "default_broader_score")]
        broader_score: f64,
        #[serde(default = "default_narrower_score")]
        narrower_score: f64,
    },
}

#[derive(Debug, Clone, Default)]
struct Group {
    /// Own terms first, then broader, then narrower.
    members: Vec<(String, f64)>,
}

impl From<GroupDecl> for Group {
    fn from(decl: GroupDecl) -> Self {
        match decl {
            GroupDecl::Plain(terms) => Group {
                members: terms.into_iter().map(|t| (t, SAME_SCORE)).collect(),
            },
            GroupDecl::Related {
                terms,
                broader,
                narrower,
                broader_score,
                narrower_score,
            } => Group {
                members: terms
                    .into_iter()
                    .map(|t| (t, SAME_SCORE))
                    .chain(broader.into_iter().map(|t| (t, broader_score)))
                    .chain(narrower.into_iter().map(|t| (t, narrower_score)))
                    .collect(),
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DictionarySynonyms {
    groups: Vec<Group>,
    /// Normalised term → indices of the groups listing it under `terms`.
    index: HashMap<String, Vec<usize>>,
}

impl DictionarySynonyms {
    /// Plain synonym groups, every member scored alike.
    pub fn from_groups(groups: Vec<Vec<String>>) -> Self {
        Self::from_decls(groups.into_iter().map(GroupDecl::Plain).collect())
    }

    pub fn from_decls(decls: Vec<GroupDecl>) -> Self {
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, decl) in decls.iter().enumerate() {
            let terms = match decl {
                GroupDecl::Plain(terms) | GroupDecl::Related { terms, .. } => terms,
            };
            for term in terms {
                let entry = index.entry(normalize(term)).or_default();
                if !entry.contains(&i) {
                    entry.push(i);
                }
            }
        }
        let groups = decls.into_iter().map(Group::from).collect();
        Self { groups, index }
    }

    pub fn load(path: &Path) -> Result<Self, BackendError> {
        let content = std::fs::read_to_string(path).map_err(|e| BackendError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let decls: Vec<GroupDecl> =
            serde_json::from_str(&content).map_err(|e| BackendError::Parse {
                origin: path.display().to_string(),
                message: e.to_string(),
            })?;
        Ok(Self::from_decls(decls))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl SynonymSource for DictionarySynonyms {
    fn name(&self) -> &str {
        "dictionary"
    }

    fn generate<'a>(&'a self, seed: &str) -> Result<SynonymIter<'a>, BackendError> {
        let key = normalize(seed);
        let seed = seed.to_string();
        let groups = self.index.get(&key).cloned().unwrap_or_default();
        Ok(Box::new(groups.into_iter().flat_map(move |g| {
            let key = key.clone();
            let seed = seed.clone();
            self.groups[g]
                .members
                .iter()
                .filter(move |(term, _)| normalize(term) != key)
                .map(move |(term, score)| Synonym::new(&seed, term.clone(), *score, "dictionary"))
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict() -> DictionarySynonyms {
        DictionarySynonyms::from_groups(vec![
            vec!["seller".into(), "vendor".into(), "provider".into()],
            vec!["Eye_Color".into(), "eyes".into()],
            vec!["vendor".into(), "merchant".into()],
        ])
    }

    #[test]
    fn members_of_every_group_are_emitted() {
        let d = dict();
        let targets: Vec<String> = d.generate("Vendor").unwrap().map(|s| s.target).collect();
        assert_eq!(targets, vec!["seller", "provider", "merchant"]);
    }

    #[test]
    fn lookup_is_normalised() {
        let d = dict();
        let syns: Vec<Synonym> = d.generate("eye color").unwrap().collect();
        assert_eq!(syns.len(), 1);
        assert_eq!(syns[0].target, "eyes");
        assert_eq!(syns[0].source, "dictionary");
        assert_eq!(syns[0].seed, "eye color");
    }

    #[test]
    fn related_terms_carry_lower_scores() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("synonyms.json");
        std::fs::write(
            &path,
            r#"[
                {"terms": ["seller", "vendor"], "broader": ["agent"], "narrower": ["reseller"]},
                {"terms": ["price"], "broader": ["amount"], "broader_score": 0.3}
            ]"#,
        )
        .unwrap();
        let d = DictionarySynonyms::load(&path).unwrap();

        let scored: Vec<(String, f64)> = d
            .generate("vendor")
            .unwrap()
            .map(|s| (s.target, s.score))
            .collect();
        assert_eq!(
            scored,
            vec![
                ("seller".to_string(), SAME_SCORE),
                ("agent".to_string(), BROADER_SCORE),
                ("reseller".to_string(), NARROWER_SCORE),
            ]
        );

        let price: Vec<f64> = d.generate("price").unwrap().map(|s| s.score).collect();
        assert_eq!(price, vec![0.3]);

        // Related terms are not seeds themselves.
        assert_eq!(d.generate("agent").unwrap().count(), 0);
    }

    #[test]
    fn unknown_seed_is_empty() {
        assert_eq!(dict().generate("zebra").unwrap().count(), 0);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("synonyms.json");
        std::fs::write(&path, r#"[["price", "cost", "rate"]]"#).unwrap();
        let d = DictionarySynonyms::load(&path).unwrap();
        assert_eq!(d.len(), 1);
        assert_eq!(d.generate("cost").unwrap().count(), 2);

        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            DictionarySynonyms::load(&path),
            Err(BackendError::Parse { .. })
        ));
    }
}
