//! Candidate referents proposed for an anchor.

use std::fmt;

use serde::Serialize;

use crate::graph::Referent;
use crate::synonym::Synonym;

/// How a candidate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchKind {
    Direct,
    EditDistance,
    Similarity,
    Synonym,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Direct => "direct",
            Self::EditDistance => "edit-distance",
            Self::Similarity => "similarity",
            Self::Synonym => "synonym",
        })
    }
}

/// Hypothesis that an anchor refers to a graph element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub referent: Referent,
    pub kind: MatchKind,
    /// Edit distance, for [`MatchKind::EditDistance`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<usize>,
    /// Lexicon value that matched, for fuzzy and similarity matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_value: Option<String>,
    /// Provenance, for [`MatchKind::Synonym`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synonym: Option<Synonym>,
}

impl Candidate {
    pub fn direct(referent: Referent) -> Self {
        Self {
            referent,
            kind: MatchKind::Direct,
            distance: None,
            matched_value: None,
            synonym: None,
        }
    }

    pub fn edit_distance(referent: Referent, value: String, distance: usize) -> Self {
        Self {
            referent,
            kind: MatchKind::EditDistance,
            distance: Some(distance),
            matched_value: Some(value),
            synonym: None,
        }
    }

    pub fn similarity(referent: Referent, value: String) -> Self {
        Self {
            referent,
            kind: MatchKind::Similarity,
            distance: None,
            matched_value: Some(value),
            synonym: None,
        }
    }

    pub fn synonym(referent: Referent, synonym: Synonym) -> Self {
        Self {
            referent,
            kind: MatchKind::Synonym,
            distance: None,
            matched_value: None,
            synonym: Some(synonym),
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} {}", self.kind, self.referent)?;
        if let Some(d) = self.distance {
            write!(f, " d={d}")?;
        }
        if let Some(value) = &self.matched_value {
            write!(f, " ={value}")?;
        }
        if let Some(s) = &self.synonym {
            write!(f, " {s}")?;
        }
        f.write_str(">")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_evidence() {
        let c = Candidate::edit_distance(Referent::node("seller"), "seller".into(), 1);
        assert_eq!(c.to_string(), "<edit-distance node seller d=1 =seller>");

        let s = Synonym::new("vendor", "seller", 1.0, "dictionary");
        let c = Candidate::synonym(Referent::node("seller"), s);
        assert_eq!(
            c.to_string(),
            "<synonym node seller dictionary(vendor)=seller>"
        );
    }

    #[test]
    fn serialises_without_empty_fields() {
        let c = Candidate::direct(Referent::edge("seller", "phone"));
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["kind"], "direct");
        assert!(json.get("distance").is_none());
        assert!(json.get("synonym").is_none());
    }
}
