//! Lexicons: the strings by which a graph element is recognised in free text.
//!
//! All comparisons go through [`normalize`]: Unicode NFC, lowercase, and
//! underscores read as spaces, so `"eye_color"`, `"Eye Color"` and
//! `"eye color"` are the same lexicon entry.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

static RE_LOWER_UPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());
static RE_ACRONYM_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z])([A-Z][a-z])").unwrap());

/// Normalise a term or lexicon value for comparison.
pub fn normalize(value: &str) -> String {
    value.nfc().collect::<String>().to_lowercase().replace('_', " ")
}

/// Split a relation name at internal capitalisation boundaries.
///
/// `"madeBy"` becomes `"made By"`, `"mainEntityOfPage"` becomes
/// `"main Entity Of Page"` and `"HTTPServer"` becomes `"HTTP Server"`.
pub fn camel_case_words(label: &str) -> String {
    let spaced = RE_LOWER_UPPER.replace_all(label, "$1 $2");
    RE_ACRONYM_WORD.replace_all(&spaced, "$1 $2").into_owned()
}

/// Classic Levenshtein distance over `char`s.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Two rows are enough: row i only depends on row i - 1.
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Where a lexicon's values came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LexiconOrigin {
    /// Identifier, class name or relation name from the schema.
    Ontology,
    /// Observed values loaded from a vocabulary store.
    LeafVocab,
}

/// The matchable values of one node or edge.
///
/// Values keep their source order (for leaves: descending observation
/// frequency) and are deduplicated on their normalised form.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexicon {
    origin: LexiconOrigin,
    values: Vec<String>,
    normalized: Vec<String>,
}

impl Lexicon {
    /// Build a lexicon from raw values, dropping normalised duplicates.
    pub fn new(origin: LexiconOrigin, raw: impl IntoIterator<Item = String>) -> Self {
        let mut values = Vec::new();
        let mut normalized: Vec<String> = Vec::new();
        for value in raw {
            let norm = normalize(&value);
            if !normalized.contains(&norm) {
                values.push(value);
                normalized.push(norm);
            }
        }
        Self {
            origin,
            values,
            normalized,
        }
    }

    pub fn origin(&self) -> LexiconOrigin {
        self.origin
    }

    /// Values as they were supplied.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Case- and underscore-insensitive membership test.
    pub fn contains(&self, term: &str) -> bool {
        let term = normalize(term);
        self.normalized.iter().any(|v| *v == term)
    }

    /// First value whose edit distance to `term` is at most `max_distance`
    /// and, when `exclude_distance` is set, strictly greater than it.
    ///
    /// Returns the normalised value together with its distance. This does
    /// not look for the closest value, only the first one inside the band.
    pub fn within_distance(
        &self,
        term: &str,
        max_distance: usize,
        exclude_distance: Option<usize>,
    ) -> Option<(String, usize)> {
        let term = normalize(term);
        self.normalized.iter().find_map(|value| {
            let actual = levenshtein(&term, value);
            let above = exclude_distance.is_none_or(|floor| actual > floor);
            (above && actual <= max_distance).then(|| (value.clone(), actual))
        })
    }

    /// Accept a similarity matcher's proposal only if it is a lexicon value.
    ///
    /// `best` must literally equal one normalised value; a proposal equal to
    /// the term itself is rejected unless `allow_exact` is set.
    pub fn confirm(&self, term: &str, best: &str, allow_exact: bool) -> Option<String> {
        let term = normalize(term);
        let best = normalize(best);
        if best == term && !allow_exact {
            return None;
        }
        self.normalized.iter().find(|v| **v == best).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon(values: &[&str]) -> Lexicon {
        Lexicon::new(
            LexiconOrigin::LeafVocab,
            values.iter().map(|v| v.to_string()),
        )
    }

    #[test]
    fn normalize_folds_case_and_underscores() {
        assert_eq!(normalize("Eye_Color"), "eye color");
        assert_eq!(normalize("  x"), "  x");
    }

    #[test]
    fn camel_case_splitting() {
        assert_eq!(camel_case_words("madeBy"), "made By");
        assert_eq!(camel_case_words("mainEntityOfPage"), "main Entity Of Page");
        assert_eq!(camel_case_words("HTTPServer"), "HTTP Server");
        assert_eq!(camel_case_words("name"), "name");
        assert_eq!(camel_case_words("rel1"), "rel1");
    }

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("blue", "blue"), 0);
        assert_eq!(levenshtein("blue", "blu"), 1);
    }

    #[test]
    fn duplicates_collapse_on_normalised_form() {
        let lex = lexicon(&["Blue", "blue", "light_blue", "light blue"]);
        assert_eq!(lex.values(), &["Blue".to_string(), "light_blue".to_string()]);
    }

    #[test]
    fn contains_is_normalised() {
        let lex = lexicon(&["Light_Blue"]);
        assert!(lex.contains("light blue"));
        assert!(lex.contains("LIGHT_BLUE"));
        assert!(!lex.contains("blue"));
    }

    #[test]
    fn within_distance_excludes_identical() {
        let lex = lexicon(&["blue", "glue"]);
        // "blue" itself is at distance 0 and excluded; "glue" is at 1.
        assert_eq!(
            lex.within_distance("blue", 1, Some(0)),
            Some(("glue".to_string(), 1))
        );
        assert_eq!(
            lex.within_distance("blue", 1, None),
            Some(("blue".to_string(), 0))
        );
        assert_eq!(lex.within_distance("bleu", 1, Some(0)), None);
    }

    #[test]
    fn within_distance_is_monotonic_in_threshold() {
        let lex = lexicon(&["brown", "hazel", "green"]);
        for term in ["brwn", "hazle", "gren", "grey", "x"] {
            for k in 0..4 {
                if lex.within_distance(term, k, Some(0)).is_some() {
                    assert!(lex.within_distance(term, k + 1, Some(0)).is_some());
                }
            }
        }
    }

    #[test]
    fn confirm_requires_lexicon_value() {
        let lex = lexicon(&["blue", "green"]);
        assert_eq!(lex.confirm("blu", "blue", false), Some("blue".to_string()));
        assert_eq!(lex.confirm("blu", "purple", false), None);
        assert_eq!(lex.confirm("blue", "blue", false), None);
        assert_eq!(lex.confirm("blue", "Blue", true), Some("blue".to_string()));
    }
}
