//! `kwgraph.toml` configuration.
//!
//! ```toml
//! vocab_dir = "data/cache"
//! schema = "schemas/ht.toml"      # optional, bundled ht domain otherwise
//!
//! [resolver]
//! edit_distance_max = 1
//! max_synonyms = 64
//! backend_timeout_ms = 2000
//!
//! [synonyms]
//! dictionary = "synonyms.json"
//! embedding = "vectors.txt"
//! http_endpoint = "http://localhost:8080/similar"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BackendError, ConfigError, KwResult};
use crate::query::resolver::MAX_SYNONYMS_CEILING;
use crate::query::ResolverConfig;
use crate::schema::SchemaDoc;
use crate::synonym::embedding::{DEFAULT_MIN_SCORE, DEFAULT_SIZE};
use crate::synonym::{DictionarySynonyms, EmbeddingSynonyms, HttpSynonyms, SynonymSource, Thesaurus};

/// Which synonym sources to enable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SynonymSettings {
    /// JSON file of synonym groups.
    pub dictionary: Option<PathBuf>,
    /// Word-vector text file.
    pub embedding: Option<PathBuf>,
    pub embedding_size: usize,
    pub embedding_min_score: f64,
    /// Remote similarity service.
    pub http_endpoint: Option<String>,
    pub http_param: String,
    /// Must stay below `resolver.backend_timeout_ms` so a silent service is
    /// dropped by the thesaurus before the whole synonym pass times out.
    pub http_timeout_ms: u64,
}

impl Default for SynonymSettings {
    fn default() -> Self {
        Self {
            dictionary: None,
            embedding: None,
            embedding_size: DEFAULT_SIZE,
            embedding_min_score: DEFAULT_MIN_SCORE,
            http_endpoint: None,
            http_param: "q".into(),
            http_timeout_ms: 1500,
        }
    }
}

impl SynonymSettings {
    pub fn is_empty(&self) -> bool {
        self.dictionary.is_none() && self.embedding.is_none() && self.http_endpoint.is_none()
    }

    /// Load every configured source into one [`Thesaurus`], in the order
    /// dictionary, embedding, HTTP. `None` when nothing is configured.
    pub fn build(&self) -> Result<Option<Arc<dyn SynonymSource>>, BackendError> {
        if self.is_empty() {
            return Ok(None);
        }
        let mut thesaurus = Thesaurus::new();
        if let Some(path) = &self.dictionary {
            thesaurus.push(Box::new(DictionarySynonyms::load(path)?));
        }
        if let Some(path) = &self.embedding {
            thesaurus.push(Box::new(EmbeddingSynonyms::load(
                path,
                self.embedding_size,
                self.embedding_min_score,
            )?));
        }
        if let Some(endpoint) = &self.http_endpoint {
            thesaurus.push(Box::new(HttpSynonyms::new(
                endpoint,
                &self.http_param,
                Duration::from_millis(self.http_timeout_ms),
            )));
        }
        tracing::debug!(sources = ?thesaurus.source_names(), "synonym sources ready");
        let source: Arc<dyn SynonymSource> = Arc::new(thesaurus);
        Ok(Some(source))
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KwConfig {
    /// Directory of `<descriptor>.json` leaf histograms.
    pub vocab_dir: Option<PathBuf>,
    /// Schema file; the bundled ht domain when absent.
    pub schema: Option<PathBuf>,
    pub resolver: ResolverConfig,
    pub synonyms: SynonymSettings,
}

impl KwConfig {
    /// Load and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.resolver;
        if r.edit_distance_exclude.is_some_and(|floor| floor >= r.edit_distance_max) {
            return Err(ConfigError::Invalid {
                message: "resolver.edit_distance_exclude must be below edit_distance_max".into(),
            });
        }
        if r.backend_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                message: "resolver.backend_timeout_ms must be positive".into(),
            });
        }
        if r.max_synonyms > MAX_SYNONYMS_CEILING {
            return Err(ConfigError::Invalid {
                message: format!("resolver.max_synonyms must not exceed {MAX_SYNONYMS_CEILING}"),
            });
        }
        let s = &self.synonyms;
        if s.http_endpoint.is_some() && s.http_timeout_ms >= r.backend_timeout_ms {
            return Err(ConfigError::Invalid {
                message: "synonyms.http_timeout_ms must be below resolver.backend_timeout_ms".into(),
            });
        }
        if !(-1.0..=1.0).contains(&s.embedding_min_score) {
            return Err(ConfigError::Invalid {
                message: "synonyms.embedding_min_score must lie in [-1.0, 1.0]".into(),
            });
        }
        if s.embedding.is_some() && s.embedding_size == 0 {
            return Err(ConfigError::Invalid {
                message: "synonyms.embedding_size must be positive".into(),
            });
        }
        Ok(())
    }

    /// The configured schema, or the bundled one.
    pub fn schema_doc(&self) -> KwResult<SchemaDoc> {
        let doc = match &self.schema {
            Some(path) => SchemaDoc::load(path)?,
            None => SchemaDoc::bundled_ht()?,
        };
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_conservative() {
        let config = KwConfig::default();
        assert_eq!(config.resolver.edit_distance_max, 1);
        assert_eq!(config.resolver.edit_distance_exclude, Some(0));
        assert!(!config.resolver.similarity_allow_exact);
        assert_eq!(config.synonyms.embedding_size, 10);
        assert!(config.synonyms.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_partial_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("kwgraph.toml");
        std::fs::write(
            &path,
            r#"
vocab_dir = "cache"

[resolver]
edit_distance_max = 2
parallel = false
"#,
        )
        .unwrap();
        let config = KwConfig::load(&path).unwrap();
        assert_eq!(config.vocab_dir.as_deref(), Some(Path::new("cache")));
        assert_eq!(config.resolver.edit_distance_max, 2);
        assert!(!config.resolver.parallel);
        assert_eq!(config.resolver.max_synonyms, 64);
    }

    #[test]
    fn unknown_keys_and_bad_values_are_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("kwgraph.toml");

        std::fs::write(&path, "vocab_directory = \"x\"\n").unwrap();
        assert!(matches!(KwConfig::load(&path), Err(ConfigError::Parse { .. })));

        std::fs::write(&path, "[resolver]\nedit_distance_exclude = 1\n").unwrap();
        assert!(matches!(KwConfig::load(&path), Err(ConfigError::Invalid { .. })));

        std::fs::write(&path, "[resolver]\nmax_synonyms = 1000000000\n").unwrap();
        assert!(matches!(KwConfig::load(&path), Err(ConfigError::Invalid { .. })));

        assert!(matches!(
            KwConfig::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn http_timeout_must_undercut_pass_deadline() {
        let mut config = KwConfig::default();
        config.synonyms.http_endpoint = Some("http://localhost:8080/similar".into());
        assert!(config.synonyms.http_timeout_ms < config.resolver.backend_timeout_ms);
        assert!(config.validate().is_ok());

        config.synonyms.http_timeout_ms = config.resolver.backend_timeout_ms;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn synonym_sources_are_chained() {
        let dir = tempfile::TempDir::new().unwrap();
        let dict = dir.path().join("synonyms.json");
        std::fs::write(&dict, r#"[["vendor", "seller"]]"#).unwrap();
        let vectors = dir.path().join("vectors.txt");
        std::fs::write(&vectors, "vendor 1.0 0.0\nmerchant 0.9 0.1\n").unwrap();

        let settings = SynonymSettings {
            dictionary: Some(dict),
            embedding: Some(vectors),
            ..SynonymSettings::default()
        };
        let source = settings.build().unwrap().unwrap();
        assert_eq!(source.name(), "thesaurus");
        let targets: Vec<String> = source.generate("vendor").unwrap().map(|s| s.target).collect();
        assert_eq!(targets, vec!["seller", "merchant"]);

        assert!(SynonymSettings::default().build().unwrap().is_none());
    }
}
