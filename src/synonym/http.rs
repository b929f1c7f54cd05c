//! Remote similarity service queried over HTTP.
//!
//! Sends `GET <endpoint>?<param>=<seed>` and expects a JSON array of
//! `{"target": "...", "score": 0.8}` objects.

use std::time::Duration;

use serde::Deserialize;

use crate::error::BackendError;

use super::{Synonym, SynonymIter, SynonymSource};

#[derive(Debug, Deserialize)]
struct RemoteSynonym {
    target: String,
    #[serde(default = "default_score")]
    score: f64,
}

fn default_score() -> f64 {
    1.0
}

pub struct HttpSynonyms {
    endpoint: String,
    param: String,
    agent: ureq::Agent,
}

impl HttpSynonyms {
    pub fn new(endpoint: &str, param: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            endpoint: endpoint.to_string(),
            param: param.to_string(),
            agent,
        }
    }

    fn fetch(&self, seed: &str) -> Result<Vec<RemoteSynonym>, BackendError> {
        let response = self
            .agent
            .get(&self.endpoint)
            .query(&self.param, seed)
            .call()
            .map_err(|e: ureq::Error| BackendError::Http {
                url: self.endpoint.clone(),
                message: e.to_string(),
            })?;
        let body = response.into_string().map_err(|e| BackendError::Http {
            url: self.endpoint.clone(),
            message: e.to_string(),
        })?;
        parse_response(&body, &self.endpoint)
    }
}

fn parse_response(body: &str, origin: &str) -> Result<Vec<RemoteSynonym>, BackendError> {
    serde_json::from_str(body).map_err(|e| BackendError::Parse {
        origin: origin.to_string(),
        message: e.to_string(),
    })
}

impl SynonymSource for HttpSynonyms {
    fn name(&self) -> &str {
        "http"
    }

    fn generate<'a>(&'a self, seed: &str) -> Result<SynonymIter<'a>, BackendError> {
        let seed = seed.to_string();
        let found = self.fetch(&seed)?;
        Ok(Box::new(
            found
                .into_iter()
                .map(move |r| Synonym::new(&seed, r.target, r.score, "http")),
        ))
    }
}
