//! SERP-style web-search lookup.
//!
//! Queries a search JSON endpoint and returns the top organic result
//! links. Used by the gateway to append sources to answers that need
//! current information; any failure here degrades to a bare reply, so the
//! error mapping is deliberately coarse.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use gatehouse_core::collaborators::SearchLookup;
use gatehouse_types::error::GatewayError;

const DEFAULT_ENDPOINT: &str = "https://serpapi.com/search.json";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    link: Option<String>,
}

fn extract_links(response: SearchResponse, limit: usize) -> Vec<String> {
    response
        .organic_results
        .into_iter()
        .filter_map(|result| result.link)
        .take(limit)
        .collect()
}

/// HTTP implementation of `SearchLookup`.
pub struct SerpSearchLookup {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
}

impl SerpSearchLookup {
    pub fn new(api_key: SecretString) -> Self {
        Self::with_endpoint(api_key, DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(api_key: SecretString, endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

impl SearchLookup for SerpSearchLookup {
    async fn top_links(&self, query: &str, limit: usize) -> Result<Vec<String>, GatewayError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("api_key", self.api_key.expose_secret())])
            .send()
            .await
            .map_err(|e| GatewayError::CollaboratorUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| GatewayError::CollaboratorUnavailable(e.to_string()))?;

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::CollaboratorUnavailable(e.to_string()))?;

        let links = extract_links(body, limit);
        debug!(links = links.len(), "search lookup completed");
        Ok(links)
    }
}
