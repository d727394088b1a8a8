use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use super::types::{ErrorBody, LookupResult, SearchRequest};
use crate::config::{ApiKey, TavilyConfig};
use crate::http::snippet;

const SEARCH_DEPTH: &str = "basic";
const MAX_RESULTS: u8 = 5;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Search API rejected the key. Check TAVILY_API_KEY.")]
    Unauthorized,

    #[error("Search API rate limit exceeded.")]
    RateLimited,

    #[error("Search API plan limit reached: {0}")]
    QuotaExhausted(String),

    #[error("Search API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Web lookup of a company name.
/// Implemented by `TavilyClient` for production; mock implementations used in tests.
pub trait SearchClient {
    async fn search(&self, query: &str) -> Result<LookupResult, SearchError>;
}

#[derive(Clone)]
pub struct TavilyClient {
    http: Client,
    api_key: ApiKey,
    url: String,
}

impl TavilyClient {
    pub fn new(http: Client, config: &TavilyConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            url: config.url.clone(),
        }
    }
}

impl SearchClient for TavilyClient {
    async fn search(&self, query: &str) -> Result<LookupResult, SearchError> {
        let request = SearchRequest {
            query,
            search_depth: SEARCH_DEPTH,
            max_results: MAX_RESULTS,
        };

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(self.api_key.expose())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = classify_status(status, &text);
            warn!(status = %status, error = %err, "search API error");
            return Err(err);
        }

        let body: serde_json::Value = response.json().await?;
        debug!(query, "search complete");
        Ok(LookupResult(body))
    }
}

fn classify_status(status: StatusCode, text: &str) -> SearchError {
    let message = serde_json::from_str::<ErrorBody>(text)
        .ok()
        .and_then(|body| body.detail)
        .map(|detail| detail.message().to_string())
        .unwrap_or_else(|| format!("HTTP {status}: {}", snippet(text)));

    match status.as_u16() {
        401 => SearchError::Unauthorized,
        429 => SearchError::RateLimited,
        432 | 433 => SearchError::QuotaExhausted(message),
        code => SearchError::Api { code, message },
    }
}
