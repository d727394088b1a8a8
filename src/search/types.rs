use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    pub search_depth: &'static str,
    pub max_results: u8,
}

/// Error envelope: `{"detail": {"error": "..."}}` or `{"detail": "..."}`.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub detail: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Structured { error: String },
    Text(String),
}

impl ErrorDetail {
    pub fn message(&self) -> &str {
        match self {
            ErrorDetail::Structured { error } => error,
            ErrorDetail::Text(text) => text,
        }
    }
}

/// Search response for one company, kept as the service returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupResult(pub serde_json::Value);

impl LookupResult {
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| self.0.to_string())
    }
}
