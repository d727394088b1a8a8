use serde::{Deserialize, Serialize};

use crate::table::records::Confidence;

pub const UNKNOWN_INDUSTRY: &str = "Unknown";

/// Best-guess industry for one client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub industry: String,
    pub confidence: Confidence,
}

impl ClassificationResult {
    /// The sentinel used whenever a reply cannot be obtained or interpreted.
    pub fn unknown() -> Self {
        Self {
            industry: UNKNOWN_INDUSTRY.to_string(),
            confidence: Confidence(0.0),
        }
    }
}

/// Reply shape as the model writes it, before confidence normalization.
#[derive(Debug, Deserialize)]
pub struct RawClassification {
    pub industry: String,
    #[serde(default)]
    pub confidence: Option<RawConfidence>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawConfidence {
    Number(f64),
    Text(String),
}

impl TryFrom<RawClassification> for ClassificationResult {
    type Error = String;

    fn try_from(raw: RawClassification) -> Result<Self, Self::Error> {
        let confidence = match raw.confidence {
            None => 0.0,
            Some(RawConfidence::Number(n)) => n,
            Some(RawConfidence::Text(text)) => text
                .trim()
                .trim_end_matches('%')
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("confidence is not a number: {text:?}"))?,
        };
        Ok(Self {
            industry: raw.industry,
            confidence: Confidence(confidence),
        })
    }
}

// Hosted chat-completion wire types.

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
pub struct ReplyMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatErrorBody {
    pub error: Option<ChatApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ChatApiError {
    pub message: Option<String>,
}

// Local model-server wire types.

#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    pub options: GenerateOptions,
}

#[derive(Debug, Serialize)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub num_predict: u32,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateErrorBody {
    pub error: Option<String>,
}
