use reqwest::Client;
use tracing::debug;

use super::types::{GenerateErrorBody, GenerateOptions, GenerateRequest, GenerateResponse};
use super::{Classifier, ClassifyError};
use crate::config::OllamaConfig;
use crate::http::snippet;

const TEMPERATURE: f32 = 0.1;
const MAX_TOKENS: u32 = 200;

/// Locally hosted model-server backend (Ollama `/api/generate`).
#[derive(Clone)]
pub struct OllamaClassifier {
    http: Client,
    url: String,
    model: String,
}

impl OllamaClassifier {
    pub fn new(http: Client, config: &OllamaConfig) -> Self {
        Self {
            http,
            url: config.url.clone(),
            model: config.model.clone(),
        }
    }
}

impl Classifier for OllamaClassifier {
    fn describe(&self) -> String {
        format!("Ollama model {}", self.model)
    }

    async fn complete(&self, prompt: &str) -> Result<String, ClassifyError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: prompt.trim(),
            stream: false,
            options: GenerateOptions {
                temperature: TEMPERATURE,
                num_predict: MAX_TOKENS,
            },
        };

        let response = self.http.post(&self.url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GenerateErrorBody>(&text)
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| snippet(&text).to_string());
            return Err(ClassifyError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = response.json().await?;
        debug!(model = %self.model, "generation received");

        if body.response.trim().is_empty() {
            return Err(ClassifyError::EmptyReply);
        }
        Ok(body.response)
    }
}
