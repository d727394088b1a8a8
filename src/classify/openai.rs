use reqwest::Client;
use tracing::debug;

use super::prompt::SYSTEM_PROMPT;
use super::types::{
    ChatErrorBody, ChatMessage, ChatRequest, ChatResponse, ResponseFormat,
};
use super::{Classifier, ClassifyError};
use crate::config::{ApiKey, OpenAiConfig};
use crate::http::snippet;

const TEMPERATURE: f32 = 0.1;

/// Hosted chat-completion backend.
#[derive(Clone)]
pub struct OpenAiClassifier {
    http: Client,
    api_key: ApiKey,
    url: String,
    model: String,
    json_mode: bool,
}

impl OpenAiClassifier {
    pub fn new(http: Client, config: &OpenAiConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            url: config.url.clone(),
            model: config.model.clone(),
            json_mode: config.json_mode,
        }
    }
}

impl Classifier for OpenAiClassifier {
    fn describe(&self) -> String {
        format!("OpenAI model {}", self.model)
    }

    async fn complete(&self, prompt: &str) -> Result<String, ClassifyError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: TEMPERATURE,
            response_format: self.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
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
            let message = serde_json::from_str::<ChatErrorBody>(&text)
                .ok()
                .and_then(|body| body.error)
                .and_then(|err| err.message)
                .unwrap_or_else(|| snippet(&text).to_string());
            return Err(ClassifyError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response.json().await?;
        debug!(model = %self.model, "chat completion received");

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ClassifyError::EmptyReply)
    }
}
