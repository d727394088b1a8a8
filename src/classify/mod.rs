//! Industry classification: prompt construction, LLM backends, and reply interpretation.

pub mod interpret;
mod ollama;
mod openai;
pub mod prompt;
pub mod types;

pub use interpret::{Interpretation, interpret};
pub use ollama::OllamaClassifier;
pub use openai::OpenAiClassifier;
pub use types::ClassificationResult;

use reqwest::Client;
use tracing::{error, warn};

use crate::config::ClassifierConfig;
use crate::search::LookupResult;

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("model returned an empty reply")]
    EmptyReply,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// A language model that answers a classification prompt with free-form text.
pub trait Classifier {
    /// Human-readable backend and model name for progress logs.
    fn describe(&self) -> String;

    async fn complete(&self, prompt: &str) -> Result<String, ClassifyError>;
}

/// The backend selected at startup.
#[derive(Clone)]
pub enum Backend {
    OpenAi(OpenAiClassifier),
    Ollama(OllamaClassifier),
}

impl Backend {
    pub fn new(http: Client, config: &ClassifierConfig) -> Self {
        match config {
            ClassifierConfig::OpenAi(c) => Backend::OpenAi(OpenAiClassifier::new(http, c)),
            ClassifierConfig::Ollama(c) => Backend::Ollama(OllamaClassifier::new(http, c)),
        }
    }
}

impl Classifier for Backend {
    fn describe(&self) -> String {
        match self {
            Backend::OpenAi(c) => c.describe(),
            Backend::Ollama(c) => c.describe(),
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String, ClassifyError> {
        match self {
            Backend::OpenAi(c) => c.complete(prompt).await,
            Backend::Ollama(c) => c.complete(prompt).await,
        }
    }
}

/// Result for one company plus whether it is the fallback sentinel.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub result: ClassificationResult,
    pub degraded: bool,
}

/// Asks the classifier about one company. Never fails: API errors and
/// uninterpretable replies both yield the `Unknown` sentinel.
pub async fn classify_company(
    classifier: &impl Classifier,
    name: &str,
    lookup: &LookupResult,
    industries: &[String],
) -> Classified {
    let prompt = prompt::build_prompt(name, lookup, industries);

    let raw = match classifier.complete(&prompt).await {
        Ok(raw) => raw,
        Err(e) => {
            error!(company = name, error = %e, "classifier API error");
            return Classified {
                result: ClassificationResult::unknown(),
                degraded: true,
            };
        }
    };

    let interpretation = interpret(&raw);
    let degraded = match &interpretation {
        Interpretation::Parsed(_) => false,
        Interpretation::Fallback { reason } => {
            warn!(company = name, %reason, raw = %raw, "could not interpret classifier reply");
            true
        }
    };
    Classified {
        result: interpretation.into_result(),
        degraded,
    }
}
