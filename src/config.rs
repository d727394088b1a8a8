use std::fmt;

use url::Url;

const DEFAULT_TAVILY_URL: &str = "https://api.tavily.com/search";
const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/api/generate";
const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingVar(&'static str),

    #[error("{var} is not a valid URL: {source}")]
    InvalidUrl {
        var: &'static str,
        source: url::ParseError,
    },
}

/// Which language-model service answers the classification prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum BackendKind {
    /// Hosted chat-completion API (OpenAI)
    #[default]
    Openai,
    /// Locally hosted model server (Ollama)
    Ollama,
}

#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn for_tests(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Debug, Clone)]
pub struct TavilyConfig {
    pub api_key: ApiKey,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: ApiKey,
    pub url: String,
    pub model: String,
    pub json_mode: bool,
}

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub enum ClassifierConfig {
    OpenAi(OpenAiConfig),
    Ollama(OllamaConfig),
}

/// Process-wide settings, resolved once at startup and passed to the collaborators.
///
/// Environment variables:
/// - `TAVILY_API_KEY` (required), `TAVILY_API_URL`
/// - `OPENAI_API_KEY` (required for the `openai` backend), `OPENAI_API_URL`,
///   `OPENAI_MODEL`, `OPENAI_JSON_MODE`
/// - `OLLAMA_API_URL`, `OLLAMA_MODEL`
#[derive(Debug, Clone)]
pub struct Config {
    pub tavily: TavilyConfig,
    pub classifier: ClassifierConfig,
}

impl Config {
    pub fn from_lookup(
        backend: BackendKind,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let vars = Vars(lookup);

        let tavily = TavilyConfig {
            api_key: vars.required_key("TAVILY_API_KEY")?,
            url: vars.url("TAVILY_API_URL", DEFAULT_TAVILY_URL)?,
        };

        let classifier = match backend {
            BackendKind::Openai => ClassifierConfig::OpenAi(OpenAiConfig {
                api_key: vars.required_key("OPENAI_API_KEY")?,
                url: vars.url("OPENAI_API_URL", DEFAULT_OPENAI_URL)?,
                model: vars.or_default("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
                json_mode: vars.get("OPENAI_JSON_MODE").is_none_or(|v| parse_flag(&v)),
            }),
            BackendKind::Ollama => ClassifierConfig::Ollama(OllamaConfig {
                url: vars.url("OLLAMA_API_URL", DEFAULT_OLLAMA_URL)?,
                model: vars.or_default("OLLAMA_MODEL", DEFAULT_OLLAMA_MODEL),
            }),
        };

        Ok(Self { tavily, classifier })
    }
}

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required_key(&self, name: &'static str) -> Result<ApiKey, ConfigError> {
        self.get(name)
            .map(ApiKey)
            .ok_or(ConfigError::MissingVar(name))
    }

    fn or_default(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    fn url(&self, name: &'static str, default: &str) -> Result<String, ConfigError> {
        let raw = self.or_default(name, default);
        Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { var: name, source })?;
        Ok(raw)
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.to_ascii_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}
