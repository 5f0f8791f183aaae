//! Configuration for the chatbot service.
//!
//! Values come from `CHATBOT_*` environment variables; anything unset keeps
//! its default.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ChatbotError, ChatbotResult};
use crate::llm::GenerationParams;

/// Default server port.
pub const DEFAULT_PORT: u16 = 5000;

/// Reply used when nothing matches and no generator is configured.
pub const DEFAULT_FALLBACK_MESSAGE: &str =
    "I'm not sure how to respond to that. Can you please rephrase or ask something else?";

/// Default Ollama endpoint.
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
/// Default model name as installed in Ollama.
const DEFAULT_MODEL: &str = "mistral:7b-instruct-q8_0";
/// Default Ollama keep-alive.
const DEFAULT_KEEP_ALIVE: &str = "5m";
/// Default generator timeout (seconds).
const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 60;

const PORT_ENV: &str = "CHATBOT_PORT";
const FALLBACK_ENV: &str = "CHATBOT_FALLBACK";
const FALLBACK_MESSAGE_ENV: &str = "CHATBOT_FALLBACK_MESSAGE";
const OLLAMA_URL_ENV: &str = "CHATBOT_OLLAMA_URL";
const MODEL_ENV: &str = "CHATBOT_MODEL";
const KEEP_ALIVE_ENV: &str = "CHATBOT_KEEP_ALIVE";
const TIMEOUT_ENV: &str = "CHATBOT_GENERATION_TIMEOUT_SECS";
const MAX_TOKENS_ENV: &str = "CHATBOT_MAX_TOKENS";
const TEMPERATURE_ENV: &str = "CHATBOT_TEMPERATURE";

/// How unmatched messages are answered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackMode {
    /// Reply with a fixed message.
    #[default]
    Static,
    /// Ask the text generator.
    Generative,
}

impl FromStr for FallbackMode {
    type Err = ChatbotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "generative" => Ok(Self::Generative),
            other => Err(ChatbotError::InvalidConfig(format!(
                "{FALLBACK_ENV} must be `static` or `generative`, got `{other}`"
            ))),
        }
    }
}

/// Ollama connection settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL of the Ollama API.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// How long Ollama keeps the model loaded after a request.
    pub keep_alive: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            keep_alive: DEFAULT_KEEP_ALIVE.to_string(),
        }
    }
}

/// Top-level service configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatbotConfig {
    /// Listen port.
    pub port: u16,
    /// Fallback mode for unmatched messages.
    pub fallback: FallbackMode,
    /// Reply used in [`FallbackMode::Static`].
    pub fallback_message: String,
    /// Ollama settings, used in [`FallbackMode::Generative`].
    pub ollama: OllamaConfig,
    /// Sampling parameters for generation.
    pub generation: GenerationParams,
    /// Upper bound on a single generation (seconds).
    pub generation_timeout_secs: u64,
}

impl Default for ChatbotConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            fallback: FallbackMode::default(),
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
            ollama: OllamaConfig::default(),
            generation: GenerationParams::default(),
            generation_timeout_secs: DEFAULT_GENERATION_TIMEOUT_SECS,
        }
    }
}

impl ChatbotConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unparsable or invalid value.
    pub fn from_env() -> ChatbotResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unparsable or invalid value.
    pub fn from_lookup<F>(lookup: F) -> ChatbotResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = parse_var(&lookup, PORT_ENV)? {
            config.port = port;
        }
        if let Some(mode) = lookup(FALLBACK_ENV) {
            config.fallback = mode.parse()?;
        }
        if let Some(message) = lookup(FALLBACK_MESSAGE_ENV) {
            config.fallback_message = message;
        }
        if let Some(url) = lookup(OLLAMA_URL_ENV) {
            config.ollama.base_url = url;
        }
        if let Some(model) = lookup(MODEL_ENV) {
            config.ollama.model = model;
        }
        if let Some(keep_alive) = lookup(KEEP_ALIVE_ENV) {
            config.ollama.keep_alive = keep_alive;
        }
        if let Some(secs) = parse_var(&lookup, TIMEOUT_ENV)? {
            config.generation_timeout_secs = secs;
        }
        if let Some(max_tokens) = parse_var(&lookup, MAX_TOKENS_ENV)? {
            config.generation.max_tokens = max_tokens;
        }
        if let Some(temperature) = parse_var(&lookup, TEMPERATURE_ENV)? {
            config.generation.temperature = temperature;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the listen port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the fallback mode.
    #[must_use]
    pub const fn with_fallback(mut self, fallback: FallbackMode) -> Self {
        self.fallback = fallback;
        self
    }

    /// Set the static fallback reply.
    #[must_use]
    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }

    /// Generator timeout as a [`Duration`].
    #[must_use]
    pub const fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> ChatbotResult<()> {
        if self.port == 0 {
            return Err(ChatbotError::InvalidConfig("port must be > 0".to_string()));
        }

        if self.generation_timeout_secs == 0 {
            return Err(ChatbotError::InvalidConfig(
                "generation_timeout_secs must be > 0".to_string(),
            ));
        }

        if self.generation.max_tokens == 0 {
            return Err(ChatbotError::InvalidConfig(
                "generation.max_tokens must be > 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ChatbotError::InvalidConfig(
                "generation.temperature must be within 0.0..=2.0".to_string(),
            ));
        }

        if !(self.generation.top_p > 0.0 && self.generation.top_p <= 1.0) {
            return Err(ChatbotError::InvalidConfig(
                "generation.top_p must be within (0.0, 1.0]".to_string(),
            ));
        }

        Url::parse(&self.ollama.base_url)?;

        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> ChatbotResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|_| {
                ChatbotError::InvalidConfig(format!("{key} has an invalid value: `{raw}`"))
            })
        })
        .transpose()
}
