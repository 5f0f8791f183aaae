//! Text-generation collaborator used for generative fallback replies.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default generation length (tokens).
const DEFAULT_MAX_TOKENS: u32 = 100;
/// Default sampling temperature.
const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Default top-k sampling threshold.
const DEFAULT_TOP_K: u32 = 50;
/// Default nucleus sampling threshold.
const DEFAULT_TOP_P: f32 = 0.95;
/// Default n-gram size that may not repeat.
const DEFAULT_NO_REPEAT_NGRAM_SIZE: u32 = 2;

/// Errors produced by a [`Generator`].
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// HTTP transport failure.
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
    /// Backend answered with a non-success status.
    #[error("generator http status not ok: {0}")]
    HttpStatusNotOk(u16),
    /// Backend answered without generated text.
    #[error("generator response malformed")]
    MalformedResponse,
    /// Backend could not be reached or refused the request.
    #[error("generator unavailable: {0}")]
    Unavailable(String),
}

/// Sampling parameters passed along with every prompt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Top-k sampling threshold.
    pub top_k: u32,
    /// Nucleus sampling threshold.
    pub top_p: f32,
    /// Size of n-grams that must not repeat. Backends that lack n-gram
    /// blocking ignore it.
    pub no_repeat_ngram_size: u32,
    /// End-of-sequence marker that stops generation.
    pub stop: Option<String>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            top_k: DEFAULT_TOP_K,
            top_p: DEFAULT_TOP_P,
            no_repeat_ngram_size: DEFAULT_NO_REPEAT_NGRAM_SIZE,
            stop: None,
        }
    }
}

impl GenerationParams {
    /// Set the generation length.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the end-of-sequence marker.
    #[must_use]
    pub fn with_stop(mut self, stop: impl Into<String>) -> Self {
        self.stop = Some(stop.into());
        self
    }
}

/// Produces a completion for a prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate text for `prompt` and return it verbatim.
    ///
    /// # Errors
    /// Returns an error if the backend is unreachable or answers badly.
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GeneratorError>;
}
