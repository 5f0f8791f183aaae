//! Ollama-backed [`Generator`].
//!
//! Behaviour:
//! - Check whether Ollama is reachable via `GET /api/version`.
//! - Warm the model up with a one-token `POST /api/generate`.
//! - Generate non-streamed completions with per-request sampling options.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::OllamaConfig;
use crate::llm::generator::{GenerationParams, Generator, GeneratorError};

/// Warm-up prompt: minimal non-empty prompt.
const WARMUP_PROMPT: &str = " ";
/// Warm-up token budget.
const WARMUP_NUM_PREDICT: u32 = 1;

/// Connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Extra time the HTTP client waits past the generation deadline, so the
/// caller's own timeout always fires first.
const CLIENT_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct GenerateOptions<'a> {
    num_predict: u32,
    temperature: f32,
    top_k: u32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<[&'a str; 1]>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    keep_alive: &'a str,
    options: GenerateOptions<'a>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

/// Async Ollama client generating fallback replies.
pub struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
    keep_alive: String,
}

impl OllamaGenerator {
    /// Create a client for the configured Ollama server.
    ///
    /// `generation_timeout` is the deadline callers put on a generation; the
    /// HTTP client itself gives up slightly later.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: &OllamaConfig,
        generation_timeout: Duration,
    ) -> Result<Self, GeneratorError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(client_timeout(generation_timeout))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            keep_alive: config.keep_alive.clone(),
        })
    }

    /// Model name requests are sent to.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Whether the Ollama server answers `GET /api/version`.
    ///
    /// # Errors
    /// Returns an error if the server cannot be reached.
    pub async fn is_ready(&self) -> Result<bool, GeneratorError> {
        let url = format!("{}/api/version", self.base_url);
        let response = self.client.get(&url).send().await?;
        Ok(response.status().is_success())
    }

    /// Load the model into memory with a one-token generation.
    ///
    /// # Errors
    /// Returns an error if the warm-up request fails.
    pub async fn warm_up(&self) -> Result<(), GeneratorError> {
        let params = GenerationParams::default().with_max_tokens(WARMUP_NUM_PREDICT);
        self.post_generate(WARMUP_PROMPT, &params).await?;
        Ok(())
    }

    async fn post_generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<GenerateResponse, GeneratorError> {
        let request = build_request(&self.model, prompt, &self.keep_alive, params);

        let url = format!("{}/api/generate", self.base_url);
        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeneratorError::HttpStatusNotOk(status.as_u16()));
        }

        response
            .json::<GenerateResponse>()
            .await
            .map_err(GeneratorError::from)
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GeneratorError> {
        debug!(model = %self.model, "generating fallback reply");
        let response = self.post_generate(prompt, params).await?;
        response.response.ok_or(GeneratorError::MalformedResponse)
    }
}

/// HTTP client timeout for a given generation deadline.
const fn client_timeout(generation_timeout: Duration) -> Duration {
    generation_timeout.saturating_add(CLIENT_TIMEOUT_MARGIN)
}

fn build_request<'a>(
    model: &'a str,
    prompt: &'a str,
    keep_alive: &'a str,
    params: &'a GenerationParams,
) -> GenerateRequest<'a> {
    GenerateRequest {
        model,
        prompt,
        stream: false,
        keep_alive,
        options: GenerateOptions {
            num_predict: params.max_tokens,
            temperature: params.temperature,
            top_k: params.top_k,
            top_p: params.top_p,
            stop: params.stop.as_deref().map(|s| [s]),
        },
    }
}
