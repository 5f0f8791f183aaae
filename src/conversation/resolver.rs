//! Response resolution: known-conversation lookup with a fallback policy.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::{ChatbotConfig, FallbackMode};
use crate::conversation::store::{ConversationPair, ConversationStore};
use crate::error::{ChatbotError, ChatbotResult};
use crate::llm::{GenerationParams, Generator};

/// What to answer when no stored pattern matches.
#[derive(Clone)]
pub enum FallbackPolicy {
    /// Reply with a fixed message.
    Static(String),
    /// Forward the raw message to a generator.
    Generative {
        /// Text generator.
        generator: Arc<dyn Generator>,
        /// Sampling parameters.
        params: GenerationParams,
        /// Upper bound on a single generation.
        timeout: Duration,
    },
}

impl std::fmt::Debug for FallbackPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(message) => f.debug_tuple("Static").field(message).finish(),
            Self::Generative {
                params, timeout, ..
            } => f
                .debug_struct("Generative")
                .field("params", params)
                .field("timeout", timeout)
                .finish_non_exhaustive(),
        }
    }
}

/// Resolves a user message to a reply.
#[derive(Clone, Debug)]
pub struct ResponseResolver {
    fallback: FallbackPolicy,
}

impl ResponseResolver {
    /// Create a resolver with the given fallback policy.
    #[must_use]
    pub const fn new(fallback: FallbackPolicy) -> Self {
        Self { fallback }
    }

    /// Create a resolver that answers unmatched messages with `message`.
    #[must_use]
    pub fn with_static(message: impl Into<String>) -> Self {
        Self::new(FallbackPolicy::Static(message.into()))
    }

    /// Create a resolver that forwards unmatched messages to `generator`.
    #[must_use]
    pub fn with_generator(
        generator: Arc<dyn Generator>,
        params: GenerationParams,
        timeout: Duration,
    ) -> Self {
        Self::new(FallbackPolicy::Generative {
            generator,
            params,
            timeout,
        })
    }

    /// Build the resolver described by `config`.
    ///
    /// `generator` is required in [`FallbackMode::Generative`].
    ///
    /// # Errors
    /// Returns an error if generative mode is configured without a generator.
    pub fn from_config(
        config: &ChatbotConfig,
        generator: Option<Arc<dyn Generator>>,
    ) -> ChatbotResult<Self> {
        match (config.fallback, generator) {
            (FallbackMode::Static, _) => Ok(Self::with_static(config.fallback_message.clone())),
            (FallbackMode::Generative, Some(generator)) => Ok(Self::with_generator(
                generator,
                config.generation.clone(),
                config.generation_timeout(),
            )),
            (FallbackMode::Generative, None) => Err(ChatbotError::InvalidConfig(
                "generative fallback requires a generator".to_string(),
            )),
        }
    }

    /// Active fallback policy.
    #[must_use]
    pub const fn fallback(&self) -> &FallbackPolicy {
        &self.fallback
    }

    /// Reply to `message` using the pairs currently in `store`.
    ///
    /// # Errors
    /// Returns an error if the generator fails or times out.
    pub async fn resolve(&self, message: &str, store: &ConversationStore) -> ChatbotResult<String> {
        let pairs = store.scan().await;
        if let Some(response) = find_response(message, &pairs) {
            return Ok(response.to_string());
        }

        debug!("no known conversation matched, using fallback");
        match &self.fallback {
            FallbackPolicy::Static(reply) => Ok(reply.clone()),
            FallbackPolicy::Generative {
                generator,
                params,
                timeout,
            } => tokio::time::timeout(*timeout, generator.generate(message, params))
                .await
                .map_err(|_| ChatbotError::GeneratorTimeout(*timeout))?
                .map_err(ChatbotError::from),
        }
    }
}

/// First response whose pattern contains `message`, ignoring case.
///
/// The message is searched for inside the pattern, not the other way
/// around: `"hi"` matches `"Hi there!"`, `"hi there, friend"` does not.
#[must_use]
pub fn find_response<'a>(message: &str, pairs: &'a [ConversationPair]) -> Option<&'a str> {
    let needle = message.to_lowercase();
    pairs
        .iter()
        .find(|pair| pair.pattern.to_lowercase().contains(&needle))
        .map(|pair| pair.response.as_str())
}
