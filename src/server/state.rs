//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::config::{ChatbotConfig, FallbackMode};
use crate::conversation::{ConversationStore, ResponseResolver};
use crate::error::ChatbotResult;
use crate::llm::{Generator, OllamaGenerator};

/// Shared application state.
pub struct AppState {
    /// Known conversations, seeded at startup and grown by feedback.
    pub store: ConversationStore,
    /// Reply policy for chat requests.
    pub resolver: ResponseResolver,
}

impl AppState {
    /// Create state from its parts.
    #[must_use]
    pub fn from_parts(store: ConversationStore, resolver: ResponseResolver) -> Arc<Self> {
        Arc::new(Self { store, resolver })
    }

    /// Create state with the seeded store and the configured fallback.
    ///
    /// In generative mode this also builds the Ollama client; the returned
    /// handle lets the caller probe it before serving.
    ///
    /// # Errors
    /// Returns an error if the Ollama client cannot be created.
    pub fn new(
        config: &ChatbotConfig,
    ) -> ChatbotResult<(Arc<Self>, Option<Arc<OllamaGenerator>>)> {
        let ollama = match config.fallback {
            FallbackMode::Static => None,
            FallbackMode::Generative => Some(Arc::new(OllamaGenerator::new(
                &config.ollama,
                config.generation_timeout(),
            )?)),
        };

        let generator = ollama
            .clone()
            .map(|client| client as Arc<dyn Generator>);
        let resolver = ResponseResolver::from_config(config, generator)?;

        Ok((Self::from_parts(ConversationStore::seed(), resolver), ollama))
    }
}
