//! Error types for the chatbot service.

use std::time::Duration;

use thiserror::Error;

use crate::llm::GeneratorError;

/// Chatbot service error type.
#[derive(Debug, Error)]
pub enum ChatbotError {
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    /// The text generator failed.
    #[error("generator error: {0}")]
    Generator(#[from] GeneratorError),
    /// The text generator did not answer in time.
    #[error("generator timed out after {0:?}")]
    GeneratorTimeout(Duration),
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias for chatbot operations.
pub type ChatbotResult<T> = Result<T, ChatbotError>;
