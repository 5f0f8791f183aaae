//! Text generation used when no known conversation matches.

pub mod generator;
pub mod ollama;

pub use generator::{GenerationParams, Generator, GeneratorError};
pub use ollama::OllamaGenerator;
