//! Startup helpers for the chatbot server.

use std::process::ExitCode;

use anyhow::Context;

use crate::config::ChatbotConfig;
use crate::llm::OllamaGenerator;
use crate::server::{self, AppState};

/// Run the server (used by the `chatbot-server` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting chatbot service v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = try_run() {
        tracing::error!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

#[allow(clippy::cognitive_complexity)]
fn try_run() -> anyhow::Result<()> {
    let config = ChatbotConfig::from_env().context("Failed to load configuration")?;
    tracing::info!(
        port = config.port,
        fallback = ?config.fallback,
        "Configuration loaded"
    );

    let (state, ollama) = AppState::new(&config).context("Failed to create state")?;

    let rt = tokio::runtime::Runtime::new().context("Failed to create runtime")?;

    rt.block_on(async move {
        let conversations = state.store.len().await;
        tracing::info!(conversations, "Conversation store seeded");
        if let Some(ollama) = ollama {
            tracing::info!("Ollama endpoint: {}", config.ollama.base_url);
            probe_generator(&ollama).await;
        }

        server::run_server_with_shutdown(state, config.port, shutdown_signal())
            .await
            .context("Server error")
    })
}

/// Check that Ollama answers and load the model. Failures are logged only:
/// chat requests that need the generator will report them.
#[allow(clippy::cognitive_complexity)]
async fn probe_generator(ollama: &OllamaGenerator) {
    match ollama.is_ready().await {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!("Ollama answered /api/version with an error status");
            return;
        }
        Err(e) => {
            tracing::warn!("Ollama is not reachable: {e}");
            return;
        }
    }

    match ollama.warm_up().await {
        Ok(()) => tracing::info!("Model {} loaded", ollama.model()),
        Err(e) => tracing::warn!("Model {} warm-up failed: {e}", ollama.model()),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
