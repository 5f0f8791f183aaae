//! HTTP route handlers for the chatbot API.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::ChatbotError;

use super::state::AppState;

/// Acknowledgement returned by the feedback endpoint.
pub const FEEDBACK_ACK: &str = "Feedback received and conversations updated";

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/chatbot/chat", post(chat))
        .route("/chatbot/feedback", post(feedback))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let conversations = state.store.len().await;
    Json(serde_json::json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "conversations": conversations
    }))
}

/// Chat request.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's message.
    pub message: String,
}

/// Chat response.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// The chatbot's reply.
    pub response: String,
}

/// Feedback request.
#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    /// The user's message.
    pub message: String,
    /// The reply the chatbot should have given.
    pub correct_response: String,
}

/// Feedback acknowledgement.
#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    /// Confirmation text.
    pub message: String,
}

/// Handle chat requests.
async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, (StatusCode, String)> {
    let Json(request) = payload.map_err(|e| bad_request(&e))?;

    let response = state
        .resolver
        .resolve(&request.message, &state.store)
        .await
        .map_err(|e| {
            error!("chat failed: {e}");
            (error_status(&e), format!("Chatbot error: {e}"))
        })?;

    Ok(Json(ChatResponse { response }))
}

/// Handle feedback submissions.
async fn feedback(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<Json<FeedbackResponse>, (StatusCode, String)> {
    let Json(request) = payload.map_err(|e| bad_request(&e))?;

    state
        .store
        .append(request.message, request.correct_response)
        .await;
    let conversations = state.store.len().await;
    debug!(conversations, "feedback stored");

    Ok(Json(FeedbackResponse {
        message: FEEDBACK_ACK.to_string(),
    }))
}

fn bad_request(rejection: &JsonRejection) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, rejection.body_text())
}

const fn error_status(err: &ChatbotError) -> StatusCode {
    match err {
        ChatbotError::GeneratorTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
