//! End-to-end tests for the chatbot HTTP API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use feedback_chatbot::config::DEFAULT_FALLBACK_MESSAGE;
use feedback_chatbot::conversation::{ConversationStore, ResponseResolver};
use feedback_chatbot::llm::{GenerationParams, Generator, GeneratorError};
use feedback_chatbot::server::{AppState, build_app};
use feedback_chatbot::server::routes::FEEDBACK_ACK;

struct CannedGenerator(&'static str);

#[async_trait]
impl Generator for CannedGenerator {
    async fn generate(
        &self,
        _prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, GeneratorError> {
        Ok(self.0.to_string())
    }
}

struct BrokenGenerator;

#[async_trait]
impl Generator for BrokenGenerator {
    async fn generate(
        &self,
        _prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, GeneratorError> {
        Err(GeneratorError::HttpStatusNotOk(503))
    }
}

struct HangingGenerator;

#[async_trait]
impl Generator for HangingGenerator {
    async fn generate(
        &self,
        _prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, GeneratorError> {
        std::future::pending::<()>().await;
        Ok(String::new())
    }
}

fn static_state() -> Arc<AppState> {
    AppState::from_parts(
        ConversationStore::seed(),
        ResponseResolver::with_static(DEFAULT_FALLBACK_MESSAGE),
    )
}

fn generative_state(generator: Arc<dyn Generator>, timeout: Duration) -> Arc<AppState> {
    AppState::from_parts(
        ConversationStore::seed(),
        ResponseResolver::with_generator(generator, GenerationParams::default(), timeout),
    )
}

async fn post(app: &Router, uri: &str, body: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn chat(app: &Router, message: &str) -> (StatusCode, Value) {
    let (status, body) = post(app, "/chatbot/chat", &json!({ "message": message }).to_string()).await;
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

async fn feedback(app: &Router, message: &str, correct_response: &str) -> (StatusCode, Value) {
    let body = json!({ "message": message, "correct_response": correct_response }).to_string();
    let (status, body) = post(app, "/chatbot/feedback", &body).await;
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn chat_returns_known_response() {
    let app = build_app(static_state());

    let (status, body) = chat(&app, "Do you believe in God?").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "response": "As an AI, I don't have personal beliefs. This is a complex topic with many perspectives."
        })
    );
}

#[tokio::test]
async fn chat_matches_message_inside_pattern_only() {
    let app = build_app(static_state());

    let (_, body) = chat(&app, "hi").await;
    assert_eq!(body["response"], "Hello! How can I help you today?");

    let (_, body) = chat(&app, "Hi there! Nice to meet you").await;
    assert_eq!(body["response"], DEFAULT_FALLBACK_MESSAGE);
}

#[tokio::test]
async fn feedback_teaches_new_response() {
    let app = build_app(static_state());

    let (_, body) = chat(&app, "banana").await;
    assert_eq!(body["response"], DEFAULT_FALLBACK_MESSAGE);

    let (status, body) = feedback(&app, "banana", "I like bananas!").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": FEEDBACK_ACK }));

    let (_, body) = chat(&app, "banana").await;
    assert_eq!(body["response"], "I like bananas!");
}

#[tokio::test]
async fn malformed_requests_are_bad_requests() {
    let app = build_app(static_state());

    let (status, _) = post(&app, "/chatbot/chat", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(&app, "/chatbot/chat", r#"{"text": "hi"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(&app, "/chatbot/feedback", r#"{"message": "hi"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn generative_fallback_is_returned_verbatim() {
    let app = build_app(generative_state(
        Arc::new(CannedGenerator("Bananas are yellow.")),
        Duration::from_secs(1),
    ));

    let (status, body) = chat(&app, "banana").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Bananas are yellow.");
}

#[tokio::test]
async fn generator_failure_is_a_server_error() {
    let app = build_app(generative_state(
        Arc::new(BrokenGenerator),
        Duration::from_secs(1),
    ));

    let (status, _) = post(&app, "/chatbot/chat", r#"{"message": "banana"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    // Matched messages never touch the generator.
    let (status, _) = chat(&app, "hi").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn generator_timeout_is_a_gateway_timeout() {
    let app = build_app(generative_state(
        Arc::new(HangingGenerator),
        Duration::from_millis(50),
    ));

    let (status, _) = post(&app, "/chatbot/chat", r#"{"message": "banana"}"#).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn cors_preflight_allows_any_origin() {
    let app = build_app(static_state());

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/chatbot/chat")
        .header(header::ORIGIN, "http://example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );

    // Simple cross-origin requests carry the header too.
    let request = Request::builder()
        .method("POST")
        .uri("/chatbot/chat")
        .header(header::ORIGIN, "http://example.com")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"message": "hi"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn health_reports_conversation_count() {
    let state = static_state();
    let app = build_app(Arc::clone(&state));

    feedback(&app, "banana", "I like bananas!").await;

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["conversations"], 10);
    assert_eq!(state.store.len().await, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_feedback_loses_no_updates() {
    const N: usize = 32;
    let state = static_state();
    let app = build_app(Arc::clone(&state));
    let seeded = state.store.len().await;

    let submissions = (0..N).map(|i| {
        let app = app.clone();
        tokio::spawn(async move {
            feedback(&app, &format!("zebra #{i}#"), &format!("stripes #{i}#")).await
        })
    });
    for result in futures::future::join_all(submissions).await {
        let (status, _) = result.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(state.store.len().await, seeded + N);

    let lookups = (0..N).map(|i| {
        let app = app.clone();
        tokio::spawn(async move {
            let (_, body) = chat(&app, &format!("zebra #{i}#")).await;
            (i, body)
        })
    });
    for result in futures::future::join_all(lookups).await {
        let (i, body) = result.unwrap();
        assert_eq!(body["response"], format!("stripes #{i}#"));
    }
}
