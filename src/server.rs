//! HTTP chat host.
//!
//! Exposes the engine over a small JSON API so a web chat widget can talk
//! to it.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/chat` | Answer a question: `{"question": "..."}` → `{"answer": "..."}` |
//! | `GET`  | `/stats` | Engine stats, or `{"error": ...}` when unavailable |
//! | `POST` | `/reindex` | Reset and rebuild the vector store |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! A failing `/stats` or `/reindex` responds with an `error` key rather
//! than an HTTP 5xx page; callers treat the presence of `error` as "the
//! engine is not usable". `/chat` itself never fails; the engine
//! guarantees an answer string for any question.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser-based chat
//! widgets can call the API cross-origin.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::engine::RagEngine;

#[derive(Clone)]
struct AppState {
    engine: Arc<RagEngine>,
}

/// Serve the chat API on `bind` until the process is terminated.
pub async fn run_server(engine: RagEngine, bind: &str) -> anyhow::Result<()> {
    let state = AppState {
        engine: Arc::new(engine),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/chat", post(chat_handler))
        .route("/stats", get(stats_handler))
        .route("/reindex", post(reindex_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(bind, "chat server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Deserialize)]
struct ChatRequest {
    question: String,
}

async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    let question = request.question.trim();
    if question.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "question must not be empty"})),
        );
    }

    let answer = state.engine.query(question).await;
    (StatusCode::OK, Json(json!({ "answer": answer })))
}

async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.engine.get_stats().await {
        Ok(stats) => (StatusCode::OK, Json(json!(stats))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        ),
    }
}

async fn reindex_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.engine.reset_vector_store().await {
        (StatusCode::OK, Json(json!({"ok": true})))
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"ok": false, "error": "reindex failed"})),
        )
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
