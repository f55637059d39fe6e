//! Widget server: the browser-facing presentation loop.
//!
//! Serves a single embedded HTML page and one JSON endpoint. The browser
//! owns the transcript — every request carries the full history plus the
//! new message, and the reply is appended client-side, so the server keeps
//! no per-visitor state. Clearing the chat is purely a client action.
//!
//! `POST /api/chat` inherits the interactive flow's never-fails contract:
//! provider errors come back as a normal reply whose text describes the
//! error. A request with an unrecognized turn role is rejected outright
//! by deserialization.

use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use gembot_core::chat;
use gembot_core::history::Transcript;
use gembot_core::invoke::Invoker;

/// The complete widget: textbox, transcript display, submit, clear.
const WIDGET_HTML: &str = include_str!("widget.html");

#[derive(Clone)]
pub struct AppState {
    invoker: Arc<Invoker>,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    /// Conversation so far, oldest first.
    #[serde(default)]
    history: Transcript,
    /// The new user message.
    message: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    reply: String,
}

/// Build the widget router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/chat", post(chat_endpoint))
        .with_state(state)
}

/// Bind and serve until ctrl-c.
pub async fn run(invoker: Arc<Invoker>, host: &str, port: u16) -> Result<()> {
    let state = AppState { invoker };
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(addr = %addr, "Widget server listening");
    println!("  gembot widget: http://{addr}/");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Widget server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

async fn index() -> Html<&'static str> {
    Html(WIDGET_HTML)
}

async fn health() -> &'static str {
    "ok"
}

/// One exchange. Always answers 200 with a reply; errors are folded into
/// the reply text per the interactive-flow contract.
async fn chat_endpoint(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let model = state.invoker.fast_handle().await;
    let reply = chat::exchange(model.as_ref(), &request.history, &request.message).await;
    Json(ChatResponse {
        reply: reply.display_text(),
    })
}
