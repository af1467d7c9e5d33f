//! HTTP chat surface.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Minimal browser chat page |
//! | `POST` | `/chat` | `{"message": ...}` → `{success, message, user_message}` |
//! | `GET`  | `/health` | Collection name and size, or 500 when the store is down |
//!
//! `/chat` is stateless: each request is answered without history. Errors
//! never leak; the body carries a fixed apology with `success: false`.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::pipeline::Pipeline;

const INDEX_HTML: &str = include_str!("../assets/index.html");

pub const EMPTY_MESSAGE_REPLY: &str = "메시지를 입력해주세요.";
pub const REQUEST_FAILURE_REPLY: &str = "죄송합니다. 일시적인 오류가 발생했습니다.";

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }
}

/// Build the router without binding; used by `run_server` and tests.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_index))
        .route("/chat", post(handle_chat))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Bind to `[server].bind` and serve until the process is stopped.
pub async fn run_server(config: &Config, pipeline: Arc<Pipeline>) -> anyhow::Result<()> {
    let app = router(AppState::new(pipeline));

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    println!("Chat server listening on http://{}", config.server.bind);
    tracing::info!(bind = %config.server.bind, "server started");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_message: Option<String>,
}

impl ChatResponse {
    fn failure(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            user_message: None,
        }
    }
}

async fn handle_chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Json<ChatResponse> {
    let request = match body {
        Ok(Json(req)) => req,
        Err(e) => {
            tracing::warn!(error = %e, "rejected chat request body");
            return Json(ChatResponse::failure(REQUEST_FAILURE_REPLY));
        }
    };

    let user_message = request.message.trim().to_string();
    if user_message.is_empty() {
        return Json(ChatResponse::failure(EMPTY_MESSAGE_REPLY));
    }

    let reply = state.pipeline.respond(&user_message, None).await;
    Json(ChatResponse {
        success: true,
        message: reply,
        user_message: Some(user_message),
    })
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum HealthResponse {
    Healthy {
        status: &'static str,
        document_count: i64,
        collection_name: String,
    },
    Unhealthy {
        status: &'static str,
        error: String,
    },
}

async fn handle_health(State(state): State<AppState>) -> Response {
    match state.pipeline.store().info().await {
        Ok(info) => Json(HealthResponse::Healthy {
            status: "healthy",
            document_count: info.document_count,
            collection_name: info.collection_name,
        })
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(HealthResponse::Unhealthy {
                status: "unhealthy",
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}
