//! HTTP front end
//!
//! Provides:
//! - `POST /api/chat` - answer a question, returning the intermediate queries and results
//! - `GET /health` - liveness check

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::Instrument;

use crate::assistant::Assistant;

const MISSING_MESSAGE: &str = "Falta 'message' en el body.";
const PIPELINE_FAILED: &str = "Error procesando la pregunta.";

#[derive(Clone)]
struct AppState {
    assistant: Arc<Assistant>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

pub fn router(assistant: Arc<Assistant>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/health", get(health_check))
        .with_state(AppState { assistant })
}

pub async fn serve(addr: &str, assistant: Arc<Assistant>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Manolito chat listening on http://{}", addr);

    axum::serve(listener, router(assistant)).await
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let request_id = uuid::Uuid::new_v4();

    async move {
        let message = match payload {
            Ok(Json(ChatRequest {
                message: Some(message),
            })) if !message.trim().is_empty() => message,
            Ok(_) => return error_response(StatusCode::BAD_REQUEST, MISSING_MESSAGE),
            Err(rejection) => {
                tracing::debug!(%rejection, "Rejected chat body");
                return error_response(StatusCode::BAD_REQUEST, MISSING_MESSAGE);
            }
        };

        tracing::info!(question = %message, "Chat request");

        match state.assistant.ask(&message).await {
            Ok(exchange) => (StatusCode::OK, Json(exchange)).into_response(),
            Err(err) => {
                tracing::error!(error = %err, "Chat request failed");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, PIPELINE_FAILED)
            }
        }
    }
    .instrument(tracing::info_span!("chat", %request_id))
    .await
}

async fn health_check() -> &'static str {
    "OK"
}
