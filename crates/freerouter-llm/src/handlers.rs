//! HTTP endpoint dispatch
//!
//! The OpenAI-compatible surface plus operational endpoints: health, stats,
//! masked config, and the two reload triggers.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use freerouter_core::{HttpError, redact_config};
use http::StatusCode;

use crate::error::ProxyError;
use crate::pipeline;
use crate::protocol::openai::{OpenAiModel, OpenAiModelList};
use crate::state::AppState;
use crate::AUTO_MODEL;

/// Build the router with all endpoints
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/chat/completions", routing::post(chat_completions))
        .route("/chat/completions", routing::post(chat_completions))
        .route("/v1/models", routing::get(list_models))
        .route("/models", routing::get(list_models))
        .route("/health", routing::get(health))
        .route("/stats", routing::get(stats))
        .route("/config", routing::get(config))
        .route("/reload", routing::post(reload))
        .route("/reload-config", routing::post(reload_config))
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .with_state(state)
}

/// Convert a proxy error to an OpenAI-style JSON error response
pub fn error_response(error: &ProxyError) -> Response {
    let status = error.status_code();
    let body = serde_json::json!({
        "error": {
            "message": error.client_message(),
            "type": error.error_type(),
            "code": status.as_u16(),
        }
    });
    (status, Json(body)).into_response()
}

/// Handle `POST /v1/chat/completions`
async fn chat_completions(State(state): State<AppState>, body: Bytes) -> Response {
    pipeline::handle_chat(state, body).await
}

/// Handle `GET /v1/models`
///
/// Lists `auto` plus every model configured in the active tier tables and
/// catalog overrides.
async fn list_models(State(state): State<AppState>) -> Response {
    let snapshot = state.snapshot().await;
    let config = &snapshot.config;

    let now = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);

    let mut ids = vec![AUTO_MODEL.to_owned()];
    let tables = std::iter::once(&config.tiers).chain(config.agentic_tiers.as_ref());
    for table in tables {
        for (_, entry) in table.entries() {
            for model in std::iter::once(&entry.primary).chain(&entry.fallback) {
                if !ids.contains(model) {
                    ids.push(model.clone());
                }
            }
        }
    }
    for profile in &config.models {
        if !ids.contains(&profile.id) {
            ids.push(profile.id.clone());
        }
    }

    let data = ids
        .into_iter()
        .map(|id| OpenAiModel {
            id,
            object: "model".to_owned(),
            created: now,
            owned_by: "freerouter".to_owned(),
        })
        .collect();

    Json(OpenAiModelList {
        object: "list".to_owned(),
        data,
    })
    .into_response()
}

/// Handle `GET /health`
async fn health(State(state): State<AppState>) -> Response {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime": state.uptime_secs(),
        "stats": state.stats().snapshot(),
    }))
    .into_response()
}

/// Handle `GET /stats`
async fn stats(State(state): State<AppState>) -> Response {
    Json(state.stats().snapshot()).into_response()
}

/// Handle `GET /config`: active config with credentials masked
async fn config(State(state): State<AppState>) -> Response {
    let snapshot = state.snapshot().await;
    match serde_json::to_value(&snapshot.config) {
        Ok(value) => Json(redact_config(&value)).into_response(),
        Err(e) => error_response(&ProxyError::Internal(anyhow::anyhow!("config serialization failed: {e}"))),
    }
}

/// Handle `POST /reload`: reload credentials only
async fn reload(State(state): State<AppState>) -> Response {
    state.reload_credentials().await;
    Json(serde_json::json!({"status": "ok", "reloaded": "credentials"})).into_response()
}

/// Handle `POST /reload-config`: reload config file and credentials
async fn reload_config(State(state): State<AppState>) -> Response {
    match state.reload_config().await {
        Ok(()) => Json(serde_json::json!({"status": "ok", "reloaded": "config"})).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": {
                    "message": e.to_string(),
                    "type": "invalid_request_error",
                    "code": 400,
                }
            })),
        )
            .into_response(),
    }
}

/// Fallback for unknown path/method combinations
async fn not_found() -> Response {
    error_response(&ProxyError::NotFound)
}
