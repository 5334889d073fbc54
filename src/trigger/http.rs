//! HTTP control API for on-demand profiling.
//!
//! | Method & path          | Body                        | Outcome |
//! |------------------------|-----------------------------|---------|
//! | `POST /profile/start`  | `{"duration": secs}` (opt.) | 200 / 400 |
//! | `POST /profile/stop`   | —                           | 200 / 400 |
//! | `GET  /profile/status` | —                           | 200 `{"active": bool}` |
//! | `GET  /health`         | —                           | 200 `ok` |
//!
//! Wrong methods on registered paths answer 405 via axum's method
//! router. Malformed or missing optional fields fall back to the
//! configured default duration, never a request failure.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::session::{ProfilingResult, SessionController};
use crate::{AppError, Result};

/// Shared state for the trigger handlers.
#[derive(Clone)]
struct HttpTriggerState {
    controller: Arc<SessionController>,
    default_duration_seconds: u64,
}

/// Handler for `GET /health` — liveness probe, no session involvement.
async fn health() -> &'static str {
    "ok"
}

/// Extract the requested duration from an optional JSON body.
///
/// Empty body, invalid JSON, a missing `duration` field, or a
/// non-integer value all fall back to `default_seconds`.
fn duration_from_body(body: &[u8], default_seconds: u64) -> u64 {
    if body.is_empty() {
        return default_seconds;
    }
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| value.get("duration")?.as_u64())
        .unwrap_or(default_seconds)
}

/// Map a controller result onto the wire contract.
fn to_response(result: &ProfilingResult) -> (StatusCode, Json<Value>) {
    if result.success {
        (
            StatusCode::OK,
            Json(json!({ "success": true, "message": result.message })),
        )
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": result.message })),
        )
    }
}

async fn start(State(state): State<HttpTriggerState>, body: Bytes) -> (StatusCode, Json<Value>) {
    let duration = duration_from_body(&body, state.default_duration_seconds);
    debug!(duration, "http start trigger");
    let result = state.controller.start(duration).await;
    to_response(&result)
}

async fn stop(State(state): State<HttpTriggerState>) -> (StatusCode, Json<Value>) {
    debug!("http stop trigger");
    let result = state.controller.stop().await;
    to_response(&result)
}

async fn status(State(state): State<HttpTriggerState>) -> Json<Value> {
    Json(json!({ "active": state.controller.status() }))
}

/// Build the control-API router over a shared controller.
#[must_use]
pub fn router(controller: Arc<SessionController>, default_duration_seconds: u64) -> Router {
    let state = HttpTriggerState {
        controller,
        default_duration_seconds,
    };
    Router::new()
        .route("/profile/start", post(start))
        .route("/profile/stop", post(stop))
        .route("/profile/status", get(status))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind the control-API listener on the loopback interface.
///
/// # Errors
///
/// Returns `AppError::Trigger` when the port cannot be bound; the
/// daemon disables this trigger surface and continues.
pub async fn bind(port: u16) -> Result<TcpListener> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::Trigger(format!("failed to bind HTTP trigger on {addr}: {err}")))
}

/// Serve the control API until the token is cancelled.
///
/// # Errors
///
/// Returns `AppError::Trigger` when the server loop fails.
pub async fn serve(
    listener: TcpListener,
    controller: Arc<SessionController>,
    default_duration_seconds: u64,
    ct: CancellationToken,
) -> Result<()> {
    let local = listener
        .local_addr()
        .map_err(|err| AppError::Trigger(format!("listener address unavailable: {err}")))?;
    info!(%local, "HTTP trigger listening");

    axum::serve(listener, router(controller, default_duration_seconds))
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(|err| AppError::Trigger(format!("HTTP trigger server error: {err}")))?;

    info!("HTTP trigger shut down");
    Ok(())
}
