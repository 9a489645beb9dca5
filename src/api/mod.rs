// HTTP surface: the Discord interactions endpoint plus health and metrics.

pub mod handlers;

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ed25519_dalek::VerifyingKey;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::discord::interaction::{
    verify_request, Interaction, InteractionResponse, SignatureError,
    INTERACTION_APPLICATION_COMMAND, INTERACTION_PING, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
use crate::discord::ChatClient;
use crate::guilds::GuildDirectory;
use crate::metrics;
use crate::scores::ScoreStore;

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn ChatClient>,
    pub guilds: Arc<GuildDirectory>,
    pub scores: Arc<ScoreStore>,
    pub public_key: VerifyingKey,
    /// Group called out in the standings.
    pub highlight: Arc<str>,
}

// ── Error helper ──────────────────────────────────────────────────────

fn json_error(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "error": msg }))).into_response()
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_text))
        .route("/interactions", post(interactions))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "crew-bot" }))
}

async fn metrics_text() -> impl IntoResponse {
    (
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::gather_metrics(),
    )
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn check_signature(
    key: &VerifyingKey,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), SignatureError> {
    let signature = header_str(headers, SIGNATURE_HEADER).ok_or(SignatureError::Missing)?;
    let timestamp = header_str(headers, TIMESTAMP_HEADER).ok_or(SignatureError::Missing)?;
    verify_request(key, signature, timestamp, body)
}

/// Entry point for every interaction Discord delivers.
///
/// Requests are rejected with 401 unless signed by the application key;
/// Discord itself probes the endpoint with bad signatures before accepting it.
async fn interactions(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Err(e) = check_signature(&state.public_key, &headers, &body) {
        metrics::SIGNATURE_REJECTIONS_TOTAL.inc();
        tracing::warn!("rejected interaction: {e}");
        return json_error(StatusCode::UNAUTHORIZED, "invalid request signature");
    }

    let interaction: Interaction = match serde_json::from_slice(&body) {
        Ok(i) => i,
        Err(e) => {
            tracing::warn!("undecodable interaction payload: {e}");
            return json_error(StatusCode::BAD_REQUEST, "invalid interaction payload");
        }
    };

    let kind = interaction.kind;
    match kind {
        INTERACTION_PING => Json(InteractionResponse::pong()).into_response(),
        INTERACTION_APPLICATION_COMMAND => {
            Json(handlers::respond(&state, interaction).await).into_response()
        }
        other => {
            tracing::debug!(kind = other, "ignoring unsupported interaction type");
            json_error(StatusCode::BAD_REQUEST, "unsupported interaction type")
        }
    }
}
