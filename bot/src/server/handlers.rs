//! HTTP request handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::{debug, warn};

use webhook_events::WebhookEvent;

use crate::events::dispatch::dispatch;
use crate::events::signature::{verify_signature, SIGNATURE_HEADER};
use crate::server::state::ServerState;
use crate::utils::{generate_uuid, version_info};

/// Header naming the event type of a delivery
pub const EVENT_HEADER: &str = "x-github-event";

/// Header carrying the unique delivery id
pub const DELIVERY_HEADER: &str = "x-github-delivery";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub last_delivery_at: Option<u64>,
}

/// Health check handler
pub async fn health_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "deploybot".to_string(),
        version: version.version,
        last_delivery_at: state.app.activity_tracker.last_touched(),
    })
}

/// Version response
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    let version = version_info();
    Json(VersionResponse {
        version: version.version,
        git_hash: version.git_hash,
        build_time: version.build_time,
    })
}

/// Webhook acknowledgement
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub accepted: bool,
    pub event: String,
    pub delivery: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn reject(status: StatusCode, error: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Webhook intake: verify, parse, acknowledge, then process in the background
pub async fn webhook_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    if let Some(secret) = &state.webhook_secret {
        let signature = header(&headers, SIGNATURE_HEADER)
            .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "missing signature"))?;
        verify_signature(&body, signature, secret.expose_secret()).map_err(|e| {
            warn!("Rejected webhook delivery: {}", e);
            reject(StatusCode::UNAUTHORIZED, "invalid signature")
        })?;
    }

    let event_name = header(&headers, EVENT_HEADER)
        .ok_or_else(|| reject(StatusCode::BAD_REQUEST, "missing X-GitHub-Event header"))?
        .to_string();
    let delivery = header(&headers, DELIVERY_HEADER)
        .map(str::to_string)
        .unwrap_or_else(generate_uuid);

    let event = WebhookEvent::parse(&event_name, &body).map_err(|e| {
        warn!("[{}] Malformed {} payload: {}", delivery, event_name, e);
        reject(StatusCode::BAD_REQUEST, format!("malformed payload: {e}"))
    })?;

    let accepted = !matches!(event, WebhookEvent::Other(_));
    if accepted {
        let app = state.app.clone();
        let delivery = delivery.clone();
        tokio::spawn(async move {
            let outcome = dispatch(&app, &delivery, event).await;
            debug!("[{}] Delivery handled: {:?}", delivery, outcome);
        });
    } else {
        debug!("[{}] Ignoring {} event", delivery, event_name);
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(WebhookResponse {
            accepted,
            event: event_name,
            delivery,
        }),
    ))
}
