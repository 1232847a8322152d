//! Relay endpoint handlers.
//!
//! Each delivery goes through one linear pipeline:
//! 1. Method gate (POST only)
//! 2. Signature verification over the raw body
//! 3. Event-only filter (workflow events)
//! 4. JSON parse
//! 5. Payload filter
//! 6. Forward to Discord, or answer 204

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::MalformedPayloadPolicy;
use crate::filter::{evaluate, suppressed_event, GithubEvent, SuppressReason, Verdict};
use crate::forward::{ForwardError, Forwarder};
use crate::web::error::RelayError;
use crate::web::signature::{verify_github_signature, SIGNATURE_HEADER};
use crate::Config;

/// Header naming the event type.
pub const EVENT_HEADER: &str = "x-github-event";

/// Header carrying GitHub's unique delivery id, used for log correlation.
pub const DELIVERY_HEADER: &str = "x-github-delivery";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub forwarder: Forwarder,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, ForwardError> {
        let forwarder = Forwarder::new(config.sink_url(), config.request_timeout())?;
        Ok(Self {
            config: Arc::new(config),
            forwarder,
        })
    }
}

// =============================================================================
// GitHub Relay
// =============================================================================

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// GitHub webhook relay endpoint.
///
/// The body is taken as raw bytes: the signature covers the exact bytes
/// GitHub sent, and those same bytes are what Discord receives.
pub async fn relay_webhook(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RelayError> {
    if method != Method::POST {
        info!(method = %method, "relay_method_not_allowed");
        return Err(RelayError::MethodNotAllowed);
    }

    let delivery = header_str(&headers, DELIVERY_HEADER);
    let event = GithubEvent::from_header(header_str(&headers, EVENT_HEADER));

    info!(
        delivery = %delivery,
        event = %event,
        body_length = body.len(),
        "relay_received"
    );

    let signature = header_str(&headers, SIGNATURE_HEADER);
    if !verify_github_signature(&state.config.github_secret, &body, signature) {
        warn!(delivery = %delivery, event = %event, "relay_signature_mismatch");
        return Err(RelayError::Unauthorized);
    }

    if let Some(reason) = suppressed_event(&event) {
        return Ok(suppressed(delivery, &event, reason));
    }

    match serde_json::from_slice::<Value>(&body) {
        Ok(payload) => {
            if let Verdict::Suppress(reason) = evaluate(&event, &payload, &state.config.filter) {
                return Ok(suppressed(delivery, &event, reason));
            }
        }
        Err(e) => {
            let status = match state.config.malformed_payload_policy {
                MalformedPayloadPolicy::BadRequest => StatusCode::BAD_REQUEST,
                MalformedPayloadPolicy::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
                MalformedPayloadPolicy::Forward => {
                    warn!(
                        delivery = %delivery,
                        event = %event,
                        error = %e,
                        "relay_malformed_payload_forwarded"
                    );
                    return forward(&state, &headers, body, delivery, &event).await;
                }
            };
            warn!(
                delivery = %delivery,
                event = %event,
                error = %e,
                status_code = status.as_u16(),
                "relay_malformed_payload"
            );
            return Err(RelayError::MalformedPayload { status, source: e });
        }
    }

    forward(&state, &headers, body, delivery, &event).await
}

fn suppressed(delivery: &str, event: &GithubEvent, reason: SuppressReason) -> Response {
    info!(
        delivery = %delivery,
        event = %event,
        reason = reason.as_str(),
        "relay_suppressed"
    );
    StatusCode::NO_CONTENT.into_response()
}

async fn forward(
    state: &AppState,
    headers: &HeaderMap,
    body: Bytes,
    delivery: &str,
    event: &GithubEvent,
) -> Result<Response, RelayError> {
    let sink = state.forwarder.forward(headers, body).await?;

    info!(
        delivery = %delivery,
        event = %event,
        status_code = sink.status.as_u16(),
        "relay_forwarded"
    );

    Ok(sink.into_response())
}
