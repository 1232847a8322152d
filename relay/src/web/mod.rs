//! Web server module for relaying GitHub webhooks.
//!
//! This module provides a small web server that:
//! - Receives GitHub webhook deliveries on any path
//! - Verifies the HMAC signature
//! - Drops noisy events
//! - Forwards everything else to Discord and relays the answer

pub mod error;
pub mod handlers;
pub mod signature;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::trace::TraceLayer;

pub use error::RelayError;
pub use handlers::{relay_webhook, AppState, EVENT_HEADER};
pub use signature::{sign_github_payload, verify_github_signature, SIGNATURE_HEADER};

/// Build the router. Deliveries are accepted on any path.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        .fallback(relay_webhook)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
