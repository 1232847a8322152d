//! GitHub → Discord webhook relay.
//!
//! Authenticates GitHub webhook deliveries, filters out the noisy ones and
//! forwards the rest, byte for byte, to a Discord webhook.
//!
//! ## Pipeline
//!
//! ```text
//! GitHub → method gate → signature → JSON parse → filter → Discord
//!                 405          401         400/422      204
//! ```

pub mod config;
pub mod filter;
pub mod forward;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError, MalformedPayloadPolicy};
pub use filter::{evaluate, suppressed_event, FilterRules, GithubEvent, SuppressReason, Verdict};
pub use forward::{ForwardError, Forwarder, SinkResponse};
pub use web::{router, AppState, RelayError};
