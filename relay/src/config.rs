//! Configuration module for environment variable parsing.
//!
//! Everything the relay needs is read once at startup into a [`Config`],
//! which is then handed to the router as shared state.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::filter::FilterRules;

/// Default base URL for Discord webhook executions.
pub const DEFAULT_DISCORD_API_BASE: &str = "https://discord.com/api/webhooks";

/// GitHub caps webhook payloads at 25 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("{name} is not a valid base URL: {value}")]
    InvalidUrl { name: &'static str, value: String },
}

/// What to do with a correctly signed delivery whose body is not JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedPayloadPolicy {
    /// Answer 400 Bad Request.
    BadRequest,
    /// Answer 422 Unprocessable Entity.
    Unprocessable,
    /// Skip filtering and relay the raw bytes as-is.
    Forward,
}

impl MalformedPayloadPolicy {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "bad_request" | "400" | "reject" => Some(Self::BadRequest),
            "unprocessable" | "422" => Some(Self::Unprocessable),
            "forward" => Some(Self::Forward),
            _ => None,
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Shared secret GitHub signs deliveries with
    pub github_secret: String,

    /// Discord webhook id (first path segment of the sink)
    pub discord_webhook_id: String,

    /// Discord webhook token (second path segment of the sink)
    pub discord_webhook_token: String,

    /// Base URL the webhook id and token are appended to
    pub discord_api_base: Url,

    /// Timeout for the outbound call to Discord, in milliseconds
    pub request_timeout_ms: u64,

    /// Largest inbound body accepted, in bytes
    pub max_body_bytes: usize,

    pub malformed_payload_policy: MalformedPayloadPolicy,

    /// Optional suppression rules
    pub filter: FilterRules,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let base = lookup("DISCORD_API_BASE")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DISCORD_API_BASE.to_string());
        let discord_api_base = match Url::parse(base.trim()) {
            Ok(url) if !url.cannot_be_a_base() => url,
            _ => {
                return Err(ConfigError::InvalidUrl {
                    name: "DISCORD_API_BASE",
                    value: base,
                })
            }
        };

        let defaults = FilterRules::default();

        Ok(Config {
            port: parse_or("PORT", &lookup, 8080),

            github_secret: required("GITHUB_SECRET")?,

            discord_webhook_id: required("DISCORD_WEBHOOK_ID")?,

            discord_webhook_token: required("DISCORD_WEBHOOK_TOKEN")?,

            discord_api_base,

            request_timeout_ms: parse_or("REQUEST_TIMEOUT_MS", &lookup, 10_000),

            max_body_bytes: parse_or("MAX_BODY_BYTES", &lookup, DEFAULT_MAX_BODY_BYTES),

            malformed_payload_policy: match lookup("MALFORMED_PAYLOAD_POLICY") {
                None => MalformedPayloadPolicy::BadRequest,
                Some(raw) => MalformedPayloadPolicy::parse(&raw).unwrap_or_else(|| {
                    warn!(
                        env_var = "MALFORMED_PAYLOAD_POLICY",
                        value = %raw,
                        "Invalid policy, using default"
                    );
                    MalformedPayloadPolicy::BadRequest
                }),
            },

            filter: FilterRules {
                dependabot_branches: parse_bool(
                    "FILTER_DEPENDABOT_BRANCHES",
                    &lookup,
                    defaults.dependabot_branches,
                ),
                dependabot_sender_id: parse_or(
                    "DEPENDABOT_SENDER_ID",
                    &lookup,
                    defaults.dependabot_sender_id,
                ),
            },
        })
    }

    /// Full sink URL: `{base}/{id}/{token}/github`.
    ///
    /// The `/github` suffix selects Discord's GitHub-compatible endpoint.
    pub fn sink_url(&self) -> Url {
        let mut url = self.discord_api_base.clone();
        // cannot_be_a_base was rejected while loading
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(&self.discord_webhook_id)
                .push(&self.discord_webhook_token)
                .push("github");
        }
        url
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("github_secret", &"<redacted>")
            .field("discord_webhook_id", &self.discord_webhook_id)
            .field("discord_webhook_token", &"<redacted>")
            .field("discord_api_base", &self.discord_api_base.as_str())
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("malformed_payload_policy", &self.malformed_payload_policy)
            .field("filter", &self.filter)
            .finish()
    }
}

/// Parse a value with `FromStr`, warning and falling back on bad input.
fn parse_or<T, F>(name: &str, lookup: &F, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = match lookup(name) {
        Some(v) => v,
        None => return default,
    };

    match raw.trim().parse::<T>() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

/// Parse a boolean flag such as "true", "0" or "off".
fn parse_bool<F>(name: &str, lookup: &F, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    let raw = match lookup(name) {
        Some(v) => v,
        None => return default,
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!(env_var = name, value = %raw, "Invalid flag, using default");
            default
        }
    }
}

/// Build a lookup closure over fixed pairs, for use with [`Config::from_lookup`].
pub fn lookup_from_pairs<'a, I>(pairs: I) -> impl Fn(&str) -> Option<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let map: HashMap<String, String> = pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}
