//! Forwarding deliveries to the Discord webhook.
//!
//! The sink receives the original bytes and headers; its reply is handed
//! back to GitHub unchanged apart from connection-level headers.

use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use reqwest::Client;
use thiserror::Error;
use tracing::{error, info};
use url::Url;

/// Errors raised while talking to the sink.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("sink request timed out after {0:?}")]
    Timeout(Duration),

    #[error("sink request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

/// Headers that describe a single connection rather than the message, plus
/// those the HTTP client recomputes itself.
fn is_forwardable(name: &HeaderName) -> bool {
    !matches!(
        name.as_str(),
        "host"
            | "content-length"
            | "connection"
            | "keep-alive"
            | "proxy-connection"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
            | "accept-encoding"
    )
}

/// Copy every header that is safe to pass across the relay.
pub fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    headers
        .iter()
        .filter(|(name, _)| is_forwardable(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// The sink's reply, buffered so it can be relayed in one piece.
#[derive(Debug)]
pub struct SinkResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IntoResponse for SinkResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = forwardable_headers(&self.headers);
        response
    }
}

/// HTTP client bound to one sink URL.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct Forwarder {
    client: Client,
    url: Url,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, ForwardError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ForwardError::Client)?;

        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    /// POST `body` to the sink with the given inbound headers.
    ///
    /// Exactly one attempt is made; failures are returned, not retried.
    pub async fn forward(
        &self,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<SinkResponse, ForwardError> {
        let body_length = body.len();

        let result = self
            .client
            .post(self.url.clone())
            .headers(forwardable_headers(headers))
            .body(body)
            .send()
            .await;

        let response = match result {
            Ok(resp) => resp,
            Err(e) => return Err(self.classify(e)),
        };

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| self.classify(e))?;

        info!(
            status_code = status.as_u16(),
            request_length = body_length,
            response_length = body.len(),
            "sink_request_complete"
        );

        Ok(SinkResponse {
            status,
            headers,
            body,
        })
    }

    fn classify(&self, e: reqwest::Error) -> ForwardError {
        // Never log the URL: it embeds the webhook token
        let e = e.without_url();
        if e.is_timeout() {
            error!(
                timeout_seconds = self.timeout.as_secs_f64(),
                error = %e,
                "sink_request_timeout"
            );
            ForwardError::Timeout(self.timeout)
        } else {
            error!(error = %e, "sink_request_failed");
            ForwardError::Transport(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    #[test]
    fn test_forwardable_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("relay.example.org"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("2"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-github-event", HeaderValue::from_static("push"));
        headers.insert("x-github-delivery", HeaderValue::from_static("72d3162e"));
        headers.insert("x-hub-signature-256", HeaderValue::from_static("sha256=00"));

        let forwarded = forwardable_headers(&headers);

        assert_eq!(forwarded.len(), 4);
        assert!(forwarded.get(header::HOST).is_none());
        assert!(forwarded.get(header::CONTENT_LENGTH).is_none());
        assert!(forwarded.get("keep-alive").is_none());
        assert_eq!(forwarded.get("x-github-event").unwrap(), "push");
        assert_eq!(forwarded.get("x-hub-signature-256").unwrap(), "sha256=00");
    }

    #[test]
    fn test_forwardable_headers_keeps_repeats() {
        let mut headers = HeaderMap::new();
        headers.append(header::SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::SET_COOKIE, HeaderValue::from_static("b=2"));

        let forwarded = forwardable_headers(&headers);
        assert_eq!(forwarded.get_all(header::SET_COOKIE).iter().count(), 2);
    }

    #[test]
    fn test_sink_response_into_response() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("4"));

        let response = SinkResponse {
            status: StatusCode::TOO_MANY_REQUESTS,
            headers,
            body: Bytes::from_static(br#"{"retry_after":1.5}"#),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("x-ratelimit-remaining").unwrap(), "4");
        assert!(response.headers().get(header::TRANSFER_ENCODING).is_none());
    }
}
