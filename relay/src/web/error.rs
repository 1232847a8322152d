//! Relay error type and its HTTP mapping.
//!
//! Every error response has an empty body. In particular a missing signature
//! and a wrong one are indistinguishable to the caller.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::forward::ForwardError;

#[derive(Debug, Error)]
pub enum RelayError {
    /// Anything other than POST.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// Signature absent or wrong.
    #[error("signature verification failed")]
    Unauthorized,

    /// Authenticated body that is not JSON.
    #[error("payload is not valid JSON")]
    MalformedPayload {
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },

    /// The sink could not be reached.
    #[error(transparent)]
    Forward(#[from] ForwardError),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::MalformedPayload { status, .. } => *status,
            Self::Forward(ForwardError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            Self::Forward(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let mut response = self.status().into_response();
        if matches!(self, Self::MethodNotAllowed) {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("POST"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        assert_eq!(RelayError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(RelayError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            RelayError::Forward(ForwardError::Timeout(Duration::from_secs(1))).status(),
            StatusCode::GATEWAY_TIMEOUT
        );

        let source = serde_json::from_slice::<serde_json::Value>(b"{").unwrap_err();
        let err = RelayError::MalformedPayload {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            source,
        };
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_method_not_allowed_sets_allow() {
        let response = RelayError::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "POST");
    }
}
