//! Application error types

use cadastre_domain::{ApiResponse, DomainError};
use thiserror::Error;

use crate::ports::TransportError;

/// Errors surfaced by the authenticated client.
///
/// Every variant that involves a response carries its status and the full
/// body, decoded lossily as UTF-8.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Login was rejected or its response lacked a token.
    #[error("login failed for {username} (HTTP {status}): {body}")]
    Auth {
        /// Username that attempted the login.
        username: String,
        /// HTTP status of the login response.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The server answered 401 or 403.
    #[error("permission denied (HTTP {status}): {body}")]
    Permission {
        /// HTTP status.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The server answered 404.
    #[error("not found (HTTP {status}): {body}")]
    NotFound {
        /// HTTP status.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The server rejected the payload (400 or 422).
    #[error("validation failed (HTTP {status}): {body}")]
    Validation {
        /// HTTP status.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Any other unexpected status.
    #[error("unexpected HTTP {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The body could not be decoded as expected.
    #[error("cannot decode response (HTTP {status}): {message}; body: {body}")]
    Decode {
        /// HTTP status.
        status: u16,
        /// What was expected.
        message: String,
        /// Response body.
        body: String,
    },

    /// A session could not be established earlier and is not retried.
    #[error("no session for {username}: {reason}")]
    SessionUnavailable {
        /// Username whose login failed.
        username: String,
        /// The original failure.
        reason: String,
    },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A domain value was invalid.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
}

impl ApiError {
    /// Classifies a non-success response by status.
    #[must_use]
    pub fn from_response(response: &ApiResponse) -> Self {
        let status = response.status;
        let body = response.body.clone();
        match status {
            401 | 403 => Self::Permission { status, body },
            404 => Self::NotFound { status, body },
            400 | 422 => Self::Validation { status, body },
            _ => Self::UnexpectedStatus { status, body },
        }
    }

    /// Builds a decode error for a response whose body was not as expected.
    #[must_use]
    pub fn decode(response: &ApiResponse, message: impl Into<String>) -> Self {
        Self::Decode {
            status: response.status,
            message: message.into(),
            body: response.body.clone(),
        }
    }

    /// Returns the HTTP status, if the error came from a response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. }
            | Self::Permission { status, .. }
            | Self::NotFound { status, .. }
            | Self::Validation { status, .. }
            | Self::UnexpectedStatus { status, .. }
            | Self::Decode { status, .. } => Some(*status),
            Self::SessionUnavailable { .. } | Self::Transport(_) | Self::Domain(_) => None,
        }
    }

    /// Returns the response body, if the error came from a response.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Auth { body, .. }
            | Self::Permission { body, .. }
            | Self::NotFound { body, .. }
            | Self::Validation { body, .. }
            | Self::UnexpectedStatus { body, .. }
            | Self::Decode { body, .. } => Some(body),
            Self::SessionUnavailable { .. } | Self::Transport(_) | Self::Domain(_) => None,
        }
    }
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ApiError>;

/// Why a scenario stopped early.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScenarioError {
    /// A precondition was missing; the scenario is reported as skipped.
    #[error("skipped: {0}")]
    Skipped(String),

    /// A check did not hold.
    #[error("{0}")]
    Failed(String),

    /// A request or decode failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ScenarioError {
    /// Creates a skip with the given reason.
    #[must_use]
    pub fn skip(reason: impl Into<String>) -> Self {
        Self::Skipped(reason.into())
    }

    /// Creates a failure with the given message.
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Returns true for skips.
    #[must_use]
    pub const fn is_skip(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

/// Result of a scenario body.
pub type ScenarioResult<T = ()> = Result<T, ScenarioError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::Duration;

    #[test]
    fn test_from_response_classifies_status() {
        let body = json!({"error": "nope"});
        let cases = [
            (401, "permission denied"),
            (403, "permission denied"),
            (404, "not found"),
            (400, "validation failed"),
            (422, "validation failed"),
            (500, "unexpected HTTP 500"),
        ];
        for (status, prefix) in cases {
            let err = ApiError::from_response(&ApiResponse::json(status, &body));
            assert!(err.to_string().starts_with(prefix), "{status}: {err}");
            assert_eq!(err.status(), Some(status));
            assert_eq!(err.body(), Some(r#"{"error":"nope"}"#));
        }
    }

    #[test]
    fn test_error_keeps_the_whole_body() {
        let long = "x".repeat(2_000);
        let response = ApiResponse::new(
            500,
            HashMap::new(),
            long.clone().into_bytes(),
            Duration::from_millis(3),
        );
        let err = ApiError::from_response(&response);
        assert_eq!(err.body(), Some(long.as_str()));

        let err = ApiError::decode(&response, "expected JSON");
        assert_eq!(err.body().map(str::len), Some(2_000));
    }

    #[test]
    fn test_transport_error_has_no_status() {
        let err = ApiError::from(TransportError::ConnectionFailed("refused".into()));
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "transport error: connection failed: refused");
    }

    #[test]
    fn test_scenario_error_helpers() {
        assert!(ScenarioError::skip("no sample").is_skip());
        assert!(!ScenarioError::fail("bad").is_skip());
        assert_eq!(ScenarioError::skip("no sample").to_string(), "skipped: no sample");
    }
}
