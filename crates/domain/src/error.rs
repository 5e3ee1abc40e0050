//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The provided URL or path is invalid or malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// The request body is invalid for the given content type.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// A credential is missing a username or password.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// A scenario attempted a lifecycle transition that is not allowed.
    #[error("invalid scenario transition: {from} -> {to}")]
    InvalidTransition {
        /// State the scenario was in.
        from: String,
        /// State it tried to enter.
        to: String,
    },
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
