//! HTTP transport port

use std::future::Future;
use std::pin::Pin;

use cadastre_domain::{ApiRequest, ApiResponse};
use thiserror::Error;

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + Send + 'a>>;

/// Port for sending fully resolved requests.
///
/// Implementations must not retry: a failed send is reported once, as is.
/// Any HTTP status, including 4xx and 5xx, is a successful send.
pub trait HttpTransport: Send + Sync {
    /// Sends the request and reads the whole response body.
    fn send(&self, request: ApiRequest) -> TransportFuture<'_>;
}

/// Failures below the HTTP layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request timed out.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout that elapsed.
        timeout_ms: u64,
    },

    /// DNS resolution failed.
    #[error("DNS resolution failed for {host}: {message}")]
    DnsError {
        /// Host that failed to resolve.
        host: String,
        /// Underlying message.
        message: String,
    },

    /// The connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The request body could not be built (e.g. unreadable attachment).
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    BodyRead(String),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}
