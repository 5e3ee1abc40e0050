//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod http_transport;
mod response_verifier;

pub use http_transport::{HttpTransport, TransportError, TransportFuture};
pub use response_verifier::ResponseVerifier;
