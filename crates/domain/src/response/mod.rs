//! HTTP response types

mod types;

pub use types::ApiResponse;
