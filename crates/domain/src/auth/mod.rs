//! Authentication domain types

mod types;

pub use types::{AuthScheme, Credential, Session};
