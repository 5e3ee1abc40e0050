//! Cadastre Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus configuration, fixtures
//! and logging setup.

pub mod adapters;
pub mod config;
pub mod fixtures;
pub mod http;
pub mod logging;
pub mod testing;

pub use adapters::ReqwestTransport;
pub use config::{ConfigError, Settings};
pub use http::{BodyBuildError, BuiltBody, build_body};
pub use testing::TestRunner;
