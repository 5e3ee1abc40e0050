//! Cadastre Domain - Core types
//!
//! This crate defines the domain model of the cadastre acceptance harness:
//! credentials and sessions, requests and responses, assertions, scenario
//! lifecycle, and the payloads the cadastre service accepts.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod cadastre;
pub mod error;
pub mod fields;
pub mod request;
pub mod resource;
pub mod response;
pub mod role;
pub mod scenario;
pub mod testing;
pub mod user;

pub use auth::{AuthScheme, Credential, Session};
pub use error::{DomainError, DomainResult};
pub use request::{ApiRequest, FormPart, HttpMethod, MultipartForm, Query, RequestBody};
pub use resource::Resource;
pub use response::ApiResponse;
pub use role::Role;
pub use scenario::{
    ScenarioLifecycle, ScenarioOutcome, ScenarioReport, ScenarioState, SuiteReport,
};
pub use testing::{Assertion, AssertionResult, JsonKind, StatusExpectation, TestResults};
