//! Cadastre Application - Client and scenario harness
//!
//! This crate holds the authenticated client, the scenario harness with its
//! cleanup guarantees, and the ports the infrastructure layer implements.

pub mod client;
pub mod error;
pub mod harness;
pub mod naming;
pub mod ports;

#[cfg(test)]
mod testing;

pub use client::{AuthenticatedClient, LOGIN_PATH};
pub use error::{ApiError, ClientResult, ScenarioError, ScenarioResult};
pub use harness::{SampleCache, SampleRequest, ScenarioContext, Teardown, TestScenarioHarness};
pub use ports::{HttpTransport, ResponseVerifier, TransportError, TransportFuture};
