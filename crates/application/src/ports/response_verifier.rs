//! Response verification port

use cadastre_domain::{ApiResponse, Assertion, TestResults};

/// Evaluates assertions against a response.
///
/// The harness uses this to turn a list of expectations into a scenario
/// failure; the full implementation lives in the infrastructure layer.
pub trait ResponseVerifier: Send + Sync {
    /// Runs every assertion and collects the results.
    fn verify(&self, assertions: &[Assertion], response: &ApiResponse) -> TestResults;
}
