//! Cadastre Acceptance
//!
//! Role suites run against a live cadastre deployment. Each suite logs in
//! as one role and runs its scenarios in declared order through a
//! [`TestScenarioHarness`](cadastre_application::TestScenarioHarness).

pub mod suites;

pub use suites::{Suite, run_all};
