//! Full run against a deployed service.
//!
//! Configure with `CADASTRE_BASE_URL` (or a settings file) and run with
//! `cargo test -p cadastre-acceptance --test live -- --ignored`.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;

use cadastre_acceptance::{Suite, run_all};
use cadastre_application::TestScenarioHarness;
use cadastre_domain::ScenarioOutcome;
use cadastre_infrastructure::{ReqwestTransport, Settings, TestRunner, logging};

#[tokio::test]
#[ignore = "requires live cadastre service"]
async fn test_every_suite_against_live_service() {
    logging::init();
    let settings = Settings::load().unwrap();
    let transport = Arc::new(ReqwestTransport::new(settings.timeout()).unwrap());
    let mut harness = TestScenarioHarness::new(
        transport,
        Arc::new(TestRunner::new()),
        settings.base_url.clone(),
    );

    let reports = run_all(&mut harness, &settings, &Suite::ALL).await.unwrap();

    let failed: Vec<String> = reports
        .iter()
        .flat_map(|report| &report.scenarios)
        .filter(|scenario| scenario.outcome == ScenarioOutcome::Failed)
        .map(ToString::to_string)
        .collect();
    assert!(failed.is_empty(), "failed scenarios:\n{}", failed.join("\n"));
}
