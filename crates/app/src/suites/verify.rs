//! Verifier role (`rool2`).

use cadastre_application::{ScenarioContext, ScenarioError, ScenarioResult, TestScenarioHarness};
use cadastre_domain::cadastre::{self, CadastreAction, CadastreQuery, VerificationDecision};
use cadastre_domain::{Assertion, Query, Role, StatusExpectation, SuiteReport};
use cadastre_infrastructure::{ConfigError, Settings};
use chrono::Local;

use super::common::{self, REGION_SOATO};

/// Suite name.
pub const NAME: &str = "verify";

/// Runs the suite.
///
/// # Errors
///
/// Returns an error if the role has no configured credential.
pub async fn run(
    harness: &mut TestScenarioHarness,
    settings: &Settings,
) -> Result<SuiteReport, ConfigError> {
    let credential = settings.credential(Role::Verify)?;
    let max_list_ms = settings.max_list_ms;
    let mut report = SuiteReport::new(NAME);

    let scenario = |ctx| common::list(ctx, CadastreQuery::new());
    report.push(harness.run("list items", &credential, scenario).await);
    report.push(harness.run("get by id", &credential, common::get_by_id).await);
    let scenario = |ctx| {
        common::expect_get(
            ctx,
            cadastre::item_path(common::UNKNOWN_ID),
            None,
            StatusExpectation::exact(404),
        )
    };
    report.push(harness.run("get unknown id", &credential, scenario).await);

    let scenario = |ctx| common::list(ctx, CadastreQuery::new().region(REGION_SOATO));
    report.push(harness.run("filter by region", &credential, scenario).await);
    let scenario = |ctx| {
        common::expect_get(
            ctx,
            cadastre::CADASTRE_PATH.to_string(),
            Some(Query::new().param("fake_field", "xxx")),
            StatusExpectation::one_of(&[200, 400]),
        )
    };
    report.push(harness.run("filter by unknown field", &credential, scenario).await);

    report.push(harness.run("verify item", &credential, verify_item).await);

    report.push(harness.run("no token", &credential, common::without_token).await);
    let scenario = |ctx| common::forged_token(ctx, StatusExpectation::exact(401));
    report.push(harness.run("forged token", &credential, scenario).await);

    let scenario = |ctx| common::list_performance(ctx, max_list_ms);
    report.push(harness.run("list response time", &credential, scenario).await);

    Ok(report)
}

/// Marks the sample verified, then reads it back.
///
/// 403 (role not allowed) and 404 (endpoint absent on this deployment)
/// skip rather than fail.
async fn verify_item(ctx: ScenarioContext) -> ScenarioResult {
    let (_, id) = common::sample_item(&ctx).await?;
    let decision = VerificationDecision {
        verified: true,
        comment: Some(format!(
            "Verified by verify {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        )),
    };
    let response = ctx
        .client()
        .patch(&CadastreAction::Verification.path(&id), &decision)
        .await?;
    ctx.record(&response).await;
    match response.status {
        403 => return Err(ScenarioError::skip("role may not verify")),
        404 => return Err(ScenarioError::skip("verification endpoint not found")),
        _ => {}
    }
    ctx.expect(
        &response,
        &[Assertion::status_matches(StatusExpectation::accepted())],
    )
    .await?;

    let response = ctx.client().get(&cadastre::item_path(&id), None).await?;
    ctx.expect(&response, &[Assertion::status(200)]).await?;
    Ok(())
}
