//! Agency role (`rool3`).

use cadastre_application::{ScenarioContext, ScenarioError, ScenarioResult, TestScenarioHarness};
use cadastre_domain::cadastre::{self, CadastreAction, CadastreQuery, VerificationDecision};
use cadastre_domain::{Assertion, Query, Role, StatusExpectation, SuiteReport};
use cadastre_infrastructure::{ConfigError, Settings};
use chrono::Local;

use super::common::{self, REGION_SOATO};

/// Suite name.
pub const NAME: &str = "agency";

/// Runs the suite.
///
/// # Errors
///
/// Returns an error if the role has no configured credential.
pub async fn run(
    harness: &mut TestScenarioHarness,
    settings: &Settings,
) -> Result<SuiteReport, ConfigError> {
    let credential = settings.credential(Role::Agency)?;
    let mut report = SuiteReport::new(NAME);

    let scenario = |ctx| common::list(ctx, CadastreQuery::new());
    report.push(harness.run("list items", &credential, scenario).await);
    report.push(harness.run("get by id", &credential, common::get_by_id).await);
    report.push(
        harness
            .run("get by cadastre id", &credential, common::get_by_cadastre_number)
            .await,
    );

    let scenario = |ctx| agency_verification(ctx, true, "Approved by agency");
    report.push(harness.run("agency approves", &credential, scenario).await);
    let scenario = |ctx| agency_verification(ctx, false, "Rejected by agency");
    report.push(harness.run("agency rejects", &credential, scenario).await);

    let scenario = |ctx| common::list(ctx, CadastreQuery::new().region(REGION_SOATO));
    report.push(harness.run("filter by region", &credential, scenario).await);
    let scenario = |ctx| {
        common::expect_get(
            ctx,
            cadastre::CADASTRE_PATH.to_string(),
            Some(
                Query::new()
                    .param("sort", "created_at")
                    .param("order", "desc")
                    .param("limit", 5),
            ),
            StatusExpectation::exact(200),
        )
    };
    report.push(harness.run("recent items", &credential, scenario).await);
    let scenario = |ctx| {
        common::expect_get(
            ctx,
            cadastre::CADASTRE_PATH.to_string(),
            Some(Query::new().param("limit", 3).param("offset", 0)),
            StatusExpectation::exact(200),
        )
    };
    report.push(harness.run("limit and offset", &credential, scenario).await);

    let scenario = |ctx| {
        common::expect_get(
            ctx,
            cadastre::item_path("abc123"),
            None,
            StatusExpectation::bad_identifier(),
        )
    };
    report.push(harness.run("malformed id", &credential, scenario).await);
    let scenario = |ctx| {
        common::malformed_json(
            ctx,
            CadastreAction::AgencyVerification,
            r#"{"verified": true, "comment": "broken json""#,
            &[400, 422, 500],
        )
    };
    report.push(harness.run("invalid json patch", &credential, scenario).await);

    report.push(harness.run("no token", &credential, common::without_token).await);
    let scenario = |ctx| common::forged_token(ctx, StatusExpectation::exact(401));
    report.push(harness.run("forged token", &credential, scenario).await);

    Ok(report)
}

/// Sends an agency decision on the sample; a 403 skips.
async fn agency_verification(
    ctx: ScenarioContext,
    verified: bool,
    note: &'static str,
) -> ScenarioResult {
    let (_, id) = common::sample_item(&ctx).await?;
    let decision = VerificationDecision {
        verified,
        comment: Some(format!("{note} {}", Local::now().format("%Y-%m-%d %H:%M:%S"))),
    };
    let response = ctx
        .client()
        .patch(&CadastreAction::AgencyVerification.path(&id), &decision)
        .await?;
    if response.status == 403 {
        ctx.record(&response).await;
        return Err(ScenarioError::skip("role may not verify as agency"));
    }
    ctx.expect(
        &response,
        &[Assertion::status_matches(StatusExpectation::accepted())],
    )
    .await?;
    Ok(())
}
