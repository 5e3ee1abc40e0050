//! Verdict role (`rool4`): screenshots, moderation, cadastre errors and
//! the governor decree.

use cadastre_application::{ScenarioContext, ScenarioResult, TestScenarioHarness};
use cadastre_domain::cadastre::{
    self, CadastreAction, CadastreDocument, CadastreErrorReport, CadastreQuery, ScreenshotMeta,
};
use cadastre_domain::{Assertion, Role, StatusExpectation, SuiteReport};
use cadastre_infrastructure::{ConfigError, Settings};
use chrono::NaiveDate;
use serde_json::json;

use super::common;

/// Suite name.
pub const NAME: &str = "verdict";

/// Workflow status of items awaiting this role.
pub const VERDICT_STATUS: &str = "verdict_79";

const LONG_DESCRIPTION_LEN: usize = 5_000;

/// Runs the suite.
///
/// # Errors
///
/// Returns an error if the role has no configured credential.
#[allow(clippy::too_many_lines)]
pub async fn run(
    harness: &mut TestScenarioHarness,
    settings: &Settings,
) -> Result<SuiteReport, ConfigError> {
    let credential = settings.credential(Role::Verdict)?;
    let (max_list_ms, max_item_ms) = (settings.max_list_ms, settings.max_item_ms);
    let mut report = SuiteReport::new(NAME);

    let scenario = |ctx| common::list(ctx, CadastreQuery::new());
    report.push(harness.run("list items", &credential, scenario).await);
    let scenario = |ctx| common::list(ctx, CadastreQuery::new().status(VERDICT_STATUS));
    report.push(harness.run("list awaiting verdict", &credential, scenario).await);
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

    let scenario = |ctx| {
        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap_or_default();
        common::upload_screenshot(ctx, ScreenshotMeta::on_date("VERDICT79_IMG_001", date))
    };
    report.push(harness.run("upload screenshot", &credential, scenario).await);
    let scenario = |ctx| common::download(ctx, CadastreDocument::Screenshot);
    report.push(harness.run("download screenshot", &credential, scenario).await);

    let scenario = |ctx| common::building_presence(ctx, true);
    report.push(harness.run("building present", &credential, scenario).await);
    let scenario = |ctx| common::building_presence(ctx, false);
    report.push(harness.run("building absent", &credential, scenario).await);

    report.push(harness.run("into moderation", &credential, into_moderation).await);

    let scenario = |ctx| {
        report_error(
            ctx,
            "Boundary coordinates are off. Needs clarification.".to_string(),
            "geometry_error",
            None,
        )
    };
    report.push(harness.run("cadastre error", &credential, scenario).await);
    let scenario =
        |ctx| report_error(ctx, String::new(), "data_error", Some(&[200, 400, 404, 422]));
    report.push(harness.run("cadastre error empty", &credential, scenario).await);
    let scenario = |ctx| {
        report_error(
            ctx,
            "A".repeat(LONG_DESCRIPTION_LEN),
            "general_error",
            Some(&[200, 400, 413, 422]),
        )
    };
    report.push(harness.run("cadastre error very long", &credential, scenario).await);
    let scenario = |ctx| {
        report_error(
            ctx,
            "Error №1: coordinates ~40°N, area 500м² @ plot #123".to_string(),
            "data_error",
            Some(&[200, 400, 404, 422]),
        )
    };
    report.push(harness.run("cadastre error special characters", &credential, scenario).await);

    let scenario = |ctx| common::download(ctx, CadastreDocument::GovernorDecree);
    report.push(harness.run("download governor decree", &credential, scenario).await);

    report.push(harness.run("no token", &credential, common::without_token).await);
    let scenario = |ctx| common::forged_token(ctx, StatusExpectation::exact(401));
    report.push(harness.run("forged token", &credential, scenario).await);

    let scenario = |ctx| common::list_performance(ctx, max_list_ms);
    report.push(harness.run("list response time", &credential, scenario).await);
    let scenario = |ctx| common::item_performance(ctx, max_item_ms);
    report.push(harness.run("item response time", &credential, scenario).await);

    Ok(report)
}

pub(super) async fn into_moderation(ctx: ScenarioContext) -> ScenarioResult {
    common::mutate(
        ctx,
        CadastreAction::IntoModeration,
        json!({}),
        vec![Assertion::has_field("status")],
    )
    .await
}

/// Records a cadastre error; with `expected`, only the status is checked.
pub(super) async fn report_error(
    ctx: ScenarioContext,
    error_description: String,
    error_type: &'static str,
    expected: Option<&'static [u16]>,
) -> ScenarioResult {
    let payload = CadastreErrorReport {
        error_description,
        error_type: error_type.to_string(),
    };
    match expected {
        Some(codes) => {
            common::patch_expecting(ctx, CadastreAction::CadastreError, payload, codes).await
        }
        None => common::mutate(ctx, CadastreAction::CadastreError, payload, Vec::new()).await,
    }
}
