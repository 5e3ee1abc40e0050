//! Geometry-fix role (`rool1`): listing, lookups, geometry corrections,
//! screenshots, access control and edge cases.

use cadastre_application::{ScenarioContext, ScenarioResult, TestScenarioHarness};
use cadastre_domain::cadastre::{
    self, CADASTRE_PATH, CadastreAction, CadastreDocument, CadastreQuery, GeoJsonPolygon,
    GeometryFix, ScreenshotMeta,
};
use cadastre_domain::{
    Assertion, HttpMethod, Query, RequestBody, Role, StatusExpectation, SuiteReport,
};
use cadastre_infrastructure::{ConfigError, Settings};
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::{Value, json};

use super::common::{self, PAYLOAD_REJECTIONS};

/// Suite name.
pub const NAME: &str = "geometry_fix";

/// Statuses the status filter scenario walks through.
const FILTERED_STATUSES: [&str; 3] = ["geometry_fix", "edit", "building_presence"];

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
    let credential = settings.credential(Role::GeometryFix)?;
    let (max_list_ms, max_item_ms) = (settings.max_list_ms, settings.max_item_ms);
    let mut report = SuiteReport::new(NAME);

    // listing
    let scenario = |ctx| common::list(ctx, CadastreQuery::new());
    report.push(harness.run("list items", &credential, scenario).await);
    let scenario = |ctx| common::list(ctx, CadastreQuery::new().page(1).page_size(5));
    report.push(harness.run("list with pagination", &credential, scenario).await);
    report.push(harness.run("list by status", &credential, list_by_status).await);
    let scenario = |ctx| common::walk_pages(ctx, 3, 10);
    report.push(harness.run("walk three pages", &credential, scenario).await);

    // lookups
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
    report.push(
        harness
            .run("get by cadastre id", &credential, common::get_by_cadastre_number)
            .await,
    );
    let scenario = |ctx| {
        common::expect_get(
            ctx,
            cadastre::cadastre_number_path("INVALID_ID_9999"),
            None,
            StatusExpectation::exact(404),
        )
    };
    report.push(harness.run("get unknown cadastre id", &credential, scenario).await);
    let scenario = |ctx| {
        common::expect_get(
            ctx,
            cadastre::item_path("invalid_id"),
            None,
            StatusExpectation::bad_identifier(),
        )
    };
    report.push(harness.run("get malformed id", &credential, scenario).await);

    // geometry
    let scenario = |ctx| {
        fix_geometry(
            ctx,
            CadastreAction::GeometryFix,
            "geometry_fix",
            GeoJsonPolygon::square(69.123, 41.123, 0.001),
            15.5,
        )
    };
    report.push(harness.run("geometry fix", &credential, scenario).await);
    let scenario = |ctx| {
        fix_geometry(
            ctx,
            CadastreAction::Edit,
            "edit",
            GeoJsonPolygon::square(69.125, 41.125, 0.001),
            20.3,
        )
    };
    report.push(harness.run("edit geometry", &credential, scenario).await);
    let scenario = |ctx| {
        common::patch_expecting(
            ctx,
            CadastreAction::GeometryFix,
            json!({ "fixed_geojson": "invalid geojson", "move_distance": 10.0 }),
            PAYLOAD_REJECTIONS,
        )
    };
    report.push(harness.run("invalid geojson", &credential, scenario).await);
    let scenario = |ctx| {
        common::patch_expecting(
            ctx,
            CadastreAction::GeometryFix,
            json!({ "move_distance": 10.0 }),
            PAYLOAD_REJECTIONS,
        )
    };
    report.push(harness.run("geometry fix without geojson", &credential, scenario).await);

    // building presence
    let scenario = |ctx| common::building_presence(ctx, true);
    report.push(harness.run("building present", &credential, scenario).await);
    let scenario = |ctx| common::building_presence(ctx, false);
    report.push(harness.run("building absent", &credential, scenario).await);
    let scenario = |ctx| {
        common::patch_expecting(ctx, CadastreAction::BuildingPresence, json!({}), &[400, 500])
    };
    report.push(harness.run("building presence missing", &credential, scenario).await);

    // screenshots
    let scenario = |ctx| common::upload_screenshot(ctx, iso_dated("TEST_IMAGE_123"));
    report.push(harness.run("upload screenshot", &credential, scenario).await);
    let scenario = |ctx| common::upload_screenshot(ctx, rfc3339_dated("TEST_IMAGE_456"));
    report.push(harness.run("upload screenshot rfc3339", &credential, scenario).await);
    let scenario = |ctx| common::download(ctx, CadastreDocument::Screenshot);
    report.push(harness.run("download screenshot", &credential, scenario).await);
    let scenario = |ctx| common::upload_without_file(ctx, iso_dated("TEST_NO_FILE"));
    report.push(harness.run("upload without file", &credential, scenario).await);

    // access control
    report.push(harness.run("no token", &credential, common::without_token).await);
    let scenario = |ctx| common::forged_token(ctx, StatusExpectation::exact(401));
    report.push(harness.run("forged token", &credential, scenario).await);
    report.push(harness.run("patch without token", &credential, patch_without_token).await);

    // error handling
    let scenario = |ctx| {
        common::malformed_json(ctx, CadastreAction::GeometryFix, "invalid json", &[400, 500])
    };
    report.push(harness.run("invalid json body", &credential, scenario).await);
    let scenario = |ctx| {
        common::expect_get(
            ctx,
            format!("{CADASTRE_PATH}/nonexistent/endpoint"),
            None,
            StatusExpectation::one_of(&[404, 405]),
        )
    };
    report.push(harness.run("malformed endpoint", &credential, scenario).await);
    let scenario = |ctx| {
        common::expect_get(
            ctx,
            cadastre::item_path("-1"),
            None,
            StatusExpectation::bad_identifier(),
        )
    };
    report.push(harness.run("negative id", &credential, scenario).await);

    // edge cases
    let scenario = |ctx| list_with(ctx, Query::new().param("page_size", 10_000), &[200]);
    report.push(harness.run("huge page size", &credential, scenario).await);
    let scenario = |ctx| list_with(ctx, Query::new().param("page_size", 0), &[200, 400]);
    report.push(harness.run("zero page size", &credential, scenario).await);
    let scenario = |ctx| list_with(ctx, Query::new().param("page", -1), &[200, 400]);
    report.push(harness.run("negative page", &credential, scenario).await);
    let scenario = |ctx| list_with(ctx, Query::new().param("status", ""), &[200]);
    report.push(harness.run("empty status filter", &credential, scenario).await);
    let scenario = |ctx| list_with(ctx, Query::new().param("status", "статус"), &[200, 400]);
    report.push(harness.run("unicode status filter", &credential, scenario).await);

    // performance
    let scenario = |ctx| common::list_performance(ctx, max_list_ms);
    report.push(harness.run("list response time", &credential, scenario).await);
    let scenario = |ctx| common::item_performance(ctx, max_item_ms);
    report.push(harness.run("item response time", &credential, scenario).await);

    Ok(report)
}

fn iso_dated(space_image_id: &str) -> ScreenshotMeta {
    let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap_or_default();
    ScreenshotMeta::on_date(space_image_id, date)
}

fn rfc3339_dated(space_image_id: &str) -> ScreenshotMeta {
    let timestamp = Utc
        .with_ymd_and_hms(2024, 12, 1, 12, 0, 0)
        .single()
        .unwrap_or_default();
    ScreenshotMeta::at(space_image_id, timestamp)
}

async fn list_by_status(ctx: ScenarioContext) -> ScenarioResult {
    for status in FILTERED_STATUSES {
        common::list(ctx.clone(), CadastreQuery::new().status(status)).await?;
    }
    Ok(())
}

async fn list_with(ctx: ScenarioContext, query: Query, expected: &[u16]) -> ScenarioResult {
    let response = ctx.client().get(CADASTRE_PATH, Some(&query)).await?;
    ctx.expect(&response, &[Assertion::status_in(expected)])
        .await?;
    Ok(())
}

async fn fix_geometry(
    ctx: ScenarioContext,
    action: CadastreAction,
    status: &'static str,
    polygon: GeoJsonPolygon,
    move_distance: f64,
) -> ScenarioResult {
    let (_, id) = common::sample_item_in(&ctx, CadastreQuery::new().status(status)).await?;
    let payload = GeometryFix::new(&polygon, move_distance);
    let response = ctx.client().patch(&action.path(&id), &payload).await?;
    common::expect_mutation(
        &ctx,
        &response,
        &[
            Assertion::field_equals("fixed_geojson", Value::String(payload.fixed_geojson.clone())),
            Assertion::field_equals("move_distance", json!(move_distance)),
        ],
    )
    .await
}

async fn patch_without_token(ctx: ScenarioContext) -> ScenarioResult {
    let body = RequestBody::json(json!({ "building_presence": true }));
    let response = ctx
        .client()
        .request_unauthenticated(
            HttpMethod::Patch,
            &CadastreAction::BuildingPresence.path("1"),
            body,
        )
        .await?;
    ctx.expect(&response, &[Assertion::status_in(&[401, 404])])
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_screenshot_dates() {
        assert_eq!(iso_dated("A").space_image_date, "2024-12-01");
        assert_eq!(rfc3339_dated("B").space_image_date, "2024-12-01T12:00:00Z");
    }
}
