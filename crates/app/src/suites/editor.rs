//! Editor role (`rool5`): geometry edits with notes, and the rest of the
//! item workflow.

use cadastre_application::{ScenarioContext, ScenarioResult, TestScenarioHarness};
use cadastre_domain::cadastre::{
    self, CadastreAction, CadastreDocument, CadastreQuery, GeoJsonPolygon, LocationEdit,
    ScreenshotMeta,
};
use cadastre_domain::{Role, StatusExpectation, SuiteReport};
use cadastre_infrastructure::{ConfigError, Settings};
use chrono::NaiveDate;
use serde_json::json;

use super::common;
use super::verdict::{into_moderation, report_error};

/// Suite name.
pub const NAME: &str = "editor";

const DETAILED_NOTE: &str = "Plot boundaries edited. Changes follow the administration \
    order. North-east boundary coordinates refined.";

const NUMBERED_NOTE: &str = "Changes:\n\
    1. Northern boundary coordinates refined\n\
    2. Plot area corrected\n\
    3. Plot address updated\n\
    4. Owner details added";

const UNICODE_NOTE: &str = "Редактирование: Ўзбекистон Республикаси территориясида";

const SPECIAL_NOTE: &str = "Change №3: area ~500м², coordinates 69°N @ plot #123";

const LONG_NOTE_REPEAT: usize = 500;

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
    let credential = settings.credential(Role::Editor)?;
    let (max_list_ms, max_item_ms) = (settings.max_list_ms, settings.max_item_ms);
    let mut report = SuiteReport::new(NAME);

    let scenario = |ctx| move_outline(ctx, rectangle());
    report.push(harness.run("geometry basic", &credential, scenario).await);
    let scenario = |ctx| move_outline(ctx, hexagon());
    report.push(harness.run("geometry complex polygon", &credential, scenario).await);

    let scenario = |ctx| edit_with_note(ctx, "Coordinates corrected".to_string(), None);
    report.push(harness.run("edit note short", &credential, scenario).await);
    let scenario = |ctx| edit_with_note(ctx, DETAILED_NOTE.to_string(), None);
    report.push(harness.run("edit note detailed", &credential, scenario).await);
    let scenario = |ctx| edit_with_note(ctx, UNICODE_NOTE.to_string(), None);
    report.push(harness.run("edit note unicode", &credential, scenario).await);
    let scenario = |ctx| edit_with_note(ctx, NUMBERED_NOTE.to_string(), None);
    report.push(harness.run("edit note numbered list", &credential, scenario).await);
    let scenario = |ctx| edit_with_note(ctx, String::new(), Some(&[200, 400, 404, 422]));
    report.push(harness.run("edit note empty", &credential, scenario).await);
    let scenario = |ctx| edit_with_note(ctx, SPECIAL_NOTE.to_string(), None);
    report.push(harness.run("edit note special characters", &credential, scenario).await);
    let scenario = |ctx| {
        edit_with_note(
            ctx,
            "Editing. ".repeat(LONG_NOTE_REPEAT),
            Some(&[200, 400, 404, 413, 422]),
        )
    };
    report.push(harness.run("edit note very long", &credential, scenario).await);

    let scenario = |ctx| common::mutate(ctx, CadastreAction::Edit, json!({}), Vec::new());
    report.push(harness.run("set edit status", &credential, scenario).await);
    let scenario = |ctx| common::building_presence(ctx, true);
    report.push(harness.run("building present", &credential, scenario).await);
    let scenario = |ctx| common::building_presence(ctx, false);
    report.push(harness.run("building absent", &credential, scenario).await);

    let scenario = |ctx| {
        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap_or_default();
        common::upload_screenshot(ctx, ScreenshotMeta::on_date("EDITOR_IMG_001", date))
    };
    report.push(harness.run("upload screenshot", &credential, scenario).await);
    let scenario = |ctx| common::download(ctx, CadastreDocument::Screenshot);
    report.push(harness.run("download screenshot", &credential, scenario).await);

    let scenario = |ctx| {
        report_error(
            ctx,
            "Cadastre data error found. Coordinates need checking.".to_string(),
            "geometry_error",
            None,
        )
    };
    report.push(harness.run("cadastre error", &credential, scenario).await);
    report.push(harness.run("into moderation", &credential, into_moderation).await);

    let scenario = |ctx| common::list(ctx, CadastreQuery::new());
    report.push(harness.run("list items", &credential, scenario).await);
    let scenario = |ctx| common::list(ctx, CadastreQuery::new().page(1).page_size(5));
    report.push(harness.run("list with pagination", &credential, scenario).await);
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

    report.push(harness.run("no token", &credential, common::without_token).await);
    let scenario = |ctx| common::forged_token(ctx, StatusExpectation::exact(401));
    report.push(harness.run("forged token", &credential, scenario).await);

    let scenario = |ctx| common::list_performance(ctx, max_list_ms);
    report.push(harness.run("list response time", &credential, scenario).await);
    let scenario = |ctx| common::item_performance(ctx, max_item_ms);
    report.push(harness.run("item response time", &credential, scenario).await);

    Ok(report)
}

fn rectangle() -> GeoJsonPolygon {
    GeoJsonPolygon::from_ring(vec![
        [69.240_562, 41.311_151],
        [69.240_662, 41.311_151],
        [69.240_662, 41.311_051],
        [69.240_562, 41.311_051],
    ])
}

fn hexagon() -> GeoJsonPolygon {
    GeoJsonPolygon::from_ring(vec![
        [69.240_562, 41.311_151],
        [69.240_662, 41.311_151],
        [69.240_712, 41.311_101],
        [69.240_662, 41.311_051],
        [69.240_562, 41.311_051],
        [69.240_512, 41.311_101],
    ])
}

async fn move_outline(ctx: ScenarioContext, outline: GeoJsonPolygon) -> ScenarioResult {
    let payload = json!({ "location": outline.to_json() });
    common::mutate(ctx, CadastreAction::GeometryFix, payload, Vec::new()).await
}

/// Sends an outline with `edit_note`; with `expected`, only the status is
/// checked.
async fn edit_with_note(
    ctx: ScenarioContext,
    edit_note: String,
    expected: Option<&'static [u16]>,
) -> ScenarioResult {
    let payload = LocationEdit {
        location: rectangle(),
        edit_note,
    };
    match expected {
        Some(codes) => {
            common::patch_expecting(ctx, CadastreAction::GeometryFix, payload, codes).await
        }
        None => common::mutate(ctx, CadastreAction::GeometryFix, payload, Vec::new()).await,
    }
}
