//! Integration push: an external registry submits a record with basic auth.
//!
//! The cadastre API has no delete for pushed records, so every push uses a
//! fresh unit id and cadastral number.

use std::path::PathBuf;
use std::sync::Arc;

use cadastre_application::naming::unique_token;
use cadastre_application::{ScenarioContext, ScenarioError, ScenarioResult, TestScenarioHarness};
use cadastre_domain::cadastre::{
    GeoJsonPolygon, INTEGRATION_PUSH_PATH, IntegrationSubmission, Owner,
};
use cadastre_domain::{Assertion, StatusExpectation, SuiteReport};
use cadastre_infrastructure::{ConfigError, Settings, fixtures};
use chrono::{Duration, Local};

/// Suite name.
pub const NAME: &str = "integration";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Runs the suite.
///
/// # Errors
///
/// Never fails today; the signature matches the other suites.
pub async fn run(
    harness: &mut TestScenarioHarness,
    settings: &Settings,
) -> Result<SuiteReport, ConfigError> {
    let mut report = SuiteReport::new(NAME);
    let attachment = settings.attachment_path.clone();

    let client = settings.integration_scheme().map_or_else(
        || Arc::new(harness.anonymous_client()),
        |scheme| harness.scheme_client(scheme),
    );
    let configured = settings.integration_scheme().is_some();
    let scenario = |ctx| push(ctx, configured, attachment);
    report.push(harness.run_as("push with basic auth", client, scenario).await);

    let anonymous = Arc::new(harness.anonymous_client());
    report.push(harness.run_as("push without auth", anonymous, push_unauthenticated).await);

    Ok(report)
}

/// A submission with fresh identifiers and a fixed plot in Namangan.
#[must_use]
#[allow(clippy::unreadable_literal)]
pub fn submission() -> IntegrationSubmission {
    let now = Local::now();
    IntegrationSubmission {
        uid_sp_unit: format!("test{}", unique_token()),
        cadastral_number: unique_token(),
        address: "test address".to_string(),
        land_fund_type_code: "10".to_string(),
        land_use_type_code: "20".to_string(),
        vid: "foo".to_string(),
        region_soato: "1726".to_string(),
        district_soato: "1726264".to_string(),
        neighborhood_soato: "1726264".to_string(),
        law_accordance_id: "1".to_string(),
        selected_at: now.format(TIMESTAMP_FORMAT).to_string(),
        step_deadline: (now + Duration::days(4)).format(TIMESTAMP_FORMAT).to_string(),
        location: GeoJsonPolygon::from_ring(vec![
            [70.977547181, 40.742336418],
            [70.977609794, 40.742167422],
            [70.977411895, 40.74212747],
            [70.977405158, 40.742146528],
            [70.977376591, 40.742140742],
            [70.977363476, 40.742178108],
            [70.977310835, 40.742167422],
            [70.97730823, 40.742166878],
            [70.977189742, 40.742145439],
            [70.977099371, 40.742247054],
        ]),
        mulk_egalari: vec![
            Owner::new("A", "111"),
            Owner::new("B", "222"),
            Owner::new("C", "333"),
        ],
        reupload_note: None,
        edit_note: None,
    }
}

async fn push(
    ctx: ScenarioContext,
    configured: bool,
    attachment: Option<PathBuf>,
) -> ScenarioResult {
    if !configured {
        return Err(ScenarioError::skip("no integration credential configured"));
    }
    let path = fixtures::configured_attachment(attachment.as_deref())
        .ok_or_else(|| ScenarioError::skip("attachment file not found"))?;

    let form = submission().to_form(
        Some(fixtures::pdf_part(
            IntegrationSubmission::LAND_PLAN_FIELD,
            "land_plan.pdf",
            Some(path),
        )),
        Some(fixtures::pdf_part(
            IntegrationSubmission::DECREE_FIELD,
            "decree.pdf",
            Some(path),
        )),
    );
    let response = ctx.client().post_form(INTEGRATION_PUSH_PATH, form).await?;
    ctx.expect(&response, &[Assertion::status(201)]).await?;
    Ok(())
}

async fn push_unauthenticated(ctx: ScenarioContext) -> ScenarioResult {
    let form = submission().to_form(
        Some(fixtures::pdf_part(IntegrationSubmission::LAND_PLAN_FIELD, "land_plan.pdf", None)),
        Some(fixtures::pdf_part(IntegrationSubmission::DECREE_FIELD, "decree.pdf", None)),
    );
    let response = ctx.client().post_form(INTEGRATION_PUSH_PATH, form).await?;
    ctx.expect(
        &response,
        &[Assertion::status_matches(StatusExpectation::denied())],
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_submission_form_fields() {
        let first = submission();
        let second = submission();
        assert_ne!(first.uid_sp_unit, second.uid_sp_unit);

        let form = first.to_form(None, None);
        assert_eq!(form.text_value("region_soato"), Some("1726"));
        assert!(form.text_value("location").unwrap_or_default().contains("Polygon"));
        assert_eq!(first.location.coordinates[0].len(), 11);
    }
}
