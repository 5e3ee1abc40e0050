//! Login for every configured role, and the credentials login must refuse.

use std::sync::Arc;

use cadastre_application::naming::unique_username;
use cadastre_application::{
    LOGIN_PATH, ScenarioContext, ScenarioError, ScenarioResult, TestScenarioHarness,
};
use cadastre_domain::{Assertion, HttpMethod, RequestBody, Role, StatusExpectation, SuiteReport};
use cadastre_infrastructure::{ConfigError, Settings};
use serde_json::json;

/// Suite name.
pub const NAME: &str = "auth";

const OVERSIZED_LEN: usize = 5_000;

/// Runs the suite.
///
/// # Errors
///
/// Returns an error if a role has no configured credential.
pub async fn run(
    harness: &mut TestScenarioHarness,
    settings: &Settings,
) -> Result<SuiteReport, ConfigError> {
    let mut report = SuiteReport::new(NAME);

    for role in Role::all() {
        let credential = settings.credential(role)?;
        let name = format!("login as {role}");
        report.push(harness.run(&name, &credential, logged_in).await);
    }

    let root = settings.credential(Role::Root)?;
    let cases = [
        ("wrong password", root.username.clone(), "wrong_password".to_string()),
        ("unknown user", unique_username(), "qwerty".to_string()),
        ("empty credentials", String::new(), String::new()),
        ("oversized credentials", "u".repeat(OVERSIZED_LEN), "p".repeat(OVERSIZED_LEN)),
    ];
    let anonymous = Arc::new(harness.anonymous_client());
    for (label, username, password) in cases {
        let name = format!("login rejected: {label}");
        let scenario = |ctx| rejected_login(ctx, username, password);
        report.push(harness.run_as(&name, Arc::clone(&anonymous), scenario).await);
    }

    Ok(report)
}

async fn logged_in(ctx: ScenarioContext) -> ScenarioResult {
    let session = ctx
        .client()
        .session()
        .ok_or_else(|| ScenarioError::fail("client has no session"))?;
    ScenarioContext::ensure(
        session.token().is_some_and(|token| !token.is_empty()),
        "login returned an empty token",
    )?;
    ScenarioContext::ensure(
        session.role.as_deref().is_some_and(|role| !role.is_empty()),
        "login returned no role",
    )
}

async fn rejected_login(ctx: ScenarioContext, username: String, password: String) -> ScenarioResult {
    let body = RequestBody::json(json!({ "username": username, "password": password }));
    let response = ctx
        .client()
        .request_unauthenticated(HttpMethod::Post, LOGIN_PATH, body)
        .await?;
    ctx.expect(
        &response,
        &[Assertion::status_matches(StatusExpectation::login_rejected())],
    )
    .await?;
    ScenarioContext::ensure(
        response.field("token").is_none(),
        "rejected login still returned a token",
    )
}
