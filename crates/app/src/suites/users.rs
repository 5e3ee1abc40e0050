//! User administration as root.
//!
//! Every scenario creates its own user and deletes it afterwards, so no
//! scenario depends on another's mutation.

use std::sync::Arc;

use cadastre_application::naming::{USERNAME_PREFIX, unique_username};
use cadastre_application::{
    AuthenticatedClient, ScenarioContext, ScenarioError, ScenarioResult, Teardown,
    TestScenarioHarness,
};
use cadastre_domain::user::{self, NewUser, USERS_PATH, UserUpdate};
use cadastre_domain::{Assertion, JsonKind, Resource, Role, StatusExpectation, SuiteReport};
use cadastre_infrastructure::{ConfigError, Settings};
use serde_json::Value;

/// Suite name.
pub const NAME: &str = "users";

/// Role given to created users.
pub const INTEGRATION_ROLE: &str = "cadastre_integration";

/// Key of the created record in the create response.
const CREATED_ENVELOPE: &str = "user";

/// Runs the suite.
///
/// # Errors
///
/// Returns an error if root or the geometry-fix role has no credential.
pub async fn run(
    harness: &mut TestScenarioHarness,
    settings: &Settings,
) -> Result<SuiteReport, ConfigError> {
    let root = settings.credential(Role::Root)?;
    let unprivileged = settings.credential(Role::GeometryFix)?;
    let mut report = SuiteReport::new(NAME);

    report.push(harness.run("create user", &root, create_user).await);
    report.push(harness.run("get user", &root, get_user).await);
    report.push(harness.run("update first name", &root, update_first_name).await);
    report.push(harness.run("toggle active twice", &root, toggle_active_twice).await);
    report.push(harness.run("list users", &root, list_users).await);
    report.push(harness.run("delete then not found", &root, delete_then_not_found).await);
    // a user the unprivileged role manages to create is removed as root
    let admin = harness.session_client(&root).await.ok();
    let scenario = |ctx| create_unprivileged(ctx, admin);
    report.push(
        harness
            .run("create as non-privileged role", &unprivileged, scenario)
            .await,
    );

    Ok(report)
}

async fn create(ctx: &ScenarioContext) -> ScenarioResult<(Resource, String)> {
    let payload = NewUser::qa(unique_username(), INTEGRATION_ROLE);
    let created = ctx
        .provision(
            USERS_PATH,
            &payload,
            Some(CREATED_ENVELOPE),
            StatusExpectation::exact(201),
        )
        .await?;
    let id = created
        .id()
        .ok_or_else(|| ScenarioError::fail("created user has no id"))?;
    Ok((created, id))
}

async fn create_user(ctx: ScenarioContext) -> ScenarioResult {
    let (created, _) = create(&ctx).await?;
    ScenarioContext::ensure(
        created
            .field_string("username")
            .is_some_and(|name| name.starts_with(USERNAME_PREFIX)),
        "created user lost its username",
    )?;
    ScenarioContext::ensure(
        created.field("active") == Some(&Value::Bool(true)),
        "created user is not active",
    )
}

async fn get_user(ctx: ScenarioContext) -> ScenarioResult {
    let (_, id) = create(&ctx).await?;
    let response = ctx.client().get(&user::user_path(&id), None).await?;
    ctx.expect(
        &response,
        &[Assertion::status(200), Assertion::field_equals("id", Value::String(id))],
    )
    .await?;
    Ok(())
}

async fn update_first_name(ctx: ScenarioContext) -> ScenarioResult {
    let (_, id) = create(&ctx).await?;
    let update = UserUpdate {
        first_name: Some("UpdatedName".to_string()),
        ..UserUpdate::default()
    };
    let response = ctx.client().put(&user::user_path(&id), &update).await?;
    ctx.expect(
        &response,
        &[
            Assertion::status(200),
            Assertion::field_equals("first_name", Value::from("UpdatedName")),
        ],
    )
    .await?;
    Ok(())
}

async fn toggle(ctx: &ScenarioContext, id: &str) -> ScenarioResult<bool> {
    let response = ctx.client().patch_empty(&user::toggle_active_path(id)).await?;
    ctx.expect(
        &response,
        &[Assertion::status(200), Assertion::field_kind("active", JsonKind::Bool)],
    )
    .await?;
    response
        .field("active")
        .and_then(|active| active.as_bool())
        .ok_or_else(|| ScenarioError::fail("toggle response has no active flag"))
}

async fn toggle_active_twice(ctx: ScenarioContext) -> ScenarioResult {
    let (created, id) = create(&ctx).await?;
    let initial = created
        .field("active")
        .and_then(Value::as_bool)
        .ok_or_else(|| ScenarioError::fail("created user has no active flag"))?;

    let flipped = toggle(&ctx, &id).await?;
    ScenarioContext::ensure(flipped != initial, "first toggle did not flip active")?;
    let restored = toggle(&ctx, &id).await?;
    ScenarioContext::ensure(restored == initial, "second toggle did not restore active")
}

async fn list_users(ctx: ScenarioContext) -> ScenarioResult {
    let response = ctx.client().get(USERS_PATH, None).await?;
    ctx.expect(
        &response,
        &[Assertion::status(200), Assertion::field_kind("data", JsonKind::Array)],
    )
    .await?;
    Ok(())
}

async fn delete_then_not_found(ctx: ScenarioContext) -> ScenarioResult {
    let (_, id) = create(&ctx).await?;
    let path = user::user_path(&id);
    let response = ctx.client().delete(&path).await?;
    ctx.expect(&response, &[Assertion::status_in(&[200, 204])])
        .await?;
    let response = ctx.client().get(&path, None).await?;
    ctx.expect(&response, &[Assertion::status(404)]).await?;
    Ok(())
}

async fn create_unprivileged(
    ctx: ScenarioContext,
    admin: Option<Arc<AuthenticatedClient>>,
) -> ScenarioResult {
    let payload = NewUser::qa(unique_username(), INTEGRATION_ROLE);
    let response = ctx.client().post_json(USERS_PATH, &payload).await?;
    if response.is_success()
        && let Some(id) = response.field_string("user.id")
    {
        let path = user::user_path(&id);
        // without a root session the creator's own is the only option
        let cleaner = admin.unwrap_or_else(|| ctx.shared_client());
        ctx.defer(Teardown::delete(cleaner, path, format!("user {id}")))
            .await;
    }
    ctx.expect(
        &response,
        &[Assertion::status_matches(StatusExpectation::denied())],
    )
    .await?;
    Ok(())
}
