//! Scenario harness
//!
//! Owns one memoized session per role, a shared sample cache, and runs
//! scenario bodies with guaranteed cleanup.

mod context;
mod sample;
mod teardown;

pub use context::ScenarioContext;
pub use sample::{SampleCache, SampleRequest};
pub use teardown::Teardown;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use cadastre_domain::{AuthScheme, Credential, ScenarioOutcome, ScenarioReport, ScenarioState};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::client::AuthenticatedClient;
use crate::error::{ApiError, ClientResult, ScenarioError, ScenarioResult};
use crate::ports::{HttpTransport, ResponseVerifier};
use context::RunState;

enum SessionSlot {
    Ready(Arc<AuthenticatedClient>),
    Failed(String),
}

/// Runs scenarios against one deployment.
///
/// Sessions are established at most once per username; a failed login is
/// remembered and never retried.
pub struct TestScenarioHarness {
    transport: Arc<dyn HttpTransport>,
    verifier: Arc<dyn ResponseVerifier>,
    base_url: String,
    sessions: HashMap<String, SessionSlot>,
    samples: SampleCache,
}

impl TestScenarioHarness {
    /// Creates a harness for the service at `base_url`.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        verifier: Arc<dyn ResponseVerifier>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            verifier,
            base_url: base_url.into(),
            sessions: HashMap::new(),
            samples: SampleCache::new(),
        }
    }

    /// Returns a client with no session.
    #[must_use]
    pub fn anonymous_client(&self) -> AuthenticatedClient {
        AuthenticatedClient::new(Arc::clone(&self.transport), self.base_url.clone())
    }

    /// Returns a client that sends a static scheme with every request.
    #[must_use]
    pub fn scheme_client(&self, scheme: AuthScheme) -> Arc<AuthenticatedClient> {
        Arc::new(AuthenticatedClient::with_scheme(
            Arc::clone(&self.transport),
            self.base_url.clone(),
            scheme,
        ))
    }

    /// Returns the logged-in client for `credential`, logging in on first use.
    ///
    /// # Errors
    ///
    /// Returns the login failure the first time, and
    /// [`ApiError::SessionUnavailable`] on later calls for the same user.
    pub async fn session_client(
        &mut self,
        credential: &Credential,
    ) -> ClientResult<Arc<AuthenticatedClient>> {
        match self.sessions.get(&credential.username) {
            Some(SessionSlot::Ready(client)) => return Ok(Arc::clone(client)),
            Some(SessionSlot::Failed(reason)) => {
                return Err(ApiError::SessionUnavailable {
                    username: credential.username.clone(),
                    reason: reason.clone(),
                });
            }
            None => {}
        }

        let mut client = self.anonymous_client();
        match client.login(credential).await {
            Ok(_) => {
                let client = Arc::new(client);
                self.sessions.insert(
                    credential.username.clone(),
                    SessionSlot::Ready(Arc::clone(&client)),
                );
                Ok(client)
            }
            Err(e) => {
                error!(username = %credential.username, error = %e, "login failed");
                self.sessions
                    .insert(credential.username.clone(), SessionSlot::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Logs in as `credential` and runs the scenario.
    ///
    /// A failed login fails the scenario without running its body.
    pub async fn run<F, Fut>(
        &mut self,
        name: &str,
        credential: &Credential,
        scenario: F,
    ) -> ScenarioReport
    where
        F: FnOnce(ScenarioContext) -> Fut,
        Fut: Future<Output = ScenarioResult>,
    {
        match self.session_client(credential).await {
            Ok(client) => self.run_as(name, client, scenario).await,
            Err(e) => {
                let report = ScenarioReport {
                    name: name.to_string(),
                    outcome: ScenarioOutcome::Failed,
                    states: vec![ScenarioState::NotStarted, ScenarioState::Failed],
                    message: Some(e.to_string()),
                    last_status: e.status(),
                    last_body: e.body().map(str::to_string),
                    duration: std::time::Duration::ZERO,
                    cleanup_failures: Vec::new(),
                };
                warn!(scenario = name, "not run: no session");
                report
            }
        }
    }

    /// Runs the scenario with an already authenticated client.
    ///
    /// Registered teardowns run in reverse order after the body, whether it
    /// passed, failed or skipped. Teardown failures are recorded in the
    /// report and never change its outcome.
    pub async fn run_as<F, Fut>(
        &self,
        name: &str,
        client: Arc<AuthenticatedClient>,
        scenario: F,
    ) -> ScenarioReport
    where
        F: FnOnce(ScenarioContext) -> Fut,
        Fut: Future<Output = ScenarioResult>,
    {
        let started = Instant::now();
        let state = Arc::new(Mutex::new(RunState::default()));
        state.lock().await.advance(ScenarioState::Authenticated);

        let context = ScenarioContext::new(
            name,
            client,
            Arc::clone(&self.verifier),
            self.samples.clone(),
            Arc::clone(&state),
        );
        let result = scenario(context).await;

        let mut state = state.lock().await;
        let (outcome, message) = match result {
            Ok(()) => {
                state.advance(ScenarioState::Executed);
                (ScenarioOutcome::Passed, None)
            }
            Err(ScenarioError::Skipped(reason)) => {
                state.advance(ScenarioState::Skipped);
                warn!(scenario = name, %reason, "skipped");
                (ScenarioOutcome::Skipped, Some(reason))
            }
            Err(e) => {
                state.advance(ScenarioState::Failed);
                (ScenarioOutcome::Failed, Some(e.to_string()))
            }
        };

        let mut cleanup_failures = Vec::new();
        while let Some(teardown) = state.teardowns.pop() {
            if let Err(failure) = teardown.run().await {
                warn!(scenario = name, %failure, "cleanup failed");
                cleanup_failures.push(failure);
            }
        }
        if outcome == ScenarioOutcome::Passed {
            state.advance(ScenarioState::CleanedUp);
        }

        let report = ScenarioReport {
            name: name.to_string(),
            outcome,
            states: state.lifecycle.history().to_vec(),
            message,
            last_status: state.last_status,
            last_body: state.last_body.take(),
            duration: started.elapsed(),
            cleanup_failures,
        };
        info!(
            scenario = name,
            outcome = report.outcome.label(),
            elapsed_ms = u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX),
            "scenario finished"
        );
        report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedTransport, StatusOnlyVerifier};
    use cadastre_domain::{ApiResponse, Assertion, Query, StatusExpectation};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn harness(transport: &Arc<ScriptedTransport>) -> TestScenarioHarness {
        TestScenarioHarness::new(
            transport.clone(),
            Arc::new(StatusOnlyVerifier),
            "https://cadastre.test/api",
        )
    }

    fn login_ok(transport: &ScriptedTransport) {
        transport.respond(ApiResponse::json(200, &json!({"token": "tok", "role": "root"})));
    }

    fn root() -> Credential {
        Credential::new("root", "root")
    }

    fn created() -> StatusExpectation {
        StatusExpectation::exact(201)
    }

    #[tokio::test]
    async fn test_login_happens_once_per_user() {
        let transport = Arc::new(ScriptedTransport::new());
        login_ok(&transport);
        let mut harness = harness(&transport);

        let first = harness.session_client(&root()).await.unwrap();
        let second = harness.session_client(&root()).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_login_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(ApiResponse::json(401, &json!({"error": "invalid"})));
        let mut harness = harness(&transport);

        let report = harness.run("first", &root(), |_| async { Ok(()) }).await;
        assert_eq!(report.outcome, ScenarioOutcome::Failed);
        assert_eq!(report.last_status, Some(401));

        let report = harness.run("second", &root(), |_| async { Ok(()) }).await;
        assert_eq!(report.outcome, ScenarioOutcome::Failed);
        assert!(report.message.unwrap().contains("no session for root"));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_passing_scenario_visits_every_state() {
        let transport = Arc::new(ScriptedTransport::new());
        login_ok(&transport);
        transport.respond(ApiResponse::json(200, &json!({"data": [{"id": 3}]})));
        transport.respond(ApiResponse::json(200, &json!({"id": 3})));
        let mut harness = harness(&transport);

        let report = harness
            .run("get item", &root(), |ctx| async move {
                let item = ctx.sample("/cadastre", &Query::new()).await?;
                let id = item.id().unwrap();
                let response = ctx.client().get(&format!("/cadastre/{id}"), None).await?;
                ctx.expect(&response, &[Assertion::status(200)]).await?;
                Ok(())
            })
            .await;

        assert_eq!(report.outcome, ScenarioOutcome::Passed, "{report}");
        assert_eq!(
            report.states,
            vec![
                ScenarioState::NotStarted,
                ScenarioState::Authenticated,
                ScenarioState::ResourceReady,
                ScenarioState::Executed,
                ScenarioState::CleanedUp,
            ]
        );
        assert_eq!(report.last_status, Some(200));
    }

    #[tokio::test]
    async fn test_missing_sample_skips() {
        let transport = Arc::new(ScriptedTransport::new());
        login_ok(&transport);
        transport.respond(ApiResponse::json(200, &json!({"data": []})));
        let mut harness = harness(&transport);

        let report = harness
            .run("needs sample", &root(), |ctx| async move {
                ctx.sample("/cadastre", &Query::new()).await?;
                Ok(())
            })
            .await;

        assert_eq!(report.outcome, ScenarioOutcome::Skipped);
        assert_eq!(report.final_state(), ScenarioState::Skipped);
    }

    #[tokio::test]
    async fn test_teardown_runs_after_failure_in_reverse_order() {
        let transport = Arc::new(ScriptedTransport::new());
        login_ok(&transport);
        transport.respond(ApiResponse::json(201, &json!({"user": {"id": 10}})));
        transport.respond(ApiResponse::json(201, &json!({"user": {"id": 11}})));
        transport.respond(ApiResponse::json(500, &json!({"error": "boom"})));
        transport.respond(ApiResponse::json(200, &json!({})));
        transport.respond(ApiResponse::json(404, &json!({})));
        let mut harness = harness(&transport);

        let report = harness
            .run("create and fail", &root(), |ctx| async move {
                ctx.provision("/users", &json!({"username": "a"}), Some("user"), created()).await?;
                ctx.provision("/users", &json!({"username": "b"}), Some("user"), created()).await?;
                let response = ctx.client().get("/users", None).await?;
                ctx.expect(&response, &[Assertion::status(200)]).await?;
                Ok(())
            })
            .await;

        assert_eq!(report.outcome, ScenarioOutcome::Failed);
        assert_eq!(report.last_status, Some(500));
        assert!(report.last_body.unwrap().contains("boom"));
        assert!(report.cleanup_failures.is_empty());
        let paths = transport.paths();
        assert_eq!(
            paths[paths.len() - 2..],
            [
                "DELETE https://cadastre.test/api/users/11".to_string(),
                "DELETE https://cadastre.test/api/users/10".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_cleanup_failure_is_recorded_not_escalated() {
        let transport = Arc::new(ScriptedTransport::new());
        login_ok(&transport);
        transport.respond(ApiResponse::json(201, &json!({"id": 4})));
        transport.respond(ApiResponse::json(500, &json!({"error": "locked"})));
        let mut harness = harness(&transport);

        let report = harness
            .run("create", &root(), |ctx| async move {
                ctx.provision("/users", &json!({}), None, created()).await?;
                Ok(())
            })
            .await;

        assert_eq!(report.outcome, ScenarioOutcome::Passed);
        assert_eq!(report.cleanup_failures.len(), 1);
        assert!(report.cleanup_failures[0].contains("returned 500"));
    }

    #[tokio::test]
    async fn test_rejected_provision_fails_with_status() {
        let transport = Arc::new(ScriptedTransport::new());
        login_ok(&transport);
        transport.respond(ApiResponse::json(422, &json!({"error": "username taken"})));
        let mut harness = harness(&transport);

        let report = harness
            .run("create", &root(), |ctx| async move {
                ctx.provision("/users", &json!({}), Some("user"), created()).await?;
                Ok(())
            })
            .await;

        assert_eq!(report.outcome, ScenarioOutcome::Failed);
        assert!(report.message.unwrap().contains("validation failed (HTTP 422)"));
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_create_with_wrong_success_status_fails_and_cleans_up() {
        let transport = Arc::new(ScriptedTransport::new());
        login_ok(&transport);
        transport.respond(ApiResponse::json(200, &json!({"user": {"ID": 12}})));
        transport.respond(ApiResponse::json(200, &json!({})));
        let mut harness = harness(&transport);

        let report = harness
            .run("create", &root(), |ctx| async move {
                ctx.provision("/users", &json!({}), Some("user"), created()).await?;
                Ok(())
            })
            .await;

        assert_eq!(report.outcome, ScenarioOutcome::Failed);
        assert_eq!(
            report.message.as_deref(),
            Some("create returned 200, expected status = 201")
        );
        assert_eq!(
            transport.paths().last().map(String::as_str),
            Some("DELETE https://cadastre.test/api/users/12")
        );
    }

    #[tokio::test]
    async fn test_scheme_client_skips_login() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(ApiResponse::json(202, &json!({})));
        let harness = harness(&transport);
        let client = harness.scheme_client(AuthScheme::basic("cadastre", "pw"));

        let report = harness
            .run_as("push", client, |ctx| async move {
                let response = ctx.client().get("/ping", None).await?;
                ctx.expect(&response, &[Assertion::status_in(&[200, 202])]).await?;
                Ok(())
            })
            .await;

        assert!(report.passed());
        assert!(transport.requests()[0].header("authorization").unwrap().starts_with("Basic "));
    }
}
