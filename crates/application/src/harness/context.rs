//! Per-scenario context handed to scenario bodies.

use std::sync::Arc;

use cadastre_domain::{
    ApiResponse, Assertion, Query, Resource, ScenarioLifecycle, ScenarioState, StatusExpectation,
    TestResults, fields,
};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::sample::{SampleCache, SampleRequest};
use super::teardown::Teardown;
use crate::client::AuthenticatedClient;
use crate::error::{ApiError, ScenarioError, ScenarioResult};
use crate::ports::ResponseVerifier;

/// Body excerpt kept for the report.
const REPORT_BODY_LIMIT: usize = 1000;

/// Mutable state of one scenario run.
#[derive(Debug, Default)]
pub(super) struct RunState {
    pub(super) lifecycle: ScenarioLifecycle,
    pub(super) teardowns: Vec<Teardown>,
    pub(super) last_status: Option<u16>,
    pub(super) last_body: Option<String>,
}

impl RunState {
    pub(super) fn advance(&mut self, next: ScenarioState) {
        if let Err(e) = self.lifecycle.advance(next) {
            warn!(error = %e, "ignoring lifecycle transition");
        }
    }
}

/// Handle a scenario body uses to reach the service.
///
/// Cloning is cheap; clones share the same teardown registry and
/// last-response record.
#[derive(Clone)]
pub struct ScenarioContext {
    name: Arc<str>,
    client: Arc<AuthenticatedClient>,
    verifier: Arc<dyn ResponseVerifier>,
    samples: SampleCache,
    state: Arc<Mutex<RunState>>,
}

impl ScenarioContext {
    pub(super) fn new(
        name: &str,
        client: Arc<AuthenticatedClient>,
        verifier: Arc<dyn ResponseVerifier>,
        samples: SampleCache,
        state: Arc<Mutex<RunState>>,
    ) -> Self {
        Self {
            name: Arc::from(name),
            client,
            verifier,
            samples,
            state,
        }
    }

    /// Scenario name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The role client this scenario runs as.
    #[must_use]
    pub fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    /// Shared handle to the role client, e.g. for custom teardowns.
    #[must_use]
    pub fn shared_client(&self) -> Arc<AuthenticatedClient> {
        Arc::clone(&self.client)
    }

    /// Returns the first item of `collection`, fetched with page size 1.
    ///
    /// # Errors
    ///
    /// Skips the scenario when the collection is empty and fails it when
    /// the list request is rejected.
    pub async fn sample(&self, collection: &str, query: &Query) -> ScenarioResult<Resource> {
        let request = SampleRequest::first(collection, query.clone());
        self.resolve_sample(request).await
    }

    /// Returns the first item of `collection` with a non-empty `field`,
    /// searching a page of 100 items.
    ///
    /// # Errors
    ///
    /// Skips the scenario when no item carries the field.
    pub async fn sample_with(
        &self,
        collection: &str,
        query: &Query,
        field: &str,
    ) -> ScenarioResult<Resource> {
        let request = SampleRequest::with_field(collection, query.clone(), field);
        self.resolve_sample(request).await
    }

    async fn resolve_sample(&self, request: SampleRequest) -> ScenarioResult<Resource> {
        let description = request.describe();
        let found = self.samples.fetch(&self.client, &request).await?;
        match found {
            Some(resource) => {
                self.state.lock().await.advance(ScenarioState::ResourceReady);
                Ok(resource)
            }
            None => Err(ScenarioError::skip(format!("no sample found in {description}"))),
        }
    }

    /// Creates a record with `POST collection` and registers its deletion.
    ///
    /// `envelope` names the member holding the record, e.g. `user`, when the
    /// service does not return it at the top level. A record created with a
    /// success status other than `created` is still torn down.
    ///
    /// # Errors
    ///
    /// Fails the scenario when creation is rejected, answers with a status
    /// outside `created`, or the response carries no identifier.
    pub async fn provision<T: Serialize + Sync>(
        &self,
        collection: &str,
        payload: &T,
        envelope: Option<&str>,
        created: StatusExpectation,
    ) -> ScenarioResult<Resource> {
        let response = self.client.post_json(collection, payload).await?;
        self.record(&response).await;
        if !response.is_success() {
            return Err(ApiError::from_response(&response).into());
        }
        let json = self.json(&response)?;
        let record = match envelope {
            Some(key) => fields::field(&json, key).cloned(),
            None => Some(json),
        }
        .map(Resource::new)
        .ok_or_else(|| ApiError::decode(&response, "created record is missing"))?;
        let id = record
            .id()
            .ok_or_else(|| ApiError::decode(&response, "created record has no id"))?;

        let path = format!("{}/{id}", collection.trim_end_matches('/'));
        debug!(scenario = %self.name, %path, "provisioned");
        {
            let mut state = self.state.lock().await;
            state.teardowns.push(Teardown::delete(
                self.shared_client(),
                path,
                format!("{collection} {id}"),
            ));
            state.advance(ScenarioState::ResourceReady);
        }

        if !created.matches(response.status) {
            return Err(ScenarioError::fail(format!(
                "create returned {}, expected status {}",
                response.status,
                created.description()
            )));
        }
        Ok(record)
    }

    /// Registers a teardown to run after the scenario body.
    pub async fn defer(&self, teardown: Teardown) {
        self.state.lock().await.teardowns.push(teardown);
    }

    /// Records a response as the scenario's latest, for the report.
    pub async fn record(&self, response: &ApiResponse) {
        let mut state = self.state.lock().await;
        state.last_status = Some(response.status);
        state.last_body = Some(response.body_preview(REPORT_BODY_LIMIT));
    }

    /// Records the response and checks every assertion against it.
    ///
    /// # Errors
    ///
    /// Fails the scenario with the failed assertions, one per line.
    pub async fn expect(
        &self,
        response: &ApiResponse,
        assertions: &[Assertion],
    ) -> ScenarioResult<TestResults> {
        self.record(response).await;
        let results = self.verifier.verify(assertions, response);
        if results.all_passed() {
            Ok(results)
        } else {
            Err(ScenarioError::fail(results.failure_summary()))
        }
    }

    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Fails with a decode error carrying the status and body.
    pub fn json(&self, response: &ApiResponse) -> ScenarioResult<Value> {
        response
            .body_as_json()
            .ok_or_else(|| ApiError::decode(response, "body is not JSON").into())
    }

    /// Fails the scenario with `message` unless `condition` holds.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Failed`] when the condition is false.
    pub fn ensure(condition: bool, message: impl Into<String>) -> ScenarioResult {
        if condition {
            Ok(())
        } else {
            Err(ScenarioError::fail(message))
        }
    }
}
