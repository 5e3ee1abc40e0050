//! Memoized sample lookups.

use std::collections::HashMap;
use std::sync::Arc;

use cadastre_domain::{Query, Resource, fields};
use tokio::sync::Mutex;
use tracing::debug;

use crate::client::AuthenticatedClient;
use crate::error::{ApiError, ClientResult};

/// Page size when any item will do.
const FIRST_PAGE_SIZE: u32 = 1;
/// Page size when searching for an item carrying a field.
const SEARCH_PAGE_SIZE: u32 = 100;

/// What to look for in a list endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRequest {
    collection: String,
    query: Query,
    field: Option<String>,
}

impl SampleRequest {
    /// The first item of the collection.
    #[must_use]
    pub fn first(collection: impl Into<String>, query: Query) -> Self {
        Self {
            collection: collection.into(),
            query,
            field: None,
        }
    }

    /// The first item with a non-empty `field`.
    #[must_use]
    pub fn with_field(collection: impl Into<String>, query: Query, field: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            query,
            field: Some(field.into()),
        }
    }

    /// Human-readable target, for skip messages.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut out = self.collection.clone();
        if !self.query.is_empty() {
            out.push('?');
            out.push_str(&self.query.cache_key());
        }
        if let Some(field) = &self.field {
            out.push_str(&format!(" with {field}"));
        }
        out
    }

    fn effective_query(&self) -> Query {
        let mut query = self.query.clone();
        if query.get("page_size").is_none() {
            let size = if self.field.is_some() {
                SEARCH_PAGE_SIZE
            } else {
                FIRST_PAGE_SIZE
            };
            query.push("page_size", size);
        }
        query
    }
}

/// Samples found so far, keyed by user and request.
///
/// Absent samples are cached too, so an empty collection is listed once.
#[derive(Debug, Clone, Default)]
pub struct SampleCache {
    entries: Arc<Mutex<HashMap<String, Option<Resource>>>>,
}

impl SampleCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached sample or lists the collection to find one.
    ///
    /// # Errors
    ///
    /// Returns an error if the list request fails, is rejected, or its body
    /// has no `data` array.
    pub async fn fetch(
        &self,
        client: &AuthenticatedClient,
        request: &SampleRequest,
    ) -> ClientResult<Option<Resource>> {
        let user = client
            .session()
            .and_then(|s| s.username.clone())
            .unwrap_or_default();
        let key = format!("{user}|{}", request.describe());

        let mut entries = self.entries.lock().await;
        if let Some(cached) = entries.get(&key) {
            return Ok(cached.clone());
        }

        let response = client
            .get(&request.collection, Some(&request.effective_query()))
            .await?;
        if !response.is_success() {
            return Err(ApiError::from_response(&response));
        }
        let json = response
            .body_as_json()
            .ok_or_else(|| ApiError::decode(&response, "list response is not JSON"))?;
        let items = fields::field(&json, "data")
            .and_then(|data| data.as_array())
            .ok_or_else(|| ApiError::decode(&response, "list response has no data array"))?;

        let found = items
            .iter()
            .cloned()
            .map(Resource::new)
            .find(|item| request.field.as_deref().is_none_or(|field| item.has(field)));
        debug!(sample = %key, found = found.is_some(), "sample lookup");
        entries.insert(key, found.clone());
        Ok(found)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use cadastre_domain::{ApiResponse, Session};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn client(transport: &Arc<ScriptedTransport>) -> AuthenticatedClient {
        AuthenticatedClient::new(transport.clone(), "https://cadastre.test/api")
            .with_session(Session::bearer("rool1", "t", "geometry_fix"))
    }

    #[tokio::test]
    async fn test_first_sample_is_memoized() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(ApiResponse::json(200, &json!({"data": [{"ID": 7}], "meta": {}})));
        let client = client(&transport);
        let cache = SampleCache::new();
        let query = Query::new().param("status", "geometry_fix");

        let request = SampleRequest::first("/cadastre", query);
        let first = cache.fetch(&client, &request).await.unwrap().unwrap();
        let again = cache.fetch(&client, &request).await.unwrap().unwrap();

        assert_eq!(first.id().as_deref(), Some("7"));
        assert_eq!(first, again);
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].query.get("page_size"), Some("1"));
        assert_eq!(requests[0].query.get("status"), Some("geometry_fix"));
    }

    #[tokio::test]
    async fn test_empty_collection_is_cached_as_absent() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(ApiResponse::json(200, &json!({"data": []})));
        let client = client(&transport);
        let cache = SampleCache::new();
        let request = SampleRequest::first("/cadastre", Query::new());

        assert!(cache.fetch(&client, &request).await.unwrap().is_none());
        assert!(cache.fetch(&client, &request).await.unwrap().is_none());
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_search_by_field_uses_larger_page() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(ApiResponse::json(
            200,
            &json!({"data": [{"id": 1, "screenshot": ""}, {"id": 2, "screenshot": "a.png"}]}),
        ));
        let client = client(&transport);
        let request = SampleRequest::with_field("/cadastre", Query::new(), "screenshot");

        let found = SampleCache::new().fetch(&client, &request).await.unwrap().unwrap();
        assert_eq!(found.id().as_deref(), Some("2"));
        assert_eq!(transport.requests()[0].query.get("page_size"), Some("100"));
    }

    #[tokio::test]
    async fn test_rejected_list_is_an_error() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(ApiResponse::json(403, &json!({"error": "forbidden"})));
        let err = SampleCache::new()
            .fetch(&client(&transport), &SampleRequest::first("/users", Query::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Permission { status: 403, .. }));
    }

    #[test]
    fn test_describe() {
        let request = SampleRequest::with_field(
            "/cadastre",
            Query::new().param("status", "verdict"),
            "land_plan",
        );
        assert_eq!(request.describe(), "/cadastre?status=verdict with land_plan");
    }
}
