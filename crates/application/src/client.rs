//! Authenticated HTTP client
//!
//! Wraps a transport with a base URL and an optional session. Every verb
//! returns the raw [`ApiResponse`] whatever its status, so scenarios can
//! assert on rejections as readily as on successes. Requests are never
//! retried.

use std::sync::Arc;

use cadastre_domain::{
    ApiRequest, ApiResponse, AuthScheme, Credential, DomainError, FormPart, HttpMethod,
    MultipartForm, Query, RequestBody, Session, fields,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ApiError, ClientResult};
use crate::ports::HttpTransport;

/// Login endpoint, relative to the base URL.
pub const LOGIN_PATH: &str = "/auth/login";

/// A transport bound to a base URL and, once logged in, a session.
#[derive(Clone)]
pub struct AuthenticatedClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    session: Option<Session>,
}

impl std::fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl AuthenticatedClient {
    /// Creates a client with no session.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
            session: None,
        }
    }

    /// Creates a client around a static scheme such as integration Basic auth.
    #[must_use]
    pub fn with_scheme(
        transport: Arc<dyn HttpTransport>,
        base_url: impl Into<String>,
        scheme: AuthScheme,
    ) -> Self {
        Self::new(transport, base_url).with_session(Session::with_scheme(scheme))
    }

    /// Attaches a session (builder pattern).
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Returns the current session.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Returns the base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins a path onto the base URL.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let path = path.trim_start_matches('/');
        format!("{}/{path}", self.base_url)
    }

    /// Logs in and stores the resulting bearer session.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Auth`] if the status is not 200 or the token is
    /// missing, [`ApiError::Decode`] if the body is not JSON, and
    /// [`ApiError::Transport`] if the request could not be sent.
    pub async fn login(&mut self, credential: &Credential) -> ClientResult<Session> {
        credential.validate()?;
        let body = to_json(credential)?;
        let request = ApiRequest::new(HttpMethod::Post, self.url(LOGIN_PATH))
            .with_header("Accept", "application/json")
            .with_body(RequestBody::json(body));
        let response = self.transport.send(request).await?;

        let auth_error = |response: &ApiResponse| ApiError::Auth {
            username: credential.username.clone(),
            status: response.status,
            body: response.body.clone(),
        };
        if response.status != 200 {
            return Err(auth_error(&response));
        }
        let json = response
            .body_as_json()
            .ok_or_else(|| ApiError::decode(&response, "login response is not JSON"))?;
        let token = fields::lookup_string(&json, "token")
            .filter(|t| !t.is_empty())
            .ok_or_else(|| auth_error(&response))?;
        let role = fields::lookup_string(&json, "role").unwrap_or_default();

        let session = Session::bearer(&credential.username, token, role);
        info!(
            username = %credential.username,
            role = session.role.as_deref().unwrap_or(""),
            token = %session.scheme.redacted(),
            "logged in"
        );
        self.session = Some(session.clone());
        Ok(session)
    }

    /// Sends `GET path` with an optional query.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the request could not be sent.
    pub async fn get(&self, path: &str, query: Option<&Query>) -> ClientResult<ApiResponse> {
        let mut request = self.authorized(HttpMethod::Get, path);
        if let Some(query) = query {
            request = request.with_query(query.clone());
        }
        self.send(request).await
    }

    /// Sends `POST path`.
    ///
    /// With no files the body is JSON; with files it becomes a multipart
    /// form whose text fields are the body's top-level members.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the request could not be sent.
    pub async fn post(
        &self,
        path: &str,
        body: Option<Value>,
        files: Vec<FormPart>,
    ) -> ClientResult<ApiResponse> {
        let body = if files.is_empty() {
            body.map_or(RequestBody::None, RequestBody::json)
        } else {
            let members = match body {
                Some(Value::Object(map)) => map,
                _ => serde_json::Map::new(),
            };
            RequestBody::Multipart(MultipartForm::from_fields(&members, files))
        };
        self.send(self.authorized(HttpMethod::Post, path).with_body(body))
            .await
    }

    /// Sends `POST path` with a serializable JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Domain`] if the payload cannot be serialized and
    /// [`ApiError::Transport`] if the request could not be sent.
    pub async fn post_json<T: Serialize + Sync>(
        &self,
        path: &str,
        payload: &T,
    ) -> ClientResult<ApiResponse> {
        self.post(path, Some(to_json(payload)?), Vec::new()).await
    }

    /// Sends `POST path` with a prepared multipart form.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the request could not be sent.
    pub async fn post_form(&self, path: &str, form: MultipartForm) -> ClientResult<ApiResponse> {
        let request = self
            .authorized(HttpMethod::Post, path)
            .with_body(RequestBody::Multipart(form));
        self.send(request).await
    }

    /// Sends `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Domain`] if the payload cannot be serialized and
    /// [`ApiError::Transport`] if the request could not be sent.
    pub async fn put<T: Serialize + Sync>(
        &self,
        path: &str,
        payload: &T,
    ) -> ClientResult<ApiResponse> {
        let body = RequestBody::json(to_json(payload)?);
        self.send(self.authorized(HttpMethod::Put, path).with_body(body))
            .await
    }

    /// Sends `PATCH path` with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Domain`] if the payload cannot be serialized and
    /// [`ApiError::Transport`] if the request could not be sent.
    pub async fn patch<T: Serialize + Sync>(
        &self,
        path: &str,
        payload: &T,
    ) -> ClientResult<ApiResponse> {
        let body = RequestBody::json(to_json(payload)?);
        self.send(self.authorized(HttpMethod::Patch, path).with_body(body))
            .await
    }

    /// Sends `PATCH path` with no body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the request could not be sent.
    pub async fn patch_empty(&self, path: &str) -> ClientResult<ApiResponse> {
        self.send(self.authorized(HttpMethod::Patch, path)).await
    }

    /// Sends a verbatim body, e.g. deliberately malformed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the request could not be sent.
    pub async fn send_raw(
        &self,
        method: HttpMethod,
        path: &str,
        content: impl Into<String>,
        content_type: impl Into<String>,
    ) -> ClientResult<ApiResponse> {
        let request = self
            .authorized(method, path)
            .with_body(RequestBody::raw(content, content_type));
        self.send(request).await
    }

    /// Sends `DELETE path`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the request could not be sent.
    pub async fn delete(&self, path: &str) -> ClientResult<ApiResponse> {
        self.send(self.authorized(HttpMethod::Delete, path)).await
    }

    /// Sends a request without any `Authorization` header.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the request could not be sent.
    pub async fn request_unauthenticated(
        &self,
        method: HttpMethod,
        path: &str,
        body: RequestBody,
    ) -> ClientResult<ApiResponse> {
        let request = ApiRequest::new(method, self.url(path))
            .with_header("Accept", "application/json")
            .with_body(body);
        self.send(request).await
    }

    /// Sends a request with an explicit `Authorization` value instead of the
    /// session's, e.g. a forged bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the request could not be sent.
    pub async fn request_with_authorization(
        &self,
        method: HttpMethod,
        path: &str,
        scheme: &AuthScheme,
    ) -> ClientResult<ApiResponse> {
        let request = ApiRequest::new(method, self.url(path))
            .with_header("Accept", "application/json")
            .with_header("Authorization", scheme.header_value());
        self.send(request).await
    }

    /// Sends a prepared request as is.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the request could not be sent.
    pub async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let method = request.method;
        let url = request.url.clone();
        let response = self.transport.send(request).await?;
        debug!(
            %method,
            %url,
            status = response.status,
            elapsed = %response.duration_display(),
            "request completed"
        );
        Ok(response)
    }

    fn authorized(&self, method: HttpMethod, path: &str) -> ApiRequest {
        let mut request = ApiRequest::new(method, self.url(path));
        if let Some(session) = &self.session {
            for (name, value) in &session.default_headers {
                request = request.with_header(name.clone(), value.clone());
            }
            request = request.with_header("Authorization", session.authorization());
        }
        request
    }
}

fn to_json<T: Serialize>(payload: &T) -> ClientResult<Value> {
    serde_json::to_value(payload)
        .map_err(|e| ApiError::Domain(DomainError::InvalidBody(e.to_string())))
}
