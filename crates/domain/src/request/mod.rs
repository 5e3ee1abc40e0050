//! HTTP request types

mod body;
mod method;
mod query;

pub use body::{FormPart, MultipartForm, RequestBody};
pub use method::HttpMethod;
pub use query::{Query, QueryParam};

/// A fully resolved request, ready for a transport to send.
///
/// The client fills in the absolute URL and every header, including
/// `Authorization` when the request is authenticated.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute URL without the query string.
    pub url: String,
    /// Query parameters appended by the transport.
    pub query: Query,
    /// Request headers in send order.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: RequestBody,
}

impl ApiRequest {
    /// Creates a request with no headers, query or body.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Query::new(),
            headers: Vec::new(),
            body: RequestBody::None,
        }
    }

    /// Sets the query (builder pattern).
    #[must_use]
    pub fn with_query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    /// Sets the body (builder pattern).
    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Adds or replaces a header (case-insensitive name match).
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Gets a header value by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if an `Authorization` header is attached.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.header("authorization").is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_header_replaces_case_insensitively() {
        let request = ApiRequest::new(HttpMethod::Get, "https://example.com/api/cadastre")
            .with_header("Authorization", "Bearer a")
            .with_header("authorization", "Bearer b");

        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header("AUTHORIZATION"), Some("Bearer b"));
        assert!(request.is_authenticated());
    }

    #[test]
    fn test_new_request_is_anonymous() {
        let request = ApiRequest::new(HttpMethod::Delete, "https://example.com/api/users/1");
        assert!(!request.is_authenticated());
        assert!(request.body.is_none());
    }
}
