//! HTTP transport implementation using reqwest.
//!
//! This adapter implements the `HttpTransport` port. It sends exactly one
//! request per call and reads the whole body; it never retries.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use cadastre_application::{HttpTransport, TransportError, TransportFuture};
use cadastre_domain::{ApiRequest, ApiResponse, HttpMethod, Query};
use reqwest::{Client, Method};
use url::Url;

use crate::http::{BuiltBody, build_body};

/// Transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Creates a transport with the given per-request timeout.
    ///
    /// Redirects are not followed: a redirect is a response a scenario
    /// should see.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("cadastre-acceptance/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    fn map_error(&self, error: &reqwest::Error) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout {
                timeout_ms: self.timeout_ms(),
            };
        }
        if error.is_connect() {
            let message = error.to_string();
            let lower = message.to_lowercase();
            if lower.contains("dns") || lower.contains("resolve") {
                return TransportError::DnsError {
                    host: error
                        .url()
                        .and_then(Url::host_str)
                        .unwrap_or("unknown")
                        .to_string(),
                    message,
                };
            }
            return TransportError::ConnectionFailed(message);
        }
        if error.is_body() || error.is_decode() {
            return TransportError::BodyRead(error.to_string());
        }
        TransportError::Other(error.to_string())
    }
}

/// Parses the URL and appends the query string.
fn build_url(url: &str, query: &Query) -> Result<Url, TransportError> {
    let mut parsed =
        Url::parse(url).map_err(|e| TransportError::InvalidUrl(format!("{e}: {url}")))?;
    if !query.is_empty() {
        let encoded = serde_urlencoded::to_string(query.pairs())
            .map_err(|e| TransportError::InvalidUrl(format!("{e}: {url}")))?;
        parsed.set_query(Some(&encoded));
    }
    Ok(parsed)
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
        Box::pin(async move {
            let url = build_url(&request.url, &request.query)?;
            let body = build_body(&request.body)
                .await
                .map_err(|e| TransportError::InvalidBody(e.to_string()))?;

            let start = Instant::now();
            let mut builder = self
                .client
                .request(Self::to_reqwest_method(request.method), url)
                .timeout(self.timeout);

            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            if let Some(content_type) = body.content_type()
                && request.header("content-type").is_none()
            {
                builder = builder.header("Content-Type", content_type);
            }
            builder = match body {
                BuiltBody::None => builder,
                BuiltBody::Text { content, .. } => builder.body(content),
                BuiltBody::Multipart(form) => builder.multipart(form),
            };

            let response = builder.send().await.map_err(|e| self.map_error(&e))?;
            let status = response.status().as_u16();
            let headers: HashMap<String, String> = response
                .headers()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
                .collect();
            let bytes = response
                .bytes()
                .await
                .map_err(|e| TransportError::BodyRead(e.to_string()))?
                .to_vec();

            Ok(ApiResponse::new(status, headers, bytes, start.elapsed()))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use cadastre_domain::{MultipartForm, RequestBody};
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport() -> ReqwestTransport {
        ReqwestTransport::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_to_reqwest_method() {
        assert_eq!(ReqwestTransport::to_reqwest_method(HttpMethod::Get), Method::GET);
        assert_eq!(ReqwestTransport::to_reqwest_method(HttpMethod::Patch), Method::PATCH);
        assert_eq!(ReqwestTransport::to_reqwest_method(HttpMethod::Delete), Method::DELETE);
    }

    #[test]
    fn test_build_url_encodes_query() {
        let query = Query::new().param("page", 1).param("status", "geometry fix");
        let url = build_url("https://cadastre.test/api/cadastre", &query).unwrap();
        assert_eq!(
            url.as_str(),
            "https://cadastre.test/api/cadastre?page=1&status=geometry+fix"
        );
        assert!(matches!(
            build_url("not a url", &Query::new()),
            Err(TransportError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_get_with_query_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cadastre"))
            .and(query_param("page_size", "1"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": [{"id": 1}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let request = ApiRequest::new(HttpMethod::Get, format!("{}/api/cadastre", server.uri()))
            .with_query(Query::new().param("page_size", 1))
            .with_header("Authorization", "Bearer tok");
        let response = transport().send(request).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.field_string("data.0.id").as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_json_body_and_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/cadastre/5/verification"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({"verified": true})))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let request = ApiRequest::new(
            HttpMethod::Patch,
            format!("{}/cadastre/5/verification", server.uri()),
        )
        .with_body(RequestBody::json(serde_json::json!({"verified": true})));
        let response = transport().send(request).await.unwrap();

        assert_eq!(response.status, 403);
        assert_eq!(response.body, "forbidden");
    }

    #[tokio::test]
    async fn test_raw_body_sent_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(body_string("{invalid"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let request = ApiRequest::new(HttpMethod::Patch, format!("{}/x", server.uri()))
            .with_body(RequestBody::raw("{invalid", "application/json"));
        assert_eq!(transport().send(request).await.unwrap().status, 400);
    }

    #[tokio::test]
    async fn test_multipart_upload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cadastre/5/screenshot"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let form = MultipartForm::new()
            .text("spaceImageId", "TEST_IMAGE_123")
            .file("screenshot", "shot.png", "image/png", vec![0x89, 0x50]);
        let request =
            ApiRequest::new(HttpMethod::Post, format!("{}/cadastre/5/screenshot", server.uri()))
                .with_body(RequestBody::Multipart(form));
        transport().send(request).await.unwrap();

        let received = server.received_requests().await.unwrap();
        let content_type = received[0].headers.get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        let body = String::from_utf8_lossy(&received[0].body);
        assert!(body.contains("name=\"spaceImageId\""));
        assert!(body.contains("TEST_IMAGE_123"));
        assert!(body.contains("filename=\"shot.png\""));
    }

    #[tokio::test]
    async fn test_missing_attachment_fails_before_sending() {
        let server = MockServer::start().await;
        let form = MultipartForm::new().file_path("governor_decree", "/nonexistent/decree.pdf");
        let request = ApiRequest::new(HttpMethod::Post, format!("{}/push", server.uri()))
            .with_body(RequestBody::Multipart(form));

        let err = transport().send(request).await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidBody(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_timeout_is_reported_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(Duration::from_millis(50)).unwrap();
        let request = ApiRequest::new(HttpMethod::Get, format!("{}/slow", server.uri()));
        let err = transport.send(request).await.unwrap_err();

        assert_eq!(err, TransportError::Timeout { timeout_ms: 50 });
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}
