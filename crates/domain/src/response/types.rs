//! Response type
//!
//! Status, headers, body and timing of one exchange.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

use crate::fields;

/// HTTP response as seen by a scenario.
///
/// Keeps both the raw bytes (binary downloads) and a lossy text rendering
/// (diagnostics and JSON parsing).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body as raw bytes.
    pub body_bytes: Vec<u8>,
    /// Response body as lossy UTF-8.
    pub body: String,
    /// Time from send to the last body byte.
    pub duration: Duration,
    /// Content-Type header value (extracted for convenience).
    pub content_type: Option<String>,
}

impl ApiResponse {
    /// Creates a new `ApiResponse` from raw response data.
    #[must_use]
    pub fn new(
        status: u16,
        headers: HashMap<String, String>,
        body: Vec<u8>,
        duration: Duration,
    ) -> Self {
        let content_type = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.clone());
        let body_string = String::from_utf8_lossy(&body).into_owned();

        Self {
            status,
            headers,
            body: body_string,
            body_bytes: body,
            duration,
            content_type,
        }
    }

    /// Creates a JSON response; convenient for tests and fakes.
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self::new(status, headers, body.to_string().into_bytes(), Duration::ZERO)
    }

    /// Returns true if the status code indicates success (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Attempts to parse the body as JSON.
    #[must_use]
    pub fn body_as_json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body_bytes).ok()
    }

    /// Looks up a dotted field path in the JSON body under any spelling.
    #[must_use]
    pub fn field(&self, path: &str) -> Option<Value> {
        let json = self.body_as_json()?;
        fields::lookup(&json, path).cloned()
    }

    /// Looks up a field and renders it as a string.
    #[must_use]
    pub fn field_string(&self, path: &str) -> Option<String> {
        let json = self.body_as_json()?;
        fields::lookup_string(&json, path)
    }

    /// Gets a header value by name (case-insensitive).
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&String> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Returns the body truncated to `limit` characters for log output.
    #[must_use]
    pub fn body_preview(&self, limit: usize) -> String {
        if self.body.chars().count() > limit {
            let head: String = self.body.chars().take(limit).collect();
            format!("{head}...")
        } else {
            self.body.clone()
        }
    }

    /// Returns a human-readable duration string (e.g., "124 ms").
    #[must_use]
    pub fn duration_display(&self) -> String {
        let millis = self.duration.as_millis();
        if millis < 1000 {
            format!("{millis} ms")
        } else {
            format!("{:.2} s", self.duration.as_secs_f64())
        }
    }
}
