//! Assertion runner.
//!
//! Evaluates [`Assertion`]s against an [`ApiResponse`]. JSON paths are
//! dotted and spelling-tolerant, so `meta.page_size` also finds
//! `meta.pageSize`.

use cadastre_application::ResponseVerifier;
use cadastre_domain::{
    ApiResponse, Assertion, AssertionResult, JsonKind, StatusExpectation, TestResults, fields,
};
use serde_json::Value;

/// Runs assertions against responses.
#[derive(Debug, Default, Clone, Copy)]
pub struct TestRunner {
    stop_on_failure: bool,
}

impl TestRunner {
    /// Create a new test runner.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stop_on_failure: false,
        }
    }

    /// Set whether to stop on first failure.
    #[must_use]
    pub const fn with_stop_on_failure(mut self, stop: bool) -> Self {
        self.stop_on_failure = stop;
        self
    }

    /// Run every assertion against a response.
    #[must_use]
    pub fn run(&self, assertions: &[Assertion], response: &ApiResponse) -> TestResults {
        let mut results = Vec::with_capacity(assertions.len());
        for assertion in assertions {
            let result = Self::run_assertion(assertion, response);
            let failed = !result.passed;
            results.push(result);
            if failed && self.stop_on_failure {
                break;
            }
        }
        TestResults::new(results)
    }

    /// Run a single assertion against a response.
    #[must_use]
    pub fn run_assertion(assertion: &Assertion, response: &ApiResponse) -> AssertionResult {
        match assertion {
            Assertion::StatusCode { expected } => check_status(assertion, response, expected),
            Assertion::ResponseTime { max_ms } => check_response_time(assertion, response, *max_ms),
            Assertion::JsonField { path, expected } => {
                with_field(assertion, response, path, |value| match expected {
                    Some(expected) if !loosely_equal(value, expected) => Err(format!(
                        "field '{path}' value mismatch: expected {expected}, got {value}"
                    )),
                    _ => Ok(()),
                })
            }
            Assertion::JsonFieldKind { path, kind } => {
                with_field(assertion, response, path, |value| check_kind(path, value, *kind))
            }
            Assertion::NonEmptyBody => check_non_empty_body(assertion, response),
        }
    }
}

impl ResponseVerifier for TestRunner {
    fn verify(&self, assertions: &[Assertion], response: &ApiResponse) -> TestResults {
        self.run(assertions, response)
    }
}

fn check_status(
    assertion: &Assertion,
    response: &ApiResponse,
    expected: &StatusExpectation,
) -> AssertionResult {
    let actual = response.status;
    if expected.matches(actual) {
        AssertionResult::pass_with_value(assertion.clone(), actual.to_string())
    } else {
        AssertionResult::fail_with_value(
            assertion.clone(),
            actual.to_string(),
            format!("expected status {}, got {actual}", expected.description()),
        )
    }
}

fn check_response_time(assertion: &Assertion, response: &ApiResponse, max_ms: u64) -> AssertionResult {
    let actual_ms = u64::try_from(response.duration.as_millis()).unwrap_or(u64::MAX);
    if actual_ms <= max_ms {
        AssertionResult::pass_with_value(assertion.clone(), format!("{actual_ms}ms"))
    } else {
        AssertionResult::fail_with_value(
            assertion.clone(),
            format!("{actual_ms}ms"),
            format!("response took {actual_ms}ms, expected <= {max_ms}ms"),
        )
    }
}

/// Parses the body, finds `path` and applies `check` to the value.
fn with_field<F>(assertion: &Assertion, response: &ApiResponse, path: &str, check: F) -> AssertionResult
where
    F: FnOnce(&Value) -> Result<(), String>,
{
    let json = match serde_json::from_slice::<Value>(&response.body_bytes) {
        Ok(json) => json,
        Err(e) => {
            return AssertionResult::fail(
                assertion.clone(),
                format!("failed to parse body as JSON: {e}"),
            );
        }
    };
    let Some(value) = fields::lookup(&json, path) else {
        return AssertionResult::fail(assertion.clone(), format!("field '{path}' not found"));
    };
    match check(value) {
        Ok(()) => AssertionResult::pass_with_value(assertion.clone(), value.to_string()),
        Err(message) => AssertionResult::fail_with_value(assertion.clone(), value.to_string(), message),
    }
}

fn check_kind(path: &str, value: &Value, kind: JsonKind) -> Result<(), String> {
    if kind.matches(value) {
        Ok(())
    } else {
        Err(format!("field '{path}' is not {}: {value}", kind.as_str()))
    }
}

fn check_non_empty_body(assertion: &Assertion, response: &ApiResponse) -> AssertionResult {
    let length = response.body_bytes.len();
    if length > 0 {
        AssertionResult::pass_with_value(assertion.clone(), format!("{length} bytes"))
    } else {
        AssertionResult::fail(assertion.clone(), "body is empty")
    }
}

/// Equality that treats an id sent as a string and returned as a number
/// (or the reverse) as equal.
fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            n.to_string() == *s
        }
        _ => actual == expected,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::Duration;

    fn response(status: u16, body: &str, millis: u64) -> ApiResponse {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        ApiResponse::new(status, headers, body.as_bytes().to_vec(), Duration::from_millis(millis))
    }

    #[test]
    fn test_status_sets() {
        let resp = response(202, "{}", 5);
        assert!(TestRunner::run_assertion(&Assertion::status_in(&[200, 202]), &resp).passed);
        let failed = TestRunner::run_assertion(&Assertion::status(200), &resp);
        assert!(!failed.passed);
        assert_eq!(failed.error.as_deref(), Some("expected status = 200, got 202"));
    }

    #[test]
    fn test_response_time_budget() {
        let resp = response(200, "{}", 2500);
        assert!(TestRunner::run_assertion(&Assertion::within_ms(5000), &resp).passed);
        assert!(!TestRunner::run_assertion(&Assertion::within_ms(2000), &resp).passed);
    }

    #[test]
    fn test_field_lookup_accepts_either_spelling() {
        let resp = response(200, r#"{"data": [], "meta": {"pageSize": 5, "totalPages": 2}}"#, 1);
        let results = TestRunner::new().run(
            &[
                Assertion::has_field("meta.page_size"),
                Assertion::field_equals("meta.total_pages", json!(2)),
                Assertion::field_kind("data", JsonKind::Array),
            ],
            &resp,
        );
        assert!(results.all_passed(), "{}", results.failure_summary());
    }

    #[test]
    fn test_id_equality_is_loose_across_string_and_number() {
        let resp = response(200, r#"{"ID": 42}"#, 1);
        assert!(TestRunner::run_assertion(&Assertion::field_equals("id", json!("42")), &resp).passed);
        assert!(!TestRunner::run_assertion(&Assertion::field_equals("id", json!("43")), &resp).passed);
    }

    #[test]
    fn test_kind_mismatch_message() {
        let resp = response(200, r#"{"token": ""}"#, 1);
        let result = TestRunner::run_assertion(
            &Assertion::field_kind("token", JsonKind::NonEmptyString),
            &resp,
        );
        assert!(!result.passed);
        assert_eq!(
            result.error.as_deref(),
            Some(r#"field 'token' is not a non-empty string: """#)
        );
    }

    #[test]
    fn test_missing_field_and_non_json_body() {
        let resp = response(200, "<html>", 1);
        let result = TestRunner::run_assertion(&Assertion::has_field("id"), &resp);
        assert!(result.error.unwrap().starts_with("failed to parse body as JSON"));

        let resp = response(200, "{}", 1);
        let result = TestRunner::run_assertion(&Assertion::has_field("id"), &resp);
        assert_eq!(result.error.as_deref(), Some("field 'id' not found"));
    }

    #[test]
    fn test_non_empty_body() {
        let pdf = response(200, "%PDF-1.4", 1);
        let result = TestRunner::run_assertion(&Assertion::non_empty_body(), &pdf);
        assert_eq!(result.actual.as_deref(), Some("8 bytes"));

        let empty = response(200, "", 1);
        let result = TestRunner::run_assertion(&Assertion::non_empty_body(), &empty);
        assert_eq!(result.error.as_deref(), Some("body is empty"));
    }

    #[test]
    fn test_stop_on_failure() {
        let resp = response(500, "{}", 1);
        let results = TestRunner::new()
            .with_stop_on_failure(true)
            .run(&[Assertion::status(200), Assertion::non_empty_body()], &resp);
        assert_eq!(results.total, 1);
        assert_eq!(results.failed, 1);
    }
}
