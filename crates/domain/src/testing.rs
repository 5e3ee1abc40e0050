//! Response assertions.
//!
//! Assertions are data; the runner in the infrastructure crate evaluates them
//! against an [`ApiResponse`](crate::response::ApiResponse).

use serde::{Deserialize, Serialize};

/// A test assertion to run against a response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Assertion {
    /// Check response status code.
    StatusCode {
        /// Expected status code, range or set.
        expected: StatusExpectation,
    },
    /// Check response time.
    ResponseTime {
        /// Maximum allowed time in milliseconds.
        max_ms: u64,
    },
    /// Check a JSON field exists (under any spelling) and optionally its value.
    JsonField {
        /// Dotted path such as `meta.page_size` or `data.0.id`.
        path: String,
        /// Expected value (as JSON).
        expected: Option<serde_json::Value>,
    },
    /// Check a JSON field holds a value of the given kind.
    JsonFieldKind {
        /// Dotted path.
        path: String,
        /// Expected kind.
        kind: JsonKind,
    },
    /// Check the body is not empty.
    NonEmptyBody,
}

impl Assertion {
    /// Status must equal `code`.
    #[must_use]
    pub const fn status(code: u16) -> Self {
        Self::StatusCode {
            expected: StatusExpectation::Exact(code),
        }
    }

    /// Status must be one of `codes`.
    #[must_use]
    pub fn status_in(codes: &[u16]) -> Self {
        Self::StatusCode {
            expected: StatusExpectation::one_of(codes),
        }
    }

    /// Status must satisfy `expected`.
    #[must_use]
    pub const fn status_matches(expected: StatusExpectation) -> Self {
        Self::StatusCode { expected }
    }

    /// JSON field must be present.
    #[must_use]
    pub fn has_field(path: impl Into<String>) -> Self {
        Self::JsonField {
            path: path.into(),
            expected: None,
        }
    }

    /// JSON field must equal `expected`.
    #[must_use]
    pub fn field_equals(path: impl Into<String>, expected: serde_json::Value) -> Self {
        Self::JsonField {
            path: path.into(),
            expected: Some(expected),
        }
    }

    /// JSON field must hold a value of `kind`.
    #[must_use]
    pub fn field_kind(path: impl Into<String>, kind: JsonKind) -> Self {
        Self::JsonFieldKind {
            path: path.into(),
            kind,
        }
    }

    /// Response must arrive within `max_ms`.
    #[must_use]
    pub const fn within_ms(max_ms: u64) -> Self {
        Self::ResponseTime { max_ms }
    }

    /// Body must not be empty.
    #[must_use]
    pub const fn non_empty_body() -> Self {
        Self::NonEmptyBody
    }

    /// Get a human-readable description of this assertion.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::StatusCode { expected } => format!("Status code {}", expected.description()),
            Self::ResponseTime { max_ms } => format!("Response time <= {max_ms}ms"),
            Self::JsonField {
                path,
                expected: Some(v),
            } => format!("JSON {path} equals {v}"),
            Self::JsonField {
                path,
                expected: None,
            } => format!("JSON {path} exists"),
            Self::JsonFieldKind { path, kind } => format!("JSON {path} is {}", kind.as_str()),
            Self::NonEmptyBody => "Body is not empty".to_string(),
        }
    }
}

/// Expected status code or set of codes.
///
/// The service is not always consistent (202 instead of 200 for asynchronous
/// acceptance, 400 and 422 interchangeably for validation), so most
/// scenarios assert membership in a small set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum StatusExpectation {
    /// Exact status code.
    Exact(u16),
    /// One of multiple status codes.
    OneOf(Vec<u16>),
}

impl StatusExpectation {
    /// Check if a status code matches this expectation.
    #[must_use]
    pub fn matches(&self, status: u16) -> bool {
        match self {
            Self::Exact(expected) => status == *expected,
            Self::OneOf(codes) => codes.contains(&status),
        }
    }

    /// Get description of the expectation.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Exact(code) => format!("= {code}"),
            Self::OneOf(codes) => {
                let codes_str: Vec<_> = codes.iter().map(ToString::to_string).collect();
                format!("in [{}]", codes_str.join(", "))
            }
        }
    }

    /// Create an exact status expectation.
    #[must_use]
    pub const fn exact(code: u16) -> Self {
        Self::Exact(code)
    }

    /// Create a set expectation.
    #[must_use]
    pub fn one_of(codes: &[u16]) -> Self {
        Self::OneOf(codes.to_vec())
    }

    /// 200 or 202: synchronous or asynchronous acceptance.
    #[must_use]
    pub fn accepted() -> Self {
        Self::one_of(&[200, 202])
    }

    /// 401 or 403: missing or insufficient privileges.
    #[must_use]
    pub fn denied() -> Self {
        Self::one_of(&[401, 403])
    }

    /// 400 or 404: malformed or unknown identifier.
    #[must_use]
    pub fn bad_identifier() -> Self {
        Self::one_of(&[400, 404])
    }

    /// Statuses the login endpoint uses to reject a credential.
    #[must_use]
    pub fn login_rejected() -> Self {
        Self::one_of(&[400, 401, 404, 422])
    }
}

/// Kind of a JSON value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JsonKind {
    /// `true` or `false`.
    Bool,
    /// Any number.
    Number,
    /// A non-empty string.
    NonEmptyString,
    /// An array.
    Array,
    /// An object.
    Object,
}

impl JsonKind {
    /// Returns true if `value` is of this kind.
    #[must_use]
    pub fn matches(self, value: &serde_json::Value) -> bool {
        match self {
            Self::Bool => value.is_boolean(),
            Self::Number => value.is_number(),
            Self::NonEmptyString => value.as_str().is_some_and(|s| !s.is_empty()),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }

    /// Returns the kind name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "a boolean",
            Self::Number => "a number",
            Self::NonEmptyString => "a non-empty string",
            Self::Array => "an array",
            Self::Object => "an object",
        }
    }
}

/// Result of running a single assertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionResult {
    /// The assertion that was run.
    pub assertion: Assertion,
    /// Whether the assertion passed.
    pub passed: bool,
    /// Actual value found (for display).
    pub actual: Option<String>,
    /// Error message if failed.
    pub error: Option<String>,
}

impl AssertionResult {
    /// Create a passed result.
    #[must_use]
    pub const fn pass(assertion: Assertion) -> Self {
        Self {
            assertion,
            passed: true,
            actual: None,
            error: None,
        }
    }

    /// Create a passed result with actual value.
    #[must_use]
    pub fn pass_with_value(assertion: Assertion, actual: impl Into<String>) -> Self {
        Self {
            assertion,
            passed: true,
            actual: Some(actual.into()),
            error: None,
        }
    }

    /// Create a failed result.
    #[must_use]
    pub fn fail(assertion: Assertion, error: impl Into<String>) -> Self {
        Self {
            assertion,
            passed: false,
            actual: None,
            error: Some(error.into()),
        }
    }

    /// Create a failed result with actual value.
    #[must_use]
    pub fn fail_with_value(
        assertion: Assertion,
        actual: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            assertion,
            passed: false,
            actual: Some(actual.into()),
            error: Some(error.into()),
        }
    }
}

/// Results from running a group of assertions against one response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResults {
    /// Individual assertion results.
    pub results: Vec<AssertionResult>,
    /// Total number of assertions.
    pub total: usize,
    /// Number of passed assertions.
    pub passed: usize,
    /// Number of failed assertions.
    pub failed: usize,
}

impl TestResults {
    /// Create new test results.
    #[must_use]
    pub fn new(results: Vec<AssertionResult>) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();
        let failed = total - passed;

        Self {
            results,
            total,
            passed,
            failed,
        }
    }

    /// Check if all tests passed.
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Messages of the failed assertions, one per line.
    #[must_use]
    pub fn failure_summary(&self) -> String {
        self.results
            .iter()
            .filter(|r| !r.passed)
            .map(|r| {
                format!(
                    "{}: {}",
                    r.assertion.description(),
                    r.error.as_deref().unwrap_or("failed")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_expectation_exact() {
        let exp = StatusExpectation::exact(200);
        assert!(exp.matches(200));
        assert!(!exp.matches(201));
    }

    #[test]
    fn test_status_expectation_sets() {
        assert!(StatusExpectation::accepted().matches(202));
        assert!(!StatusExpectation::accepted().matches(201));
        assert!(StatusExpectation::bad_identifier().matches(404));
        assert!(!StatusExpectation::bad_identifier().matches(422));
        assert!(StatusExpectation::login_rejected().matches(404));
        assert!(!StatusExpectation::login_rejected().matches(500));
        assert_eq!(StatusExpectation::denied().description(), "in [401, 403]");
    }

    #[test]
    fn test_assertion_descriptions() {
        assert_eq!(Assertion::status(201).description(), "Status code = 201");
        assert_eq!(Assertion::has_field("meta.page").description(), "JSON meta.page exists");
        assert_eq!(
            Assertion::field_equals("active", json!(true)).description(),
            "JSON active equals true"
        );
        assert_eq!(
            Assertion::field_kind("token", JsonKind::NonEmptyString).description(),
            "JSON token is a non-empty string"
        );
    }

    #[test]
    fn test_json_kind() {
        assert!(JsonKind::Bool.matches(&json!(false)));
        assert!(!JsonKind::NonEmptyString.matches(&json!("")));
        assert!(JsonKind::Array.matches(&json!([])));
    }

    #[test]
    fn test_results_summary() {
        let results = TestResults::new(vec![
            AssertionResult::pass(Assertion::NonEmptyBody),
            AssertionResult::fail(Assertion::status(200), "Expected status = 200, got 500"),
        ]);
        assert_eq!(results.total, 2);
        assert_eq!(results.failed, 1);
        assert!(!results.all_passed());
        assert_eq!(
            results.failure_summary(),
            "Status code = 200: Expected status = 200, got 500"
        );
    }
}
