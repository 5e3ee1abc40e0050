//! Scenario lifecycle and reporting types.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Lifecycle state of a single scenario.
///
/// ```text
/// NotStarted -> Authenticated -> ResourceReady -> Executed -> CleanedUp
///                    |                 |
///                    +----> Skipped <--+        (Failed from any live state)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioState {
    /// Nothing has happened yet.
    #[default]
    NotStarted,
    /// A role session is available.
    Authenticated,
    /// A sample or provisioned resource is available.
    ResourceReady,
    /// The scenario body ran to completion and every check held.
    Executed,
    /// Teardowns ran after a successful execution.
    CleanedUp,
    /// A precondition could not be met (no sample data, missing file).
    Skipped,
    /// A check did not hold, or login/transport failed.
    Failed,
}

impl ScenarioState {
    /// Returns true if no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::CleanedUp | Self::Skipped | Self::Failed)
    }

    /// Returns true if moving from `self` to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::NotStarted, Self::Authenticated | Self::Failed)
                | (
                    Self::Authenticated,
                    Self::ResourceReady | Self::Executed | Self::Skipped | Self::Failed
                )
                | (
                    Self::ResourceReady,
                    Self::ResourceReady | Self::Executed | Self::Skipped | Self::Failed
                )
                | (Self::Executed, Self::CleanedUp)
        )
    }

    /// Returns the state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Authenticated => "authenticated",
            Self::ResourceReady => "resource_ready",
            Self::Executed => "executed",
            Self::CleanedUp => "cleaned_up",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ScenarioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks a scenario's state and the path it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioLifecycle {
    history: Vec<ScenarioState>,
}

impl Default for ScenarioLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioLifecycle {
    /// Starts in [`ScenarioState::NotStarted`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            history: vec![ScenarioState::NotStarted],
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ScenarioState {
        self.history
            .last()
            .copied()
            .unwrap_or(ScenarioState::NotStarted)
    }

    /// Every state visited, in order.
    #[must_use]
    pub fn history(&self) -> &[ScenarioState] {
        &self.history
    }

    /// Moves to `next`.
    ///
    /// A repeated `ResourceReady` is recorded once.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidTransition`] if the move is not allowed.
    pub fn advance(&mut self, next: ScenarioState) -> DomainResult<()> {
        let current = self.state();
        if !current.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: current.to_string(),
                to: next.to_string(),
            });
        }
        if current != next {
            self.history.push(next);
        }
        Ok(())
    }
}

/// Final verdict of a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioOutcome {
    /// Every check held.
    Passed,
    /// A check did not hold or a request could not be made.
    Failed,
    /// A precondition was missing.
    Skipped,
}

impl ScenarioOutcome {
    /// Short label for summaries.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Passed => "PASS",
            Self::Failed => "FAIL",
            Self::Skipped => "SKIP",
        }
    }
}

/// Human-readable record of one scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario name.
    pub name: String,
    /// Final verdict.
    pub outcome: ScenarioOutcome,
    /// States visited.
    pub states: Vec<ScenarioState>,
    /// Failure or skip reason.
    pub message: Option<String>,
    /// Status of the last response the scenario received.
    pub last_status: Option<u16>,
    /// Truncated body of the last response.
    pub last_body: Option<String>,
    /// Wall time of the scenario body and its cleanup.
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    /// Teardowns that failed; recorded, never escalated.
    pub cleanup_failures: Vec<String>,
}

impl ScenarioReport {
    /// Returns true if the scenario passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.outcome == ScenarioOutcome::Passed
    }

    /// Returns the final lifecycle state.
    #[must_use]
    pub fn final_state(&self) -> ScenarioState {
        self.states
            .last()
            .copied()
            .unwrap_or(ScenarioState::NotStarted)
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.outcome.label(), self.name)?;
        if let Some(status) = self.last_status {
            write!(f, " (HTTP {status})")?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if self.outcome == ScenarioOutcome::Failed {
            if let Some(body) = &self.last_body {
                write!(f, "\n    body: {body}")?;
            }
        }
        for failure in &self.cleanup_failures {
            write!(f, "\n    cleanup: {failure}")?;
        }
        Ok(())
    }
}

/// All scenario reports for one role suite.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SuiteReport {
    /// Suite name.
    pub suite: String,
    /// Reports in execution order.
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new(suite: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            scenarios: Vec::new(),
        }
    }

    /// Adds a scenario report.
    pub fn push(&mut self, report: ScenarioReport) {
        self.scenarios.push(report);
    }

    /// Number of scenarios with the given outcome.
    #[must_use]
    pub fn count(&self, outcome: ScenarioOutcome) -> usize {
        self.scenarios.iter().filter(|s| s.outcome == outcome).count()
    }

    /// Returns true if no scenario failed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.count(ScenarioOutcome::Failed) == 0
    }

    /// Finds a scenario report by name.
    #[must_use]
    pub fn scenario(&self, name: &str) -> Option<&ScenarioReport> {
        self.scenarios.iter().find(|s| s.name == name)
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "== {}: {} passed, {} failed, {} skipped",
            self.suite,
            self.count(ScenarioOutcome::Passed),
            self.count(ScenarioOutcome::Failed),
            self.count(ScenarioOutcome::Skipped)
        )?;
        for scenario in &self.scenarios {
            writeln!(f, "  {scenario}")?;
        }
        Ok(())
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_happy_path_transitions() {
        let mut lifecycle = ScenarioLifecycle::new();
        lifecycle.advance(ScenarioState::Authenticated).unwrap();
        lifecycle.advance(ScenarioState::ResourceReady).unwrap();
        lifecycle.advance(ScenarioState::ResourceReady).unwrap();
        lifecycle.advance(ScenarioState::Executed).unwrap();
        lifecycle.advance(ScenarioState::CleanedUp).unwrap();

        assert_eq!(
            lifecycle.history(),
            &[
                ScenarioState::NotStarted,
                ScenarioState::Authenticated,
                ScenarioState::ResourceReady,
                ScenarioState::Executed,
                ScenarioState::CleanedUp,
            ]
        );
        assert!(lifecycle.state().is_terminal());
    }

    #[test]
    fn test_invalid_transitions() {
        let mut lifecycle = ScenarioLifecycle::new();
        assert!(lifecycle.advance(ScenarioState::ResourceReady).is_err());
        assert!(lifecycle.advance(ScenarioState::Skipped).is_err());

        lifecycle.advance(ScenarioState::Authenticated).unwrap();
        lifecycle.advance(ScenarioState::Failed).unwrap();
        assert!(lifecycle.advance(ScenarioState::CleanedUp).is_err());
        assert_eq!(lifecycle.state(), ScenarioState::Failed);
    }

    #[test]
    fn test_skip_from_resource_ready() {
        assert!(ScenarioState::ResourceReady.can_transition_to(ScenarioState::Skipped));
        assert!(!ScenarioState::Executed.can_transition_to(ScenarioState::Skipped));
    }

    fn report(name: &str, outcome: ScenarioOutcome) -> ScenarioReport {
        ScenarioReport {
            name: name.to_string(),
            outcome,
            states: vec![ScenarioState::NotStarted],
            message: None,
            last_status: Some(200),
            last_body: Some("{}".to_string()),
            duration: Duration::from_millis(5),
            cleanup_failures: Vec::new(),
        }
    }

    #[test]
    fn test_suite_counts() {
        let mut suite = SuiteReport::new("users");
        suite.push(report("create", ScenarioOutcome::Passed));
        suite.push(report("toggle", ScenarioOutcome::Skipped));
        assert!(suite.all_passed());
        suite.push(report("delete", ScenarioOutcome::Failed));

        assert_eq!(suite.count(ScenarioOutcome::Passed), 1);
        assert_eq!(suite.count(ScenarioOutcome::Skipped), 1);
        assert!(!suite.all_passed());
        assert!(suite.scenario("toggle").is_some());
        assert!(suite.to_string().starts_with("== users: 1 passed, 1 failed, 1 skipped"));
    }

    #[test]
    fn test_report_display_includes_body_on_failure() {
        let mut failed = report("get user", ScenarioOutcome::Failed);
        failed.message = Some("Status code = 200: got 404".to_string());
        failed.cleanup_failures.push("DELETE /users/9 -> 500".to_string());

        let rendered = failed.to_string();
        assert!(rendered.starts_with("[FAIL] get user (HTTP 200): Status code = 200"));
        assert!(rendered.contains("body: {}"));
        assert!(rendered.contains("cleanup: DELETE /users/9 -> 500"));
    }
}
