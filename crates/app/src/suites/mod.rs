//! Role suites.
//!
//! Suites run sequentially, in the order of [`Suite::ALL`]. They share one
//! harness, so every role logs in at most once per run.

use std::fmt;

use cadastre_application::TestScenarioHarness;
use cadastre_domain::SuiteReport;
use cadastre_infrastructure::{ConfigError, Settings};
use tracing::info;

pub mod agency;
pub mod auth;
pub mod common;
pub mod editor;
pub mod geometry_fix;
pub mod integration;
pub mod users;
pub mod verdict;
pub mod verify;

/// A role suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Suite {
    /// Login for every role and rejected credentials.
    Auth,
    /// User administration as root.
    Users,
    /// Geometry correction role.
    GeometryFix,
    /// Verifier role.
    Verify,
    /// Agency role.
    Agency,
    /// Verdict role.
    Verdict,
    /// Editor role.
    Editor,
    /// Integration push with basic auth.
    Integration,
}

impl Suite {
    /// Every suite, in run order.
    pub const ALL: [Self; 8] = [
        Self::Auth,
        Self::Users,
        Self::GeometryFix,
        Self::Verify,
        Self::Agency,
        Self::Verdict,
        Self::Editor,
        Self::Integration,
    ];

    /// Suite name used in reports and on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Auth => auth::NAME,
            Self::Users => users::NAME,
            Self::GeometryFix => geometry_fix::NAME,
            Self::Verify => verify::NAME,
            Self::Agency => agency::NAME,
            Self::Verdict => verdict::NAME,
            Self::Editor => editor::NAME,
            Self::Integration => integration::NAME,
        }
    }

    /// Looks a suite up by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|suite| suite.name() == name)
    }

    /// Runs the suite.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings lack a credential the suite needs.
    pub async fn run(
        self,
        harness: &mut TestScenarioHarness,
        settings: &Settings,
    ) -> Result<SuiteReport, ConfigError> {
        info!(suite = self.name(), "suite started");
        match self {
            Self::Auth => auth::run(harness, settings).await,
            Self::Users => users::run(harness, settings).await,
            Self::GeometryFix => geometry_fix::run(harness, settings).await,
            Self::Verify => verify::run(harness, settings).await,
            Self::Agency => agency::run(harness, settings).await,
            Self::Verdict => verdict::run(harness, settings).await,
            Self::Editor => editor::run(harness, settings).await,
            Self::Integration => integration::run(harness, settings).await,
        }
    }
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runs `suites` in order.
///
/// # Errors
///
/// Returns an error if the settings lack a credential a suite needs; suites
/// already run are lost in that case, so check settings first.
pub async fn run_all(
    harness: &mut TestScenarioHarness,
    settings: &Settings,
    suites: &[Suite],
) -> Result<Vec<SuiteReport>, ConfigError> {
    let mut reports = Vec::with_capacity(suites.len());
    for suite in suites {
        reports.push(suite.run(harness, settings).await?);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_names_round_trip() {
        for suite in Suite::ALL {
            assert_eq!(Suite::from_name(suite.name()), Some(suite));
        }
        assert_eq!(Suite::from_name("nope"), None);
        assert_eq!(Suite::GeometryFix.to_string(), "geometry_fix");
    }
}
