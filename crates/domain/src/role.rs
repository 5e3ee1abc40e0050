//! Roles the service grants, each with its own suite.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A service role that scenarios log in as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Administrator; manages users.
    Root,
    /// Fixes plot geometry.
    GeometryFix,
    /// Verifies fixed records.
    Verify,
    /// Agency verification.
    Agency,
    /// Issues verdicts and moderation decisions.
    Verdict,
    /// Edits locations with notes.
    Editor,
}

impl Role {
    /// Every role, in suite order.
    #[must_use]
    pub const fn all() -> [Self; 6] {
        [
            Self::Root,
            Self::GeometryFix,
            Self::Verify,
            Self::Agency,
            Self::Verdict,
            Self::Editor,
        ]
    }

    /// Configuration key of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::GeometryFix => "geometry_fix",
            Self::Verify => "verify",
            Self::Agency => "agency",
            Self::Verdict => "verdict",
            Self::Editor => "editor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| DomainError::InvalidCredential(format!("unknown role: {s}")))
    }
}
