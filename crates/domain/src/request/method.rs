//! Request verbs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DomainError, DomainResult};

/// The verbs the cadastre API is exercised with.
///
/// Serialized in upper case, the way the transport writes them on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// Reads and lookups.
    #[default]
    Get,
    /// Login, creation and uploads.
    Post,
    /// Full user updates.
    Put,
    /// Workflow actions on cadastre items.
    Patch,
    /// Teardown of created records.
    Delete,
}

impl HttpMethod {
    /// Wire name of the verb.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        [Self::Get, Self::Post, Self::Put, Self::Patch, Self::Delete]
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::UnsupportedMethod(s.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_ignores_case_and_padding() {
        assert_eq!("patch".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        assert_eq!(" Delete ".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
    }

    #[test]
    fn test_verbs_outside_the_api_are_rejected() {
        let err = "TRACE".parse::<HttpMethod>().unwrap_err();
        assert!(matches!(err, DomainError::UnsupportedMethod(ref m) if m == "TRACE"));
    }

    #[test]
    fn test_wire_name_matches_serde() {
        let json = serde_json::to_string(&HttpMethod::Put).unwrap();
        assert_eq!(json, format!("\"{}\"", HttpMethod::Put));
    }
}
