//! Credential and session types

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Login credential for a single role.
///
/// Serializes to the `{username, password}` body the login endpoint expects.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Login name.
    pub username: String,
    /// Plain-text password.
    pub password: String,
}

impl Credential {
    /// Creates a credential.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Rejects credentials with an empty username or password.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidCredential`] naming the empty field.
    pub fn validate(&self) -> DomainResult<()> {
        if self.username.trim().is_empty() {
            return Err(DomainError::InvalidCredential("empty username".to_string()));
        }
        if self.password.is_empty() {
            return Err(DomainError::InvalidCredential(format!(
                "empty password for '{}'",
                self.username
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// How a session authenticates its requests.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <token>` obtained from the login endpoint.
    Bearer {
        /// Opaque token returned by login.
        token: String,
    },
    /// Static `Authorization: Basic <value>` used by integration endpoints.
    Basic {
        /// Base64-encoded `user:password`.
        encoded: String,
    },
}

impl AuthScheme {
    /// Creates a bearer scheme.
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Creates a basic scheme by encoding `username:password`.
    #[must_use]
    pub fn basic(username: &str, password: &str) -> Self {
        Self::Basic {
            encoded: STANDARD.encode(format!("{username}:{password}")),
        }
    }

    /// Parses a full `Authorization` header value such as `Basic abc=`.
    ///
    /// A value with no recognised prefix is treated as an already-encoded
    /// basic credential.
    #[must_use]
    pub fn from_header_value(value: &str) -> Self {
        let value = value.trim();
        if let Some(token) = value.strip_prefix("Bearer ") {
            Self::bearer(token.trim())
        } else if let Some(encoded) = value.strip_prefix("Basic ") {
            Self::Basic {
                encoded: encoded.trim().to_string(),
            }
        } else {
            Self::Basic {
                encoded: value.to_string(),
            }
        }
    }

    /// Returns the `Authorization` header value.
    #[must_use]
    pub fn header_value(&self) -> String {
        match self {
            Self::Bearer { token } => format!("Bearer {token}"),
            Self::Basic { encoded } => format!("Basic {encoded}"),
        }
    }

    /// Returns a log-safe prefix of the secret.
    #[must_use]
    pub fn redacted(&self) -> String {
        let secret = match self {
            Self::Bearer { token } => token,
            Self::Basic { encoded } => encoded,
        };
        let prefix: String = secret.chars().take(12).collect();
        format!("{prefix}...")
    }
}

impl fmt::Debug for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer { .. } => write!(f, "Bearer({})", self.redacted()),
            Self::Basic { .. } => write!(f, "Basic({})", self.redacted()),
        }
    }
}

/// An authenticated session.
///
/// Created by login (or from a static integration credential) and attached to
/// every request the owning client sends. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The authorization scheme and secret.
    pub scheme: AuthScheme,
    /// Role name reported by the server, if any.
    pub role: Option<String>,
    /// Username that opened the session, if any.
    pub username: Option<String>,
    /// Headers sent with every request besides `Authorization`.
    pub default_headers: Vec<(String, String)>,
    /// When the session was established.
    pub established_at: DateTime<Utc>,
}

impl Session {
    /// Creates a bearer session from a login response.
    #[must_use]
    pub fn bearer(username: impl Into<String>, token: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            scheme: AuthScheme::bearer(token),
            role: Some(role.into()),
            username: Some(username.into()),
            default_headers: default_headers(),
            established_at: Utc::now(),
        }
    }

    /// Creates a session around a static scheme, without a login round-trip.
    #[must_use]
    pub fn with_scheme(scheme: AuthScheme) -> Self {
        Self {
            scheme,
            role: None,
            username: None,
            default_headers: default_headers(),
            established_at: Utc::now(),
        }
    }

    /// Returns the `Authorization` header value.
    #[must_use]
    pub fn authorization(&self) -> String {
        self.scheme.header_value()
    }

    /// Returns the bearer token, if this is a bearer session.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        match &self.scheme {
            AuthScheme::Bearer { token } => Some(token),
            AuthScheme::Basic { .. } => None,
        }
    }
}

fn default_headers() -> Vec<(String, String)> {
    vec![("Accept".to_string(), "application/json".to_string())]
}
