//! Run settings
//!
//! Resolution order, highest first:
//! 1. Environment variables (`CADASTRE_*`)
//! 2. The file named by `CADASTRE_CONFIG`, else `cadastre-acceptance.yaml`
//!    in the working directory
//! 3. Defaults

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cadastre_domain::{AuthScheme, Credential, Role};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Environment variable naming the settings file.
pub const CONFIG_ENV: &str = "CADASTRE_CONFIG";
/// Settings file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "cadastre-acceptance.yaml";
/// Service under test when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "https://etirof.cmspace.uz/api";

const BASE_URL_ENV: &str = "CADASTRE_BASE_URL";
const INTEGRATION_AUTH_ENV: &str = "CADASTRE_INTEGRATION_AUTH";
const ATTACHMENT_ENV: &str = "CADASTRE_ATTACHMENT";
const TIMEOUT_ENV: &str = "CADASTRE_TIMEOUT_MS";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The settings file is not valid YAML for [`Settings`].
    #[error("invalid settings: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An override has an unusable value.
    #[error("invalid value for {key}: {value}")]
    InvalidValue {
        /// Variable or field name.
        key: String,
        /// The rejected value.
        value: String,
    },

    /// No credential is configured for a role.
    #[error("no credential configured for role {0}")]
    MissingRole(Role),
}

/// Credential of one role as written in the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCredential {
    /// Login name.
    pub username: String,
    /// Password.
    pub password: String,
}

impl RoleCredential {
    fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

/// Everything a run needs to know about the deployment under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Service root, e.g. `https://host/api`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout_ms: u64,
    /// Raw `Authorization` value for the integration endpoint.
    pub integration_auth: Option<String>,
    /// Integration user, used when `integration_auth` is not set.
    pub integration_username: Option<String>,
    /// Integration password, used with `integration_username`.
    pub integration_password: Option<String>,
    /// PDF attached to integration pushes.
    pub attachment_path: Option<PathBuf>,
    /// Credential per role.
    pub roles: BTreeMap<Role, RoleCredential>,
    /// Budget for list requests.
    pub max_list_ms: u64,
    /// Budget for single-item requests.
    pub max_item_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let roles = BTreeMap::from([
            (Role::Root, RoleCredential::new("root", "root")),
            (Role::GeometryFix, RoleCredential::new("rool1", "qwerty")),
            (Role::Verify, RoleCredential::new("rool2", "qwerty")),
            (Role::Agency, RoleCredential::new("rool3", "qwerty")),
            (Role::Verdict, RoleCredential::new("rool4", "qwerty")),
            (Role::Editor, RoleCredential::new("rool5", "qwerty")),
        ]);
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: 30_000,
            integration_auth: None,
            integration_username: None,
            integration_password: None,
            attachment_path: None,
            roles,
            max_list_ms: 5_000,
            max_item_ms: 2_000,
        }
    }
}

impl Settings {
    /// Resolves settings from the file system and the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file exists but cannot be read or
    /// parsed, or if an override is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV).map_or_else(
            || PathBuf::from(DEFAULT_CONFIG_FILE),
            PathBuf::from,
        );
        let mut settings = if path.exists() {
            Self::from_file(&path)?
        } else {
            debug!(path = %path.display(), "no settings file, using defaults");
            Self::default()
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Reads settings from a YAML file; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_yaml(&contents)?;
        debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Parses settings from YAML text.
    ///
    /// Roles not mentioned keep their default credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid settings YAML.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let mut settings: Self = serde_yaml::from_str(contents)?;
        for (role, credential) in Self::default().roles {
            settings.roles.entry(role).or_insert(credential);
        }
        Ok(settings)
    }

    /// Applies `CADASTRE_*` overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout override is not a number.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(BASE_URL_ENV) {
            self.base_url = base_url;
        }
        if let Some(auth) = lookup(INTEGRATION_AUTH_ENV) {
            self.integration_auth = Some(auth);
        }
        if let Some(path) = lookup(ATTACHMENT_ENV) {
            self.attachment_path = Some(PathBuf::from(path));
        }
        if let Some(timeout) = lookup(TIMEOUT_ENV) {
            self.timeout_ms = timeout.parse().map_err(|_| ConfigError::InvalidValue {
                key: TIMEOUT_ENV.to_string(),
                value: timeout,
            })?;
        }
        Ok(())
    }

    /// Returns the login credential of `role`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRole`] if the role has no credential.
    pub fn credential(&self, role: Role) -> Result<Credential, ConfigError> {
        self.roles
            .get(&role)
            .map(|c| Credential::new(c.username.clone(), c.password.clone()))
            .ok_or(ConfigError::MissingRole(role))
    }

    /// Authorization scheme for the integration endpoint, if configured.
    #[must_use]
    pub fn integration_scheme(&self) -> Option<AuthScheme> {
        if let Some(raw) = &self.integration_auth {
            return Some(AuthScheme::from_header_value(raw));
        }
        match (&self.integration_username, &self.integration_password) {
            (Some(user), Some(password)) => Some(AuthScheme::basic(user, password)),
            _ => None,
        }
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
