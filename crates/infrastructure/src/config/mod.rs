//! Configuration loading.

mod settings;

pub use settings::{
    CONFIG_ENV, ConfigError, DEFAULT_BASE_URL, DEFAULT_CONFIG_FILE, RoleCredential, Settings,
};
