//! User administration payloads (root only).

use serde::{Deserialize, Serialize};

/// User collection path.
pub const USERS_PATH: &str = "/users";

/// Path of a single user.
#[must_use]
pub fn user_path(id: &str) -> String {
    format!("{USERS_PATH}/{id}")
}

/// Path of the active-flag toggle for a user.
#[must_use]
pub fn toggle_active_path(id: &str) -> String {
    format!("{USERS_PATH}/{id}/toggle-active")
}

/// `POST /users` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Login name; must be unique across the service.
    pub username: String,
    /// Initial password.
    pub password: String,
    /// Given name.
    pub first_name: String,
    /// Middle name.
    pub middle_name: String,
    /// Family name.
    pub last_name: String,
    /// Job title.
    pub position: String,
    /// Whether the account starts enabled.
    pub active: bool,
    /// Role name, e.g. `cadastre_integration`.
    pub role: String,
    /// Work distribution bucket.
    pub randomizer_index: u32,
}

impl NewUser {
    /// An active QA account with the given name and role.
    #[must_use]
    pub fn qa(username: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: "Test123@".to_string(),
            first_name: "Auto".to_string(),
            middle_name: "QA".to_string(),
            last_name: "Bot".to_string(),
            position: "tester".to_string(),
            active: true,
            role: role.into(),
            randomizer_index: 1,
        }
    }
}

/// `PUT /users/{id}` body; absent fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    /// New given name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// New job title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_user_wire_format() {
        let body = serde_json::to_value(NewUser::qa("testuser_abcdef", "cadastre_integration")).unwrap();
        assert_eq!(body["firstName"], json!("Auto"));
        assert_eq!(body["randomizerIndex"], json!(1));
        assert_eq!(body["active"], json!(true));
        assert_eq!(body["role"], json!("cadastre_integration"));
    }

    #[test]
    fn test_update_skips_unset_fields() {
        let update = UserUpdate {
            first_name: Some("UpdatedName".to_string()),
            ..UserUpdate::default()
        };
        assert_eq!(serde_json::to_value(update).unwrap(), json!({"firstName": "UpdatedName"}));
    }

    #[test]
    fn test_paths() {
        assert_eq!(user_path("3"), "/users/3");
        assert_eq!(toggle_active_path("3"), "/users/3/toggle-active");
    }
}
