//! Server-side entities seen through the API.

use serde_json::Value;

use crate::fields;

/// An entity returned by the service: a sample item from a list, or a record
/// a scenario created itself.
///
/// Only the identifier has fixed meaning; everything else is read through
/// the spelling-tolerant accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    value: Value,
}

impl Resource {
    /// Wraps a JSON object.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self { value }
    }

    /// Returns the identifier (`ID` or `id`) rendered as a string.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        fields::lookup_string(&self.value, "id")
    }

    /// Looks up a dotted field path under any spelling.
    #[must_use]
    pub fn field(&self, path: &str) -> Option<&Value> {
        fields::lookup(&self.value, path)
    }

    /// Looks up a field rendered as a string.
    #[must_use]
    pub fn field_string(&self, path: &str) -> Option<String> {
        fields::lookup_string(&self.value, path)
    }

    /// Returns true if the field is present and non-empty.
    #[must_use]
    pub fn has(&self, path: &str) -> bool {
        fields::is_truthy(&self.value, path)
    }
}

impl From<Value> for Resource {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_from_either_spelling() {
        assert_eq!(Resource::new(json!({"ID": 5})).id().as_deref(), Some("5"));
        assert_eq!(Resource::new(json!({"id": "abc"})).id().as_deref(), Some("abc"));
        assert_eq!(Resource::new(json!({"name": "x"})).id(), None);
    }

    #[test]
    fn test_field_access() {
        let resource = Resource::new(json!({"CadastreID": "17:26:01", "Screenshot": "a.png"}));
        assert_eq!(resource.field_string("cadastre_id").as_deref(), Some("17:26:01"));
        assert!(resource.has("screenshot"));
        assert!(!resource.has("governor_decree"));
    }
}
