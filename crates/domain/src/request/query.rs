//! Query parameter types

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A query parameter key-value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParam {
    /// The parameter key
    pub key: String,
    /// The parameter value
    pub value: String,
}

impl QueryParam {
    /// Creates a new query parameter.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Ordered list of query parameters.
///
/// Order is preserved so the rendered query string is stable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Query(Vec<QueryParam>);

impl Query {
    /// Creates an empty query.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a parameter (builder pattern).
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.push(key, value);
        self
    }

    /// Appends a parameter only when `value` is present.
    #[must_use]
    pub fn param_opt<V: Display>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// Appends a parameter.
    pub fn push(&mut self, key: impl Into<String>, value: impl Display) {
        self.0.push(QueryParam::new(key, value.to_string()));
    }

    /// Returns the value of the first parameter named `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }

    /// Returns the parameters as `(key, value)` pairs.
    #[must_use]
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.0
            .iter()
            .map(|p| (p.key.as_str(), p.value.as_str()))
            .collect()
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a stable string key, used to memoize lookups per query.
    #[must_use]
    pub fn cache_key(&self) -> String {
        self.0
            .iter()
            .map(|p| format!("{}={}", p.key, p.value))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_order() {
        let query = Query::new()
            .param("page", 1)
            .param("page_size", 5)
            .param_opt("status", None::<&str>)
            .param_opt("region_soato", Some("1726"));

        assert_eq!(
            query.pairs(),
            vec![("page", "1"), ("page_size", "5"), ("region_soato", "1726")]
        );
        assert_eq!(query.get("page_size"), Some("5"));
        assert_eq!(query.cache_key(), "page=1&page_size=5&region_soato=1726");
    }

    #[test]
    fn test_empty_query() {
        assert!(Query::new().is_empty());
        assert_eq!(Query::default().cache_key(), "");
    }
}
