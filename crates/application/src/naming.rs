//! Unique names for records a scenario creates.

use rand::Rng;
use uuid::Uuid;

/// Prefix of every username a scenario creates.
pub const USERNAME_PREFIX: &str = "testuser_";

/// Returns `len` random lowercase ASCII letters.
#[must_use]
pub fn random_suffix(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(rng.random_range(b'a'..=b'z')))
        .collect()
}

/// Returns a fresh username such as `testuser_qhzkav`.
#[must_use]
pub fn unique_username() -> String {
    format!("{USERNAME_PREFIX}{}", random_suffix(6))
}

/// Returns a fresh opaque identifier, e.g. for an integration unit id.
#[must_use]
pub fn unique_token() -> String {
    Uuid::now_v7().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_username_shape() {
        let name = unique_username();
        assert!(name.starts_with(USERNAME_PREFIX));
        let suffix = &name[USERNAME_PREFIX.len()..];
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn test_tokens_differ() {
        assert_ne!(unique_token(), unique_token());
        assert_eq!(unique_token().len(), 32);
    }
}
