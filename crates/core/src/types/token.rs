//! Bearer session token.

use core::fmt;

use secrecy::{ExposeSecret, SecretString};

/// Opaque bearer credential returned by login and registration.
///
/// The raw value is only reachable through [`SessionToken::expose`] so it
/// never ends up in logs via `Debug`.
#[derive(Clone)]
pub struct SessionToken(SecretString);

impl SessionToken {
    /// Wrap a raw token. Returns `None` for an empty or blank string, which
    /// the backend uses to mean "not logged in".
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return None;
        }
        Some(Self(SecretString::from(raw)))
    }

    /// Raw token value, for building the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

impl PartialEq for SessionToken {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for SessionToken {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_token_is_absent() {
        assert!(SessionToken::new("").is_none());
        assert!(SessionToken::new("   ").is_none());
    }

    #[test]
    fn test_debug_redacts_value() {
        let token = SessionToken::new("eyJhbGciOi.secret.part").unwrap();
        let debug = format!("{token:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret"));
        assert_eq!(token.expose(), "eyJhbGciOi.secret.part");
    }

    #[test]
    fn test_equality_compares_raw_value() {
        assert_eq!(SessionToken::new("a"), SessionToken::new("a"));
        assert_ne!(SessionToken::new("a"), SessionToken::new("b"));
    }
}
