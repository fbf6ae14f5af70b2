//! User Name Value Object
//!
//! Login identifier, unique per tenant in its canonical (lowercase) form.
//! The original casing is preserved for display.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

const MIN_LENGTH: usize = 3;
const MAX_LENGTH: usize = 32;

/// User name value object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserName {
    original: String,
    canonical: String,
}

impl UserName {
    /// Create a user name with validation.
    ///
    /// Allowed: ASCII letters, digits, `.`, `_`, `-`; must start with a
    /// letter or digit; 3 to 32 characters.
    pub fn new(input: impl Into<String>) -> AppResult<Self> {
        let original = input.into().trim().to_string();

        if original.len() < MIN_LENGTH {
            return Err(AppError::bad_request(format!(
                "User name must be at least {} characters",
                MIN_LENGTH
            )));
        }
        if original.len() > MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "User name must be at most {} characters",
                MAX_LENGTH
            )));
        }
        if !original
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
        {
            return Err(AppError::bad_request(
                "User name may only contain letters, digits, '.', '_' and '-'",
            ));
        }
        if !original
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric())
        {
            return Err(AppError::bad_request(
                "User name must start with a letter or digit",
            ));
        }

        let canonical = original.to_ascii_lowercase();
        Ok(Self { original, canonical })
    }

    /// Restore from database values (assumed already validated).
    pub fn from_db(original: impl Into<String>) -> Self {
        let original = original.into();
        let canonical = original.to_ascii_lowercase();
        Self { original, canonical }
    }

    /// Original casing, for display.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Canonical lowercase form, for lookups and uniqueness.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn as_str(&self) -> &str {
        &self.original
    }
}

impl std::fmt::Display for UserName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.original)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(UserName::new("alice").is_ok());
        assert!(UserName::new("alice.smith").is_ok());
        assert!(UserName::new("a1-b2_c3").is_ok());
    }

    #[test]
    fn test_invalid_names() {
        assert!(UserName::new("ab").is_err());
        assert!(UserName::new("a".repeat(MAX_LENGTH + 1)).is_err());
        assert!(UserName::new("alice smith").is_err());
        assert!(UserName::new(".alice").is_err());
        assert!(UserName::new("アリス").is_err());
    }

    #[test]
    fn test_canonical_form() {
        let name = UserName::new("Alice.Smith").unwrap();
        assert_eq!(name.original(), "Alice.Smith");
        assert_eq!(name.canonical(), "alice.smith");
    }
}
