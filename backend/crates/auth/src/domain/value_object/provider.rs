//! Identity Provider Value Object
//!
//! Closed set of supported third-party identity providers.

use derive_more::Display;
use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Supported third-party identity providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[display("google")]
    Google,
    #[display("facebook")]
    Facebook,
    #[display("linkedin")]
    Linkedin,
    #[display("twitter")]
    Twitter,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::Google,
        Provider::Facebook,
        Provider::Linkedin,
        Provider::Twitter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Facebook => "facebook",
            Provider::Linkedin => "linkedin",
            Provider::Twitter => "twitter",
        }
    }

    /// Parse a provider name; unknown names are a validation error.
    pub fn parse(name: &str) -> AppResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Provider::Google),
            "facebook" => Ok(Provider::Facebook),
            "linkedin" => Ok(Provider::Linkedin),
            "twitter" => Ok(Provider::Twitter),
            other => Err(AppError::bad_request(format!(
                "Unknown identity provider: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_providers() {
        for provider in Provider::ALL {
            assert_eq!(Provider::parse(provider.as_str()).unwrap(), provider);
        }
        assert_eq!(Provider::parse("GOOGLE").unwrap(), Provider::Google);
    }

    #[test]
    fn test_parse_unknown_provider() {
        assert!(Provider::parse("myspace").is_err());
        assert!(Provider::parse("").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Provider::Linkedin.to_string(), "linkedin");
    }
}
