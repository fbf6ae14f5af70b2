//! Application Configuration
//!
//! Immutable configuration injected into each use case. Per-user overrides
//! are merged over `defaults` at resolution time; this value itself is never
//! mutated after startup.

use std::time::Duration;

use crate::domain::settings::Settings;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Session cookie name
    pub session_cookie_name: String,
    /// Session secret key for HMAC signing (32 bytes)
    pub session_secret: [u8; 32],
    /// Cookie Max-Age when "remember me" is set (30 days)
    pub remember_ttl: Duration,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// One-time code lifetime
    pub otp_ttl: Duration,
    /// Default settings, overridable per user
    pub defaults: Settings,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_cookie_name: "wh_session".to_string(),
            session_secret: [0u8; 32],
            remember_ttl: Duration::from_secs(30 * 24 * 3600),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            password_pepper: None,
            otp_ttl: Duration::from_secs(10 * 60),
            defaults: Settings::default(),
        }
    }
}

impl AuthConfig {
    /// Create config with a random session secret (for development)
    pub fn with_random_secret() -> Self {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self {
            session_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    /// OTP lifetime as a chrono duration
    pub fn otp_expiry(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.otp_ttl).unwrap_or_else(|_| chrono::Duration::minutes(10))
    }
}
