//! Resolved Settings
//!
//! Typed configuration view. Consumers never read the raw per-user override:
//! resolution overlays it onto the injected defaults field by field, so every
//! reader observes a complete configuration and unknown or malformed stored
//! keys cannot reshape behavior.

use std::time::Duration as StdDuration;

use chrono::Duration;
use platform::rate_limit::RateLimitConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::value_object::provider::Provider;

/// Per-provider social login toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLogins {
    pub google: bool,
    pub facebook: bool,
    pub linkedin: bool,
    pub twitter: bool,
}

impl Default for SocialLogins {
    fn default() -> Self {
        Self {
            google: true,
            facebook: true,
            linkedin: true,
            twitter: true,
        }
    }
}

impl SocialLogins {
    pub fn enabled(&self, provider: Provider) -> bool {
        match provider {
            Provider::Google => self.google,
            Provider::Facebook => self.facebook,
            Provider::Linkedin => self.linkedin,
            Provider::Twitter => self.twitter,
        }
    }

    fn set(&mut self, provider: Provider, enabled: bool) {
        match provider {
            Provider::Google => self.google = enabled,
            Provider::Facebook => self.facebook = enabled,
            Provider::Linkedin => self.linkedin = enabled,
            Provider::Twitter => self.twitter = enabled,
        }
    }
}

/// Fully resolved configuration, defaults overlaid by the user's override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// Social login toggles per provider
    pub social_logins: SocialLogins,
    /// Maximum concurrently online sessions per account
    pub max_login_limit: u32,
    /// Terminate all sessions when the password changes
    pub auto_logout_on_password_change: bool,
    /// Failed attempts before lockout
    pub failed_login_attempts_limit: u16,
    /// Lockout duration in minutes
    pub lockout_minutes: i64,
    /// Password rotation policy in days
    pub password_rotation_days: i64,
    /// Idle session timeout in minutes
    pub session_timeout_minutes: i64,
    /// Login attempts allowed per rate-limit window
    pub rate_limit_attempts: u32,
    /// Rate-limit window in seconds
    pub rate_limit_window_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            social_logins: SocialLogins::default(),
            max_login_limit: 3,
            auto_logout_on_password_change: true,
            failed_login_attempts_limit: 3,
            lockout_minutes: 5,
            password_rotation_days: 90,
            session_timeout_minutes: 60,
            rate_limit_attempts: 5,
            rate_limit_window_secs: 60,
        }
    }
}

impl Settings {
    /// Resolve the effective settings for a user.
    ///
    /// Absent or malformed overrides resolve to the defaults; this never
    /// fails and never mutates `defaults`.
    pub fn resolve(defaults: &Settings, override_json: Option<&Value>) -> Settings {
        let overrides: SettingsOverride = override_json
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or_default();

        let mut resolved = defaults.clone();

        if let Some(social) = overrides.social_logins {
            for provider in Provider::ALL {
                if let Some(enabled) = social.get(provider) {
                    resolved.social_logins.set(provider, enabled);
                }
            }
        }
        if let Some(v) = overrides.max_login_limit {
            resolved.max_login_limit = v;
        }
        if let Some(v) = overrides.auto_logout_on_password_change {
            resolved.auto_logout_on_password_change = v;
        }
        if let Some(v) = overrides.failed_login_attempts_limit {
            resolved.failed_login_attempts_limit = v;
        }
        if let Some(v) = overrides.lockout_minutes {
            resolved.lockout_minutes = v;
        }
        if let Some(v) = overrides.password_rotation_days {
            resolved.password_rotation_days = v;
        }
        if let Some(v) = overrides.session_timeout_minutes {
            resolved.session_timeout_minutes = v;
        }
        if let Some(v) = overrides.rate_limit_attempts {
            resolved.rate_limit_attempts = v;
        }
        if let Some(v) = overrides.rate_limit_window_secs {
            resolved.rate_limit_window_secs = v;
        }

        resolved
    }

    /// Override JSON enabling a single provider, for provisioned accounts.
    pub fn provider_override(provider: Provider) -> Value {
        serde_json::json!({
            "social_logins": { provider.as_str(): true }
        })
    }

    pub fn lockout_duration(&self) -> Duration {
        Duration::minutes(self.lockout_minutes)
    }

    pub fn session_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.session_timeout_minutes.max(0) as u64 * 60)
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig::new(self.rate_limit_attempts, self.rate_limit_window_secs)
    }
}

/// Stored per-user override: every field optional, unknown keys ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SettingsOverride {
    pub social_logins: Option<SocialLoginsOverride>,
    pub max_login_limit: Option<u32>,
    pub auto_logout_on_password_change: Option<bool>,
    pub failed_login_attempts_limit: Option<u16>,
    pub lockout_minutes: Option<i64>,
    pub password_rotation_days: Option<i64>,
    pub session_timeout_minutes: Option<i64>,
    pub rate_limit_attempts: Option<u32>,
    pub rate_limit_window_secs: Option<u64>,
}

/// Partial social toggle override
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct SocialLoginsOverride {
    pub google: Option<bool>,
    pub facebook: Option<bool>,
    pub linkedin: Option<bool>,
    pub twitter: Option<bool>,
}

impl SocialLoginsOverride {
    fn get(&self, provider: Provider) -> Option<bool> {
        match provider {
            Provider::Google => self.google,
            Provider::Facebook => self.facebook,
            Provider::Linkedin => self.linkedin,
            Provider::Twitter => self.twitter,
        }
    }
}
