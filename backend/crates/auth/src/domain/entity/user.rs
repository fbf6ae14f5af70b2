//! User Entity
//!
//! Core user profile entity. Sensitive authentication data lives in the
//! Credentials entity; this one carries identity, contact, status, the
//! per-user settings override, and the transport tokens.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::value_object::{
    email::Email,
    ids::{BusinessId, UserId},
    public_id::PublicId,
    session_token::SessionToken,
    user_name::UserName,
    user_status::UserStatus,
};

/// User entity, scoped to one tenant.
#[derive(Debug, Clone)]
pub struct User {
    /// Internal UUID identifier
    pub user_id: UserId,
    /// Public-facing nanoid identifier (URL-safe)
    pub public_id: PublicId,
    /// Tenant scope; every storage operation filters on this
    pub business_id: BusinessId,
    /// User name (unique per tenant in canonical form)
    pub user_name: UserName,
    /// Email address (unique per tenant)
    pub email: Email,
    /// Status (Active, Inactive)
    pub status: UserStatus,
    /// When the email address was verified, if ever
    pub email_verified_at: Option<DateTime<Utc>>,
    /// Per-user settings override (JSON), merged over the defaults at read time
    pub settings: Option<Value>,
    /// Current transport session token
    pub session_token: Option<String>,
    /// Remember-me token
    pub remember_token: Option<String>,
    /// Device push token (mobile)
    pub device_token: Option<String>,
    /// Last successful login time
    pub last_login_at: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with an unverified email.
    pub fn new(business_id: BusinessId, user_name: UserName, email: Email) -> Self {
        let now = Utc::now();
        Self {
            user_id: UserId::new(),
            public_id: PublicId::new(),
            business_id,
            user_name,
            email,
            status: UserStatus::default(),
            email_verified_at: None,
            settings: None,
            session_token: None,
            remember_token: None,
            device_token: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the account may authenticate.
    pub fn is_active(&self) -> bool {
        self.status.can_login()
    }

    pub fn has_verified_email(&self) -> bool {
        self.email_verified_at.is_some()
    }

    /// Mark the email address as verified.
    pub fn mark_email_verified(&mut self) {
        let now = Utc::now();
        self.email_verified_at = Some(now);
        self.updated_at = now;
    }

    /// Replace the email address; verification does not carry over.
    pub fn set_email(&mut self, email: Email) {
        self.email = email;
        self.email_verified_at = None;
        self.updated_at = Utc::now();
    }

    /// Record a successful login: session token + last-login timestamp.
    pub fn record_login(&mut self, token: &SessionToken) {
        let now = Utc::now();
        self.session_token = Some(token.as_str().to_string());
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    /// Drop the current session token.
    pub fn clear_session_token(&mut self) {
        self.session_token = None;
        self.updated_at = Utc::now();
    }

    /// Drop every transport token (all-device logout).
    pub fn clear_all_tokens(&mut self) {
        self.session_token = None;
        self.remember_token = None;
        self.device_token = None;
        self.updated_at = Utc::now();
    }

    pub fn set_status(&mut self, status: UserStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Replace the settings override.
    pub fn set_settings(&mut self, settings: Option<Value>) {
        self.settings = settings;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new(
            BusinessId::new(),
            UserName::new("alice").unwrap(),
            Email::new("alice@example.com").unwrap(),
        )
    }

    #[test]
    fn test_new_user_is_unverified_and_active() {
        let user = user();
        assert!(user.is_active());
        assert!(!user.has_verified_email());
        assert!(user.session_token.is_none());
    }

    #[test]
    fn test_record_login_sets_token_and_timestamp() {
        let mut user = user();
        let token = SessionToken::generate(&[1u8; 32]);

        user.record_login(&token);
        assert_eq!(user.session_token.as_deref(), Some(token.as_str()));
        assert!(user.last_login_at.is_some());
    }

    #[test]
    fn test_set_email_clears_verification() {
        let mut user = user();
        user.mark_email_verified();
        assert!(user.has_verified_email());

        user.set_email(Email::new("alice@new.example.com").unwrap());
        assert!(!user.has_verified_email());
    }

    #[test]
    fn test_clear_all_tokens() {
        let mut user = user();
        user.record_login(&SessionToken::generate(&[1u8; 32]));
        user.remember_token = Some("r".to_string());
        user.device_token = Some("d".to_string());

        user.clear_all_tokens();
        assert!(user.session_token.is_none());
        assert!(user.remember_token.is_none());
        assert!(user.device_token.is_none());
    }
}
