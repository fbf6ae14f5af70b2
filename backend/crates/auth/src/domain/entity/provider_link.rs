//! Provider Link Entity
//!
//! Links a local user to a third-party identity. Unique on
//! (provider, subject); at most one link per (user, provider) — refreshes
//! overwrite rather than duplicate.

use chrono::{DateTime, Utc};

use crate::domain::value_object::{ids::UserId, provider::Provider};

/// Third-party identity link
#[derive(Debug, Clone)]
pub struct ProviderLink {
    /// Owning user
    pub user_id: UserId,
    /// Identity provider
    pub provider: Provider,
    /// Provider-assigned subject identifier
    pub subject_id: String,
    /// Provider access token (opaque)
    pub access_token: Option<String>,
    /// Provider refresh token (opaque)
    pub refresh_token: Option<String>,
    /// Access token expiry
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProviderLink {
    pub fn new(user_id: UserId, provider: Provider, subject_id: String) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            provider,
            subject_id,
            access_token: None,
            refresh_token: None,
            expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the stored provider tokens from a fresh assertion.
    pub fn refresh_tokens(
        &mut self,
        access_token: Option<String>,
        refresh_token: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) {
        self.access_token = access_token;
        self.refresh_token = refresh_token;
        self.expires_at = expires_at;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_overwrites_tokens() {
        let mut link = ProviderLink::new(UserId::new(), Provider::Google, "sub-1".to_string());
        assert!(link.access_token.is_none());

        link.refresh_tokens(Some("at".to_string()), Some("rt".to_string()), None);
        assert_eq!(link.access_token.as_deref(), Some("at"));
        assert_eq!(link.refresh_token.as_deref(), Some("rt"));

        link.refresh_tokens(Some("at2".to_string()), None, None);
        assert_eq!(link.access_token.as_deref(), Some("at2"));
        assert!(link.refresh_token.is_none());
    }
}
