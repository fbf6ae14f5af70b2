//! Auth Log Entity
//!
//! One row per login event/session: the audit trail behind the
//! concurrent-session limit and the device list. Rows are flipped offline on
//! logout or forced termination, never hard-deleted.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::value_object::{
    ids::{BusinessId, UserId},
    provider::Provider,
};

/// How a session was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMethod {
    /// Username/password
    Normal,
    /// Third-party identity
    Social(Provider),
}

impl LoginMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginMethod::Normal => "normal",
            LoginMethod::Social(provider) => provider.as_str(),
        }
    }

    /// Restore from a database value; unknown names fall back to normal.
    pub fn from_db(value: &str) -> Self {
        Provider::parse(value)
            .map(LoginMethod::Social)
            .unwrap_or(LoginMethod::Normal)
    }
}

impl std::fmt::Display for LoginMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Login audit entity
#[derive(Debug, Clone)]
pub struct AuthLog {
    /// Row ID (UUID v4)
    pub id: Uuid,
    /// Reference to User
    pub user_id: UserId,
    /// Tenant scope
    pub business_id: BusinessId,
    /// Session token this row audits
    pub session_token: String,
    /// Device descriptor (User-Agent)
    pub device: Option<String>,
    /// Origin address
    pub ip_address: Option<String>,
    /// How the session was established
    pub method: LoginMethod,
    /// Whether the session is currently active
    pub online: bool,
    /// Login timestamp
    pub logged_in_at: DateTime<Utc>,
    /// Logout timestamp (explicit or forced)
    pub logged_out_at: Option<DateTime<Utc>>,
    /// Last activity timestamp
    pub last_activity_at: DateTime<Utc>,
}

impl AuthLog {
    /// Create an online log row for a fresh session.
    pub fn new(
        user_id: UserId,
        business_id: BusinessId,
        session_token: String,
        method: LoginMethod,
        ip_address: Option<String>,
        device: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            business_id,
            session_token,
            device,
            ip_address,
            method,
            online: true,
            logged_in_at: now,
            logged_out_at: None,
            last_activity_at: now,
        }
    }

    /// Flip offline and stamp the logout time.
    pub fn close(&mut self) {
        self.online = false;
        self.logged_out_at = Some(Utc::now());
    }

    /// Update last activity.
    pub fn touch(&mut self) {
        self.last_activity_at = Utc::now();
    }

    /// Whether the session idled past its timeout.
    pub fn is_stale(&self, timeout_minutes: i64) -> bool {
        Utc::now() > self.last_activity_at + Duration::minutes(timeout_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log() -> AuthLog {
        AuthLog::new(
            UserId::new(),
            BusinessId::new(),
            "token".to_string(),
            LoginMethod::Normal,
            Some("10.0.0.1".to_string()),
            Some("Mozilla/5.0".to_string()),
        )
    }

    #[test]
    fn test_new_log_is_online() {
        let log = log();
        assert!(log.online);
        assert!(log.logged_out_at.is_none());
    }

    #[test]
    fn test_close() {
        let mut log = log();
        log.close();
        assert!(!log.online);
        assert!(log.logged_out_at.is_some());
    }

    #[test]
    fn test_staleness() {
        let mut log = log();
        assert!(!log.is_stale(60));

        log.last_activity_at = Utc::now() - Duration::minutes(61);
        assert!(log.is_stale(60));
    }

    #[test]
    fn test_login_method_strings() {
        assert_eq!(LoginMethod::Normal.as_str(), "normal");
        assert_eq!(LoginMethod::Social(Provider::Google).as_str(), "google");
        assert_eq!(
            LoginMethod::from_db("google"),
            LoginMethod::Social(Provider::Google)
        );
        assert_eq!(LoginMethod::from_db("normal"), LoginMethod::Normal);
    }
}
