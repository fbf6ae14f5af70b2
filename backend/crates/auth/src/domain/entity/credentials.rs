//! Credentials Entity
//!
//! Sensitive authentication data for a user, separated from the profile:
//! password hash and age, failure/lockout tracking, the pending one-time
//! code, and the two-factor state.

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_object::{
    ids::UserId, recovery_codes::RecoveryCodes, totp_secret::TotpSecret,
    user_password::UserPassword,
};

/// Auth credentials entity
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Reference to User
    pub user_id: UserId,
    /// Hashed password
    pub password_hash: UserPassword,
    /// When the password was last changed (rotation policy input)
    pub password_changed_at: DateTime<Utc>,
    /// Consecutive login failure count
    pub failed_login_count: u16,
    /// When the account was locked, if it is
    pub locked_at: Option<DateTime<Utc>>,
    /// Digest of the pending one-time code
    pub otp_hash: Option<String>,
    /// Expiry of the pending one-time code
    pub otp_expires_at: Option<DateTime<Utc>>,
    /// TOTP secret for 2FA
    pub totp_secret: Option<TotpSecret>,
    /// Whether TOTP 2FA is enabled and verified
    pub totp_enabled: bool,
    /// Single-use recovery codes
    pub recovery_codes: RecoveryCodes,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Credentials {
    /// Create new credentials for a freshly registered user.
    pub fn new(user_id: UserId, password_hash: UserPassword) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            password_hash,
            password_changed_at: now,
            failed_login_count: 0,
            locked_at: None,
            otp_hash: None,
            otp_expires_at: None,
            totp_secret: None,
            totp_enabled: false,
            recovery_codes: RecoveryCodes::default(),
            created_at: now,
            updated_at: now,
        }
    }

    // ========================================================================
    // Failure tracking / lockout
    // ========================================================================

    /// Record a failed login attempt; locks the account when the counter
    /// reaches the limit.
    pub fn record_failure(&mut self, limit: u16) {
        let now = Utc::now();
        self.failed_login_count = self.failed_login_count.saturating_add(1);
        self.updated_at = now;

        if self.failed_login_count >= limit {
            self.locked_at = Some(now);
        }
    }

    /// Whether the lockout window is still open.
    pub fn is_locked(&self, lockout: Duration) -> bool {
        match self.locked_at {
            Some(locked_at) => Utc::now() < locked_at + lockout,
            None => false,
        }
    }

    /// Clear an elapsed lockout (lazy expiry; the counter survives until a
    /// successful login resets it).
    pub fn clear_lockout(&mut self) {
        self.locked_at = None;
        self.updated_at = Utc::now();
    }

    /// Reset failure tracking after a successful authentication.
    pub fn reset_failures(&mut self) {
        self.failed_login_count = 0;
        self.locked_at = None;
        self.updated_at = Utc::now();
    }

    // ========================================================================
    // Password age
    // ========================================================================

    /// Whether the rotation policy requires a reset before login.
    pub fn password_expired(&self, rotation_days: i64) -> bool {
        Utc::now() - self.password_changed_at > Duration::days(rotation_days)
    }

    /// Rotate the password; also clears failure state so a reset account is
    /// immediately usable.
    pub fn update_password(&mut self, new_password: UserPassword) {
        let now = Utc::now();
        self.password_hash = new_password;
        self.password_changed_at = now;
        self.failed_login_count = 0;
        self.locked_at = None;
        self.updated_at = now;
    }

    // ========================================================================
    // One-time code
    // ========================================================================

    /// Store a pending one-time code digest with its expiry.
    pub fn set_otp(&mut self, digest: String, expires_at: DateTime<Utc>) {
        self.otp_hash = Some(digest);
        self.otp_expires_at = Some(expires_at);
        self.updated_at = Utc::now();
    }

    /// Explicitly discard the pending one-time code.
    pub fn clear_otp(&mut self) {
        self.otp_hash = None;
        self.otp_expires_at = None;
        self.updated_at = Utc::now();
    }

    // ========================================================================
    // Two-factor
    // ========================================================================

    /// Start TOTP enrollment; not enabled until a code is verified.
    pub fn setup_totp(&mut self) -> TotpSecret {
        let secret = TotpSecret::generate();
        self.totp_secret = Some(secret.clone());
        self.totp_enabled = false;
        self.updated_at = Utc::now();
        secret
    }

    /// Enable TOTP after verification and install the recovery codes.
    pub fn enable_totp(&mut self, recovery_codes: RecoveryCodes) {
        if self.totp_secret.is_some() {
            self.totp_enabled = true;
            self.recovery_codes = recovery_codes;
            self.updated_at = Utc::now();
        }
    }

    /// Disable TOTP and drop the recovery codes.
    pub fn disable_totp(&mut self) {
        self.totp_secret = None;
        self.totp_enabled = false;
        self.recovery_codes = RecoveryCodes::default();
        self.updated_at = Utc::now();
    }

    /// Whether sign-in must pass the two-factor branch.
    pub fn requires_2fa(&self) -> bool {
        self.totp_enabled && self.totp_secret.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_password::{RawPassword, UserPassword};

    fn credentials() -> Credentials {
        let raw = RawPassword::new("sturdy passphrase 9".to_string()).unwrap();
        let hash = UserPassword::from_raw(&raw, None).unwrap();
        Credentials::new(UserId::new(), hash)
    }

    #[test]
    fn test_lockout_after_limit_failures() {
        let mut creds = credentials();
        let lockout = Duration::minutes(5);

        creds.record_failure(3);
        creds.record_failure(3);
        assert!(!creds.is_locked(lockout));

        creds.record_failure(3);
        assert!(creds.is_locked(lockout));
        assert_eq!(creds.failed_login_count, 3);
    }

    #[test]
    fn test_lockout_expires() {
        let mut creds = credentials();
        creds.record_failure(1);
        assert!(creds.is_locked(Duration::minutes(5)));

        // Pretend the lockout started long ago
        creds.locked_at = Some(Utc::now() - Duration::minutes(6));
        assert!(!creds.is_locked(Duration::minutes(5)));

        creds.clear_lockout();
        assert!(creds.locked_at.is_none());
        // Counter survives until a successful login
        assert_eq!(creds.failed_login_count, 1);
    }

    #[test]
    fn test_reset_failures() {
        let mut creds = credentials();
        creds.record_failure(3);
        creds.record_failure(3);
        creds.record_failure(3);

        creds.reset_failures();
        assert_eq!(creds.failed_login_count, 0);
        assert!(creds.locked_at.is_none());
    }

    #[test]
    fn test_password_expiry() {
        let mut creds = credentials();
        assert!(!creds.password_expired(90));

        creds.password_changed_at = Utc::now() - Duration::days(91);
        assert!(creds.password_expired(90));
    }

    #[test]
    fn test_update_password_clears_failure_state() {
        let mut creds = credentials();
        creds.record_failure(1);
        assert!(creds.is_locked(Duration::minutes(5)));

        let raw = RawPassword::new("another passphrase 7".to_string()).unwrap();
        creds.update_password(UserPassword::from_raw(&raw, None).unwrap());
        assert_eq!(creds.failed_login_count, 0);
        assert!(!creds.is_locked(Duration::minutes(5)));
    }

    #[test]
    fn test_otp_set_and_clear() {
        let mut creds = credentials();
        creds.set_otp("digest".to_string(), Utc::now() + Duration::minutes(10));
        assert!(creds.otp_hash.is_some());
        assert!(creds.otp_expires_at.is_some());

        creds.clear_otp();
        assert!(creds.otp_hash.is_none());
        assert!(creds.otp_expires_at.is_none());
    }

    #[test]
    fn test_totp_lifecycle() {
        let mut creds = credentials();
        assert!(!creds.requires_2fa());

        creds.setup_totp();
        // Not yet enabled before verification
        assert!(!creds.requires_2fa());

        let (codes, _) = RecoveryCodes::generate(4);
        creds.enable_totp(codes);
        assert!(creds.requires_2fa());

        creds.disable_totp();
        assert!(!creds.requires_2fa());
        assert!(creds.recovery_codes.is_empty());
    }
}
