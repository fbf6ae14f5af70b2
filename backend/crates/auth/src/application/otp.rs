//! OTP Service
//!
//! Issues, verifies, and clears short-lived one-time codes. Only the digest
//! and expiry are persisted; the plaintext goes out through the notifier.
//! Verification is a side-effect-free read - callers clear the code
//! explicitly after consuming the result.

use std::sync::Arc;

use platform::notify::{NotificationMessage, Notifier, Priority};

use crate::application::config::AuthConfig;
use crate::domain::entity::{credentials::Credentials, user::User};
use crate::domain::repository::CredentialsRepository;
use crate::domain::value_object::otp_code::OtpCode;
use crate::error::AuthResult;

/// What the code is being issued for; selects the notification template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPurpose {
    VerifyEmail,
    PasswordReset,
}

impl OtpPurpose {
    pub fn template(&self) -> &'static str {
        match self {
            OtpPurpose::VerifyEmail => "verify-email",
            OtpPurpose::PasswordReset => "password-reset",
        }
    }
}

/// One-time code service
pub struct OtpService<C, N>
where
    C: CredentialsRepository,
    N: Notifier,
{
    creds_repo: Arc<C>,
    notifier: Arc<N>,
    config: Arc<AuthConfig>,
}

impl<C, N> OtpService<C, N>
where
    C: CredentialsRepository,
    N: Notifier + Sync,
{
    pub fn new(creds_repo: Arc<C>, notifier: Arc<N>, config: Arc<AuthConfig>) -> Self {
        Self {
            creds_repo,
            notifier,
            config,
        }
    }

    /// Issue a fresh code: persist its digest and expiry, then dispatch the
    /// email. Delivery is fire-and-forget - a send failure is logged, never
    /// surfaced.
    pub async fn issue(
        &self,
        user: &User,
        credentials: &mut Credentials,
        purpose: OtpPurpose,
    ) -> AuthResult<OtpCode> {
        let code = OtpCode::generate();
        let expires_at = chrono::Utc::now() + self.config.otp_expiry();

        credentials.set_otp(code.digest(), expires_at);
        self.creds_repo.update(credentials).await?;

        let message = NotificationMessage::new(
            purpose.template(),
            user.email.as_str(),
            serde_json::json!({
                "userName": user.user_name.as_str(),
                "code": code.as_str(),
                "expiresMinutes": self.config.otp_ttl.as_secs() / 60,
            }),
        )
        .with_priority(Priority::High);

        if let Err(e) = self.notifier.send(&message).await {
            tracing::warn!(
                user_id = %user.user_id,
                template = purpose.template(),
                error = %e,
                "One-time code delivery failed"
            );
        }

        tracing::info!(
            user_id = %user.user_id,
            template = purpose.template(),
            "One-time code issued"
        );

        Ok(code)
    }

    /// Verify a submitted code against the stored digest.
    ///
    /// Fails closed: missing digest, missing expiry, expiry passed, or a
    /// digest mismatch all return false without revealing which. Does not
    /// clear the stored code.
    pub fn verify(&self, credentials: &Credentials, input: &str) -> bool {
        let Ok(code) = OtpCode::parse(input) else {
            return false;
        };
        let (Some(digest), Some(expires_at)) =
            (&credentials.otp_hash, credentials.otp_expires_at)
        else {
            return false;
        };
        if chrono::Utc::now() > expires_at {
            return false;
        }
        code.matches_digest(digest)
    }

    /// Explicitly discard the stored code after it has been consumed.
    pub async fn clear(&self, credentials: &mut Credentials) -> AuthResult<()> {
        credentials.clear_otp();
        self.creds_repo.update(credentials).await
    }
}
