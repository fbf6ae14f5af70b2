//! Password Reset Use Case
//!
//! Request/reset flow reusing the OTP service. The request endpoint answers
//! generically whether or not the account exists; a successful reset rotates
//! the password and, per settings, terminates every active session.

use std::sync::Arc;

use platform::notify::Notifier;

use crate::application::config::AuthConfig;
use crate::application::otp::{OtpPurpose, OtpService};
use crate::application::session::SessionManager;
use crate::domain::repository::{AuthLogRepository, CredentialsRepository, UserRepository};
use crate::domain::settings::Settings;
use crate::domain::value_object::{
    email::Email,
    ids::BusinessId,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Password reset use case
pub struct PasswordResetUseCase<U, C, L, N>
where
    U: UserRepository,
    C: CredentialsRepository,
    L: AuthLogRepository,
    N: Notifier + Sync,
{
    user_repo: Arc<U>,
    creds_repo: Arc<C>,
    otp: OtpService<C, N>,
    sessions: SessionManager<U, L>,
    config: Arc<AuthConfig>,
}

impl<U, C, L, N> PasswordResetUseCase<U, C, L, N>
where
    U: UserRepository,
    C: CredentialsRepository,
    L: AuthLogRepository,
    N: Notifier + Sync,
{
    pub fn new(
        user_repo: Arc<U>,
        creds_repo: Arc<C>,
        log_repo: Arc<L>,
        notifier: Arc<N>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo: user_repo.clone(),
            creds_repo: creds_repo.clone(),
            otp: OtpService::new(creds_repo, notifier, config.clone()),
            sessions: SessionManager::new(user_repo, log_repo, config.clone()),
            config,
        }
    }

    /// Issue a reset code. The response never reveals whether the address
    /// has an account.
    pub async fn request(&self, business_id: BusinessId, email: &str) -> AuthResult<()> {
        let Ok(email) = Email::new(email) else {
            return Ok(());
        };
        let Some(user) = self.user_repo.find_by_email(&business_id, &email).await? else {
            return Ok(());
        };

        let mut credentials = self
            .creds_repo
            .find_by_user_id(&user.user_id)
            .await?
            .ok_or_else(|| AuthError::Internal("Credentials not found".to_string()))?;

        self.otp
            .issue(&user, &mut credentials, OtpPurpose::PasswordReset)
            .await?;
        Ok(())
    }

    /// Verify the reset code and rotate the password.
    pub async fn reset(
        &self,
        business_id: BusinessId,
        email: &str,
        code: &str,
        new_password: String,
    ) -> AuthResult<()> {
        let email =
            Email::new(email).map_err(|e| AuthError::Validation(e.message().to_string()))?;

        let user = self
            .user_repo
            .find_by_email(&business_id, &email)
            .await?
            .ok_or(AuthError::OtpInvalidOrExpired)?;

        let mut credentials = self
            .creds_repo
            .find_by_user_id(&user.user_id)
            .await?
            .ok_or_else(|| AuthError::Internal("Credentials not found".to_string()))?;

        if !self.otp.verify(&credentials, code) {
            return Err(AuthError::OtpInvalidOrExpired);
        }

        // Validate the replacement before consuming the code, so a rejected
        // password leaves the code usable for another attempt.
        let raw = RawPassword::new(new_password)
            .map_err(|e| AuthError::Validation(e.message().to_string()))?;
        let hash = UserPassword::from_raw(&raw, self.config.pepper())
            .map_err(|e| AuthError::Internal(e.message().to_string()))?;

        self.otp.clear(&mut credentials).await?;

        credentials.update_password(hash);
        self.creds_repo.update(&credentials).await?;

        let settings = Settings::resolve(&self.config.defaults, user.settings.as_ref());
        if settings.auto_logout_on_password_change {
            self.sessions.logout_all(&user.user_id).await?;
        }

        tracing::info!(public_id = %user.public_id, "Password reset");
        Ok(())
    }
}
