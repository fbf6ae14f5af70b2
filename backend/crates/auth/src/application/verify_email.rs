//! Verify Email Use Case
//!
//! Confirms possession of an email address with a one-time code and
//! completes the pending login. Also re-issues codes on request.

use std::sync::Arc;

use platform::client::ClientInfo;
use platform::notify::Notifier;

use crate::application::config::AuthConfig;
use crate::application::otp::{OtpPurpose, OtpService};
use crate::application::session::{CompletedSession, SessionManager};
use crate::domain::entity::auth_log::LoginMethod;
use crate::domain::repository::{AuthLogRepository, CredentialsRepository, UserRepository};
use crate::domain::settings::Settings;
use crate::domain::value_object::{email::Email, ids::BusinessId};
use crate::error::{AuthError, AuthResult};

/// Verify email output
#[derive(Debug)]
pub struct VerifyEmailOutput {
    pub public_id: String,
    pub session: CompletedSession,
}

/// Verify email use case
pub struct VerifyEmailUseCase<U, C, L, N>
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

impl<U, C, L, N> VerifyEmailUseCase<U, C, L, N>
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

    /// Verify the code and establish the session.
    ///
    /// Unknown addresses and wrong codes are indistinguishable to the
    /// caller.
    pub async fn execute(
        &self,
        business_id: BusinessId,
        email: &str,
        code: &str,
        client: &ClientInfo,
    ) -> AuthResult<VerifyEmailOutput> {
        let email =
            Email::new(email).map_err(|e| AuthError::Validation(e.message().to_string()))?;

        let mut user = self
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

        // Verification succeeded: consume the code, then flip the flag.
        self.otp.clear(&mut credentials).await?;

        user.mark_email_verified();
        self.user_repo.update(&user).await?;

        let settings = Settings::resolve(&self.config.defaults, user.settings.as_ref());
        let session = self
            .sessions
            .complete_login(&mut user, &settings, client, LoginMethod::Normal)
            .await?;

        tracing::info!(public_id = %user.public_id, "Email verified");

        Ok(VerifyEmailOutput {
            public_id: user.public_id.to_string(),
            session,
        })
    }

    /// Re-issue the verification code. Always responds generically so the
    /// endpoint cannot be used to probe for accounts.
    pub async fn resend(&self, business_id: BusinessId, email: &str) -> AuthResult<()> {
        let Ok(email) = Email::new(email) else {
            return Ok(());
        };
        let Some(user) = self.user_repo.find_by_email(&business_id, &email).await? else {
            return Ok(());
        };
        if user.has_verified_email() {
            return Ok(());
        }

        let mut credentials = self
            .creds_repo
            .find_by_user_id(&user.user_id)
            .await?
            .ok_or_else(|| AuthError::Internal("Credentials not found".to_string()))?;

        self.otp
            .issue(&user, &mut credentials, OtpPurpose::VerifyEmail)
            .await?;
        Ok(())
    }
}
