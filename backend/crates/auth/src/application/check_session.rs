//! Check Session Use Case
//!
//! Validates a presented session token: signature first, then the audit row
//! must be online and within its idle timeout. Valid checks touch the
//! activity timestamp; timed-out sessions are closed on the spot.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::entity::{auth_log::AuthLog, user::User};
use crate::domain::repository::{AuthLogRepository, UserRepository};
use crate::domain::settings::Settings;
use crate::domain::value_object::session_token::SessionToken;
use crate::error::{AuthError, AuthResult};

/// Active session with its owner.
pub struct ActiveSession {
    pub user: User,
    pub log: AuthLog,
    pub settings: Settings,
}

/// Check session use case
pub struct CheckSessionUseCase<U, L>
where
    U: UserRepository,
    L: AuthLogRepository,
{
    user_repo: Arc<U>,
    log_repo: Arc<L>,
    config: Arc<AuthConfig>,
}

impl<U, L> CheckSessionUseCase<U, L>
where
    U: UserRepository,
    L: AuthLogRepository,
{
    pub fn new(user_repo: Arc<U>, log_repo: Arc<L>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            log_repo,
            config,
        }
    }

    /// Resolve a token to its active session, touching last activity.
    pub async fn execute(&self, token: &str) -> AuthResult<ActiveSession> {
        // Signature check keeps junk tokens away from storage.
        if !SessionToken::verify(token, &self.config.session_secret) {
            return Err(AuthError::SessionInvalid);
        }

        let mut log = self
            .log_repo
            .find_by_token(token)
            .await?
            .ok_or(AuthError::SessionInvalid)?;
        if !log.online {
            return Err(AuthError::SessionInvalid);
        }

        let user = self
            .user_repo
            .find_by_id(&log.user_id)
            .await?
            .ok_or(AuthError::SessionInvalid)?;

        let settings = Settings::resolve(&self.config.defaults, user.settings.as_ref());

        // Idle timeout: close the row and reject.
        if log.is_stale(settings.session_timeout_minutes) {
            self.log_repo
                .close_by_token(&log.user_id, &log.session_token)
                .await?;
            if user.session_token.as_deref() == Some(token) {
                let mut user = user;
                user.clear_session_token();
                self.user_repo.update(&user).await?;
            }
            return Err(AuthError::SessionInvalid);
        }

        log.touch();
        self.log_repo.update(&log).await?;

        Ok(ActiveSession {
            user,
            log,
            settings,
        })
    }

    /// Just check validity.
    pub async fn is_valid(&self, token: &str) -> bool {
        self.execute(token).await.is_ok()
    }
}
