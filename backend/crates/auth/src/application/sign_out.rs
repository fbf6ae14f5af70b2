//! Sign Out Use Case
//!
//! Terminates the current session or every session for the account.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::repository::{AuthLogRepository, UserRepository};
use crate::domain::value_object::session_token::SessionToken;
use crate::error::{AuthError, AuthResult};

use crate::application::session::SessionManager;

/// Sign out use case
pub struct SignOutUseCase<U, L>
where
    U: UserRepository,
    L: AuthLogRepository,
{
    log_repo: Arc<L>,
    sessions: SessionManager<U, L>,
    config: Arc<AuthConfig>,
}

impl<U, L> SignOutUseCase<U, L>
where
    U: UserRepository,
    L: AuthLogRepository,
{
    pub fn new(user_repo: Arc<U>, log_repo: Arc<L>, config: Arc<AuthConfig>) -> Self {
        Self {
            log_repo: log_repo.clone(),
            sessions: SessionManager::new(user_repo, log_repo, config.clone()),
            config,
        }
    }

    /// Sign out the current device.
    pub async fn execute(&self, token: &str) -> AuthResult<()> {
        let log = self.resolve(token).await?;
        self.sessions.logout_current(&log.user_id, token).await
    }

    /// Sign out every device for the token's owner.
    pub async fn execute_all(&self, token: &str) -> AuthResult<u64> {
        let log = self.resolve(token).await?;
        self.sessions.logout_all(&log.user_id).await
    }

    async fn resolve(&self, token: &str) -> AuthResult<crate::domain::entity::auth_log::AuthLog> {
        if !SessionToken::verify(token, &self.config.session_secret) {
            return Err(AuthError::SessionInvalid);
        }
        self.log_repo
            .find_by_token(token)
            .await?
            .filter(|log| log.online)
            .ok_or(AuthError::SessionInvalid)
    }
}
