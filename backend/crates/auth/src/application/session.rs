//! Session Manager
//!
//! Issues session tokens, keeps the auth log consistent with the transport
//! session, enforces the per-account concurrency limit, and terminates
//! sessions. A session must never be observable in the transport layer
//! without its user-row token and audit record; every mid-pipeline failure
//! runs compensating cleanup.

use std::sync::Arc;

use platform::client::ClientInfo;

use crate::application::config::AuthConfig;
use crate::domain::entity::{
    auth_log::{AuthLog, LoginMethod},
    user::User,
};
use crate::domain::repository::{AuthLogRepository, UserRepository};
use crate::domain::settings::Settings;
use crate::domain::value_object::{ids::UserId, session_token::SessionToken};
use crate::error::{AuthError, AuthResult};

/// Outcome of a completed login
#[derive(Debug, Clone)]
pub struct CompletedSession {
    /// Token for the transport session (cookie value)
    pub token: SessionToken,
    /// Idle timeout to apply to the transport session's expiry marker
    pub timeout: std::time::Duration,
}

/// Session lifecycle manager
pub struct SessionManager<U, L>
where
    U: UserRepository,
    L: AuthLogRepository,
{
    user_repo: Arc<U>,
    log_repo: Arc<L>,
    config: Arc<AuthConfig>,
}

impl<U, L> SessionManager<U, L>
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

    /// Establish a session for an authenticated user.
    ///
    /// Ordering: token onto the user row, then the audit row, then the
    /// concurrency check. The count runs after insertion, so the rule is
    /// "count including this one must not exceed the limit" - a documented
    /// soft race under simultaneous logins for one account.
    pub async fn complete_login(
        &self,
        user: &mut User,
        settings: &Settings,
        client: &ClientInfo,
        method: LoginMethod,
    ) -> AuthResult<CompletedSession> {
        let token = SessionToken::generate(&self.config.session_secret);

        // Persist the token on the user row first; nothing to undo if this
        // fails since no transport session exists yet.
        user.record_login(&token);
        self.user_repo.update(user).await?;

        // Audit row. On failure the half-established session is torn down.
        let log = AuthLog::new(
            user.user_id,
            user.business_id,
            token.as_str().to_string(),
            method,
            client.ip_string(),
            client.user_agent.clone(),
        );

        if let Err(e) = self.log_repo.create(&log).await {
            tracing::warn!(
                user_id = %user.user_id,
                error = %e,
                "Auth log insert failed, invalidating session"
            );
            self.revoke_user_token(user).await;
            return Err(e);
        }

        // Concurrency limit, checked after insertion.
        let online = self.log_repo.count_online(&user.user_id).await?;
        if online > i64::from(settings.max_login_limit) {
            tracing::warn!(
                user_id = %user.user_id,
                online,
                limit = settings.max_login_limit,
                "Session limit exceeded, terminating new session"
            );
            self.log_repo
                .close_by_token(&user.user_id, token.as_str())
                .await?;
            self.revoke_user_token(user).await;
            return Err(AuthError::SessionLimitExceeded);
        }

        tracing::info!(
            public_id = %user.public_id,
            method = %method,
            "User signed in"
        );

        Ok(CompletedSession {
            token,
            timeout: settings.session_timeout(),
        })
    }

    /// Log out a single device/session.
    pub async fn logout_current(&self, user_id: &UserId, session_token: &str) -> AuthResult<()> {
        self.log_repo.close_by_token(user_id, session_token).await?;

        if let Some(mut user) = self.user_repo.find_by_id(user_id).await? {
            if user.session_token.as_deref() == Some(session_token) {
                user.clear_session_token();
                self.user_repo.update(&user).await?;
            }
        }

        tracing::info!(user_id = %user_id, "User signed out");
        Ok(())
    }

    /// Log out every device: close all audit rows and drop the session,
    /// remember, and device-push tokens.
    pub async fn logout_all(&self, user_id: &UserId) -> AuthResult<u64> {
        let closed = self.log_repo.close_all_for_user(user_id).await?;

        if let Some(mut user) = self.user_repo.find_by_id(user_id).await? {
            user.clear_all_tokens();
            self.user_repo.update(&user).await?;
        }

        tracing::info!(user_id = %user_id, sessions_closed = closed, "All devices signed out");
        Ok(closed)
    }

    /// Best-effort compensation: drop the just-written token from the user
    /// row. Failure here leaves a dangling token that the audit check in
    /// session validation will still reject.
    async fn revoke_user_token(&self, user: &mut User) {
        user.clear_session_token();
        if let Err(e) = self.user_repo.update(user).await {
            tracing::error!(
                user_id = %user.user_id,
                error = %e,
                "Failed to clear session token during compensation"
            );
        }
    }
}
