//! Credential Gate
//!
//! Username/password verification with failure counting, lockout, and
//! password-age enforcement. Every login-class request passes through here;
//! each step short-circuits on failure.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::entity::{credentials::Credentials, user::User};
use crate::domain::repository::{CredentialsRepository, UserRepository};
use crate::domain::settings::Settings;
use crate::domain::value_object::{
    email::Email, ids::BusinessId, user_name::UserName, user_password::RawPassword,
};
use crate::error::{AuthError, AuthResult};

/// A user that passed the gate, with its credentials and resolved settings.
pub struct AuthenticatedUser {
    pub user: User,
    pub credentials: Credentials,
    pub settings: Settings,
}

/// Credential verification gate
pub struct CredentialGate<U, C>
where
    U: UserRepository,
    C: CredentialsRepository,
{
    user_repo: Arc<U>,
    creds_repo: Arc<C>,
    config: Arc<AuthConfig>,
}

impl<U, C> CredentialGate<U, C>
where
    U: UserRepository,
    C: CredentialsRepository,
{
    pub fn new(user_repo: Arc<U>, creds_repo: Arc<C>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            creds_repo,
            config,
        }
    }

    /// Authenticate an identifier (user name or email) and password.
    ///
    /// An unknown identifier yields the same `InvalidCredentials` as a wrong
    /// password; failed attempts are only recorded when the account exists.
    pub async fn authenticate(
        &self,
        business_id: &BusinessId,
        identifier: &str,
        password: &str,
    ) -> AuthResult<AuthenticatedUser> {
        // Step 1: lookup
        let user = self
            .find_user(business_id, identifier)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let settings = Settings::resolve(&self.config.defaults, user.settings.as_ref());

        let mut credentials = self
            .creds_repo
            .find_by_user_id(&user.user_id)
            .await?
            .ok_or_else(|| AuthError::Internal("Credentials not found".to_string()))?;

        // Step 2: password + status; any mismatch counts toward lockout
        let password_ok = match RawPassword::new(password.to_string()) {
            Ok(raw) => credentials.password_hash.verify(&raw, self.config.pepper()),
            Err(_) => false,
        };

        if !password_ok || !user.is_active() {
            credentials.record_failure(settings.failed_login_attempts_limit);
            self.creds_repo.update(&credentials).await?;
            return Err(AuthError::InvalidCredentials);
        }

        // Step 3: lockout window, cleared lazily once elapsed
        if credentials.is_locked(settings.lockout_duration()) {
            return Err(AuthError::AccountLocked);
        }
        if credentials.locked_at.is_some() {
            credentials.clear_lockout();
            self.creds_repo.update(&credentials).await?;
        }

        // Step 4: rotation policy; blocks login without invalidating the
        // password server-side
        if credentials.password_expired(settings.password_rotation_days) {
            return Err(AuthError::PasswordExpired);
        }

        // Step 5: success resets the failure counter
        if credentials.failed_login_count > 0 {
            credentials.reset_failures();
            self.creds_repo.update(&credentials).await?;
        }

        Ok(AuthenticatedUser {
            user,
            credentials,
            settings,
        })
    }

    async fn find_user(
        &self,
        business_id: &BusinessId,
        identifier: &str,
    ) -> AuthResult<Option<User>> {
        if identifier.contains('@') {
            match Email::new(identifier) {
                Ok(email) => self.user_repo.find_by_email(business_id, &email).await,
                Err(_) => Ok(None),
            }
        } else {
            match UserName::new(identifier) {
                Ok(user_name) => {
                    self.user_repo
                        .find_by_user_name(business_id, &user_name)
                        .await
                }
                Err(_) => Ok(None),
            }
        }
    }
}
