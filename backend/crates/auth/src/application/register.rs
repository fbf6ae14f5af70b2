//! Register Use Case
//!
//! Creates a new user account with unverified email and issues the first
//! verification code. Partial failures undo prior writes - registration
//! never leaves an orphaned user row.

use std::sync::Arc;

use platform::notify::Notifier;

use crate::application::config::AuthConfig;
use crate::application::otp::{OtpPurpose, OtpService};
use crate::domain::entity::{credentials::Credentials, user::User};
use crate::domain::repository::{CredentialsRepository, UserRepository};
use crate::domain::value_object::{
    email::Email,
    ids::BusinessId,
    user_name::UserName,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Register input
pub struct RegisterInput {
    pub business_id: BusinessId,
    pub user_name: String,
    pub email: String,
    pub password: String,
}

/// Register output
#[derive(Debug)]
pub struct RegisterOutput {
    pub public_id: String,
}

/// Register use case
pub struct RegisterUseCase<U, C, N>
where
    U: UserRepository,
    C: CredentialsRepository,
    N: Notifier + Sync,
{
    user_repo: Arc<U>,
    creds_repo: Arc<C>,
    otp: OtpService<C, N>,
    config: Arc<AuthConfig>,
}

impl<U, C, N> RegisterUseCase<U, C, N>
where
    U: UserRepository,
    C: CredentialsRepository,
    N: Notifier + Sync,
{
    pub fn new(user_repo: Arc<U>, creds_repo: Arc<C>, notifier: Arc<N>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            creds_repo: creds_repo.clone(),
            otp: OtpService::new(creds_repo, notifier, config.clone()),
            config,
        }
    }

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<RegisterOutput> {
        let user_name = UserName::new(input.user_name)
            .map_err(|e| AuthError::Validation(e.message().to_string()))?;
        let email = Email::new(input.email)
            .map_err(|e| AuthError::Validation(e.message().to_string()))?;

        if self
            .user_repo
            .exists_by_user_name(&input.business_id, &user_name)
            .await?
        {
            return Err(AuthError::UserNameTaken);
        }
        if self
            .user_repo
            .is_email_taken(&input.business_id, &email, None)
            .await?
        {
            return Err(AuthError::EmailTaken);
        }

        let raw_password = RawPassword::new(input.password)
            .map_err(|e| AuthError::Validation(e.message().to_string()))?;
        let password_hash = UserPassword::from_raw(&raw_password, self.config.pepper())
            .map_err(|e| AuthError::Internal(e.message().to_string()))?;

        let user = User::new(input.business_id, user_name, email);
        let mut credentials = Credentials::new(user.user_id, password_hash);

        self.user_repo.create(&user).await?;

        if let Err(e) = self.creds_repo.create(&credentials).await {
            self.rollback_user(&user).await;
            return Err(e);
        }

        if let Err(e) = self
            .otp
            .issue(&user, &mut credentials, OtpPurpose::VerifyEmail)
            .await
        {
            // The OTP write failed, not the delivery - undo the account.
            self.rollback_credentials(&user).await;
            self.rollback_user(&user).await;
            return Err(e);
        }

        tracing::info!(
            public_id = %user.public_id,
            user_name = %user.user_name,
            "User registered"
        );

        Ok(RegisterOutput {
            public_id: user.public_id.to_string(),
        })
    }

    async fn rollback_user(&self, user: &User) {
        if let Err(e) = self.user_repo.delete(&user.user_id).await {
            tracing::error!(
                user_id = %user.user_id,
                error = %e,
                "Failed to roll back user after registration failure"
            );
        }
    }

    async fn rollback_credentials(&self, user: &User) {
        if let Err(e) = self.creds_repo.delete(&user.user_id).await {
            tracing::error!(
                user_id = %user.user_id,
                error = %e,
                "Failed to roll back credentials after registration failure"
            );
        }
    }
}
