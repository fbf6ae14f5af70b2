//! Two-Factor Service
//!
//! Verifies TOTP codes during sign-in, falling back to single-use recovery
//! codes, and owns 2FA enrollment (setup, confirm, disable).

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::entity::{credentials::Credentials, user::User};
use crate::domain::repository::{CredentialsRepository, UserRepository};
use crate::domain::value_object::{
    ids::BusinessId,
    public_id::PublicId,
    recovery_codes::{RECOVERY_CODE_COUNT, RecoveryCodes},
};
use crate::error::{AuthError, AuthResult};

/// Output of starting 2FA enrollment
pub struct TwoFactorSetupOutput {
    /// QR code as base64-encoded PNG
    pub qr_code_base64: String,
    /// Secret for manual entry
    pub secret: String,
    /// otpauth:// URL
    pub otpauth_url: String,
}

/// Two-factor verification and enrollment service
pub struct TwoFactorService<U, C>
where
    U: UserRepository,
    C: CredentialsRepository,
{
    user_repo: Arc<U>,
    creds_repo: Arc<C>,
    #[allow(dead_code)]
    config: Arc<AuthConfig>,
}

impl<U, C> TwoFactorService<U, C>
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

    /// Verify a second-factor code during sign-in.
    ///
    /// TOTP first; on mismatch the code is treated as a recovery-code
    /// candidate and consumed through the repository's conditional update,
    /// so the same code can never verify twice.
    pub async fn verify(
        &self,
        user: &User,
        credentials: &Credentials,
        code: &str,
    ) -> AuthResult<bool> {
        if let (true, Some(secret)) = (credentials.totp_enabled, &credentials.totp_secret) {
            let totp_ok = secret
                .verify(code, user.user_name.as_str())
                .map_err(|e| AuthError::Internal(e.to_string()))?;
            if totp_ok {
                return Ok(true);
            }
        }

        let consumed = self
            .creds_repo
            .mark_recovery_code_used(&user.user_id, code.trim())
            .await?;
        if consumed {
            tracing::warn!(user_id = %user.user_id, "Recovery code consumed");
        }
        Ok(consumed)
    }

    /// Start enrollment: generate a secret (disabled until confirmed).
    pub async fn setup(
        &self,
        business_id: &BusinessId,
        public_id: &PublicId,
    ) -> AuthResult<TwoFactorSetupOutput> {
        let (user, mut credentials) = self.load(business_id, public_id).await?;

        let secret = credentials.setup_totp();
        self.creds_repo.update(&credentials).await?;

        let account_name = user.user_name.as_str();
        let qr_code = secret
            .generate_qr_code(account_name)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        let otpauth_url = secret
            .get_otpauth_url(account_name)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        tracing::info!(user_id = %user.user_id, "Two-factor setup initiated");

        Ok(TwoFactorSetupOutput {
            qr_code_base64: qr_code,
            secret: secret.as_base32().to_string(),
            otpauth_url,
        })
    }

    /// Confirm enrollment with a code from the authenticator; enables 2FA
    /// and returns the plaintext recovery codes exactly once.
    pub async fn confirm(
        &self,
        business_id: &BusinessId,
        public_id: &PublicId,
        code: &str,
    ) -> AuthResult<Vec<String>> {
        let (user, mut credentials) = self.load(business_id, public_id).await?;

        let secret = credentials
            .totp_secret
            .as_ref()
            .ok_or(AuthError::TwoFactorNotSetup)?;

        let valid = secret
            .verify(code, user.user_name.as_str())
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        if !valid {
            return Err(AuthError::TwoFactorInvalid);
        }

        let (codes, plain) = RecoveryCodes::generate(RECOVERY_CODE_COUNT);
        credentials.enable_totp(codes);
        self.creds_repo.update(&credentials).await?;

        tracing::info!(user_id = %user.user_id, "Two-factor enabled");
        Ok(plain)
    }

    /// Disable 2FA after verifying a current code (TOTP or recovery).
    pub async fn disable(
        &self,
        business_id: &BusinessId,
        public_id: &PublicId,
        code: &str,
    ) -> AuthResult<()> {
        let (user, credentials) = self.load(business_id, public_id).await?;

        if !credentials.requires_2fa() {
            return Err(AuthError::TwoFactorNotSetup);
        }
        if !self.verify(&user, &credentials, code).await? {
            return Err(AuthError::TwoFactorInvalid);
        }

        // Re-read after verify: a recovery-code path has already written.
        let mut credentials = self
            .creds_repo
            .find_by_user_id(&user.user_id)
            .await?
            .ok_or_else(|| AuthError::Internal("Credentials not found".to_string()))?;
        credentials.disable_totp();
        self.creds_repo.update(&credentials).await?;

        tracing::info!(user_id = %user.user_id, "Two-factor disabled");
        Ok(())
    }

    async fn load(
        &self,
        business_id: &BusinessId,
        public_id: &PublicId,
    ) -> AuthResult<(User, Credentials)> {
        let user = self
            .user_repo
            .find_by_public_id(business_id, public_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let credentials = self
            .creds_repo
            .find_by_user_id(&user.user_id)
            .await?
            .ok_or_else(|| AuthError::Internal("Credentials not found".to_string()))?;

        Ok((user, credentials))
    }
}
