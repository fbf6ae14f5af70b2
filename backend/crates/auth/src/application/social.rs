//! Social Sign In
//!
//! Resolves or provisions a local account from a third-party identity
//! assertion, then rejoins the regular sign-in branch point. Resolution
//! precedence: existing provider link, then email match, then provisioning
//! (when the provider's toggle allows it). Partial provisioning failures
//! roll back so no orphan identities remain.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::client::ClientInfo;
use platform::notify::Notifier;

use crate::application::config::AuthConfig;
use crate::application::otp::{OtpPurpose, OtpService};
use crate::application::session::SessionManager;
use crate::application::sign_in::SignInOutcome;
use crate::application::two_factor::TwoFactorService;
use crate::domain::entity::{
    auth_log::LoginMethod, credentials::Credentials, provider_link::ProviderLink, user::User,
};
use crate::domain::repository::{
    AuthLogRepository, CredentialsRepository, ProviderLinkRepository, UserRepository,
};
use crate::domain::settings::Settings;
use crate::domain::value_object::{
    email::Email, ids::BusinessId, provider::Provider, user_name::UserName,
    user_password::UserPassword,
};
use crate::error::{AuthError, AuthResult};

/// Verified claims from the identity provider.
#[derive(Debug, Clone)]
pub struct ProviderAssertion {
    /// Provider-assigned subject identifier
    pub subject_id: String,
    /// Email attested by the provider
    pub email: String,
    /// Provider access token (opaque)
    pub access_token: Option<String>,
    /// Provider refresh token (opaque)
    pub refresh_token: Option<String>,
    /// Access token expiry
    pub expires_at: Option<DateTime<Utc>>,
}

/// Resolves provider assertions to local users.
pub struct SocialIdentityLinker<U, C, P>
where
    U: UserRepository,
    C: CredentialsRepository,
    P: ProviderLinkRepository,
{
    user_repo: Arc<U>,
    creds_repo: Arc<C>,
    link_repo: Arc<P>,
    config: Arc<AuthConfig>,
}

impl<U, C, P> SocialIdentityLinker<U, C, P>
where
    U: UserRepository,
    C: CredentialsRepository,
    P: ProviderLinkRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        creds_repo: Arc<C>,
        link_repo: Arc<P>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            creds_repo,
            link_repo,
            config,
        }
    }

    /// Resolve an assertion to a user, provisioning one when allowed.
    ///
    /// Returns `None` when no account exists and the provider's toggle in
    /// the default settings forbids self-registration.
    pub async fn resolve(
        &self,
        business_id: &BusinessId,
        provider: Provider,
        assertion: &ProviderAssertion,
    ) -> AuthResult<Option<User>> {
        let email = Email::new(&assertion.email)
            .map_err(|e| AuthError::Validation(e.message().to_string()))?;

        // 1. Existing link wins.
        if let Some(mut link) = self
            .link_repo
            .find_by_subject(provider, &assertion.subject_id)
            .await?
        {
            let mut user = self
                .user_repo
                .find_by_id(&link.user_id)
                .await?
                .ok_or_else(|| AuthError::Internal("Provider link without owner".to_string()))?;

            link.refresh_tokens(
                assertion.access_token.clone(),
                assertion.refresh_token.clone(),
                assertion.expires_at,
            );
            self.link_repo.update(&link).await?;

            self.sync_email(&mut user, &email).await?;
            return Ok(Some(user));
        }

        // 2. Email match creates the missing link.
        if let Some(user) = self.user_repo.find_by_email(business_id, &email).await? {
            match self.link_repo.find_for_user(&user.user_id, provider).await? {
                // At most one link per (user, provider): overwrite, never duplicate.
                Some(mut existing) => {
                    existing.subject_id = assertion.subject_id.clone();
                    existing.refresh_tokens(
                        assertion.access_token.clone(),
                        assertion.refresh_token.clone(),
                        assertion.expires_at,
                    );
                    self.link_repo.update(&existing).await?;
                }
                None => {
                    let mut link =
                        ProviderLink::new(user.user_id, provider, assertion.subject_id.clone());
                    link.refresh_tokens(
                        assertion.access_token.clone(),
                        assertion.refresh_token.clone(),
                        assertion.expires_at,
                    );
                    self.link_repo.create(&link).await?;
                }
            }
            return Ok(Some(user));
        }

        // 3. Provision, if this provider may self-register.
        if !self.config.defaults.social_logins.enabled(provider) {
            return Ok(None);
        }
        self.provision(business_id, provider, assertion, &email)
            .await
            .map(Some)
    }

    /// Create a fresh account for the assertion. Every write after the user
    /// row is compensated on failure.
    async fn provision(
        &self,
        business_id: &BusinessId,
        provider: Provider,
        assertion: &ProviderAssertion,
        email: &Email,
    ) -> AuthResult<User> {
        let user_name = self.synthesize_user_name(business_id, email, provider).await?;

        let mut user = User::new(*business_id, user_name, email.clone());
        // The provider attested this address.
        user.mark_email_verified();
        user.set_settings(Some(Settings::provider_override(provider)));

        let password = UserPassword::unusable(self.config.pepper())
            .map_err(|e| AuthError::Internal(e.message().to_string()))?;
        let credentials = Credentials::new(user.user_id, password);

        self.user_repo.create(&user).await?;

        if let Err(e) = self.creds_repo.create(&credentials).await {
            self.rollback_user(&user).await;
            return Err(e);
        }

        let mut link = ProviderLink::new(user.user_id, provider, assertion.subject_id.clone());
        link.refresh_tokens(
            assertion.access_token.clone(),
            assertion.refresh_token.clone(),
            assertion.expires_at,
        );
        if let Err(e) = self.link_repo.create(&link).await {
            self.rollback_credentials(&user).await;
            self.rollback_user(&user).await;
            return Err(e);
        }

        tracing::info!(
            public_id = %user.public_id,
            provider = %provider,
            "Provisioned account from provider assertion"
        );

        Ok(user)
    }

    /// Update the user's email from the assertion when it changed and the
    /// new address is free; verification does not carry over.
    async fn sync_email(&self, user: &mut User, email: &Email) -> AuthResult<()> {
        if &user.email == email {
            return Ok(());
        }
        let taken = self
            .user_repo
            .is_email_taken(&user.business_id, email, Some(&user.user_id))
            .await?;
        if taken {
            return Ok(());
        }

        user.set_email(email.clone());
        self.user_repo.update(user).await
    }

    /// Unique username from the email local part + provider name, with
    /// numeric suffixes on collision.
    async fn synthesize_user_name(
        &self,
        business_id: &BusinessId,
        email: &Email,
        provider: Provider,
    ) -> AuthResult<UserName> {
        let local: String = email
            .local_part()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '_' || *c == '-')
            .collect();
        let local = if local.is_empty() { "user".to_string() } else { local };
        let base = format!("{}.{}", local, provider.as_str());

        for suffix in 0..100u32 {
            let candidate = if suffix == 0 {
                base.clone()
            } else {
                format!("{}{}", base, suffix)
            };
            // Over-long candidates fail validation; fall through to the next
            // loop iteration is pointless then, so truncate first.
            let candidate: String = candidate.chars().take(32).collect();
            let Ok(user_name) = UserName::new(candidate) else {
                continue;
            };
            if !self
                .user_repo
                .exists_by_user_name(business_id, &user_name)
                .await?
            {
                return Ok(user_name);
            }
        }

        Err(AuthError::Internal(
            "Could not synthesize a unique user name".to_string(),
        ))
    }

    async fn rollback_user(&self, user: &User) {
        if let Err(e) = self.user_repo.delete(&user.user_id).await {
            tracing::error!(
                user_id = %user.user_id,
                error = %e,
                "Failed to roll back provisioned user"
            );
        }
    }

    async fn rollback_credentials(&self, user: &User) {
        if let Err(e) = self.creds_repo.delete(&user.user_id).await {
            tracing::error!(
                user_id = %user.user_id,
                error = %e,
                "Failed to roll back provisioned credentials"
            );
        }
    }
}

/// Social sign in use case: resolve, then rejoin the sign-in branch point.
pub struct SocialSignInUseCase<U, C, L, P, N>
where
    U: UserRepository,
    C: CredentialsRepository,
    L: AuthLogRepository,
    P: ProviderLinkRepository,
    N: Notifier + Sync,
{
    linker: SocialIdentityLinker<U, C, P>,
    sessions: SessionManager<U, L>,
    otp: OtpService<C, N>,
    two_factor: TwoFactorService<U, C>,
    creds_repo: Arc<C>,
    config: Arc<AuthConfig>,
}

impl<U, C, L, P, N> SocialSignInUseCase<U, C, L, P, N>
where
    U: UserRepository,
    C: CredentialsRepository,
    L: AuthLogRepository,
    P: ProviderLinkRepository,
    N: Notifier + Sync,
{
    pub fn new(
        user_repo: Arc<U>,
        creds_repo: Arc<C>,
        log_repo: Arc<L>,
        link_repo: Arc<P>,
        notifier: Arc<N>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            linker: SocialIdentityLinker::new(
                user_repo.clone(),
                creds_repo.clone(),
                link_repo,
                config.clone(),
            ),
            sessions: SessionManager::new(user_repo.clone(), log_repo, config.clone()),
            otp: OtpService::new(creds_repo.clone(), notifier, config.clone()),
            two_factor: TwoFactorService::new(user_repo, creds_repo.clone(), config.clone()),
            creds_repo,
            config,
        }
    }

    pub async fn execute(
        &self,
        business_id: BusinessId,
        provider: Provider,
        assertion: ProviderAssertion,
        two_factor_code: Option<String>,
        client: &ClientInfo,
    ) -> AuthResult<SignInOutcome> {
        let user = self
            .linker
            .resolve(&business_id, provider, &assertion)
            .await?
            .ok_or(AuthError::SocialRegistrationDisabled)?;

        if !user.is_active() {
            return Err(AuthError::InvalidCredentials);
        }

        let settings = Settings::resolve(&self.config.defaults, user.settings.as_ref());
        if !settings.social_logins.enabled(provider) {
            return Err(AuthError::SocialRegistrationDisabled);
        }

        let mut user = user;
        let mut credentials = self
            .creds_repo
            .find_by_user_id(&user.user_id)
            .await?
            .ok_or_else(|| AuthError::Internal("Credentials not found".to_string()))?;

        // Same branch point as password sign-in.
        if !user.has_verified_email() {
            self.otp
                .issue(&user, &mut credentials, OtpPurpose::VerifyEmail)
                .await?;
            return Ok(SignInOutcome::EmailVerificationRequired {
                public_id: user.public_id.to_string(),
            });
        }

        if credentials.requires_2fa() {
            match two_factor_code.as_deref() {
                None => {
                    return Ok(SignInOutcome::TwoFactorRequired {
                        public_id: user.public_id.to_string(),
                    });
                }
                Some(code) => {
                    if !self.two_factor.verify(&user, &credentials, code).await? {
                        return Err(AuthError::TwoFactorInvalid);
                    }
                }
            }
        }

        let session = self
            .sessions
            .complete_login(&mut user, &settings, client, LoginMethod::Social(provider))
            .await?;

        Ok(SignInOutcome::Success {
            public_id: user.public_id.to_string(),
            session,
            remember_me: false,
        })
    }
}
