//! Sign In Use Case
//!
//! The full login pipeline: rate limiter, credential gate, the branch point
//! (email verification detour or two-factor check), and session
//! establishment.

use std::sync::Arc;

use platform::cache::CacheStore;
use platform::client::ClientInfo;
use platform::notify::Notifier;
use platform::rate_limit::{RateLimitDecision, RateLimiter};

use crate::application::config::AuthConfig;
use crate::application::credential_gate::CredentialGate;
use crate::application::otp::{OtpPurpose, OtpService};
use crate::application::session::{CompletedSession, SessionManager};
use crate::application::two_factor::TwoFactorService;
use crate::domain::entity::auth_log::LoginMethod;
use crate::domain::repository::{
    AuthLogRepository, CredentialsRepository, UserRepository,
};
use crate::domain::value_object::ids::BusinessId;
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    pub business_id: BusinessId,
    /// User name or email
    pub identifier: String,
    pub password: String,
    /// Remember me flag (extends the cookie lifetime)
    pub remember_me: bool,
    /// Second-factor code (TOTP or recovery), if already prompted
    pub two_factor_code: Option<String>,
}

/// Sign in outcome
#[derive(Debug)]
pub enum SignInOutcome {
    /// Session established
    Success {
        public_id: String,
        session: CompletedSession,
        remember_me: bool,
    },
    /// Credentials valid but the email is unverified; a fresh code was sent
    EmailVerificationRequired { public_id: String },
    /// Credentials valid but a second factor is needed
    TwoFactorRequired { public_id: String },
}

/// Sign in use case
pub struct SignInUseCase<U, C, L, K, N>
where
    U: UserRepository,
    C: CredentialsRepository,
    L: AuthLogRepository,
    K: CacheStore + Sync,
    N: Notifier + Sync,
{
    gate: CredentialGate<U, C>,
    sessions: SessionManager<U, L>,
    otp: OtpService<C, N>,
    two_factor: TwoFactorService<U, C>,
    limiter: Arc<RateLimiter<K>>,
    config: Arc<AuthConfig>,
}

impl<U, C, L, K, N> SignInUseCase<U, C, L, K, N>
where
    U: UserRepository,
    C: CredentialsRepository,
    L: AuthLogRepository,
    K: CacheStore + Sync,
    N: Notifier + Sync,
{
    pub fn new(
        user_repo: Arc<U>,
        creds_repo: Arc<C>,
        log_repo: Arc<L>,
        limiter: Arc<RateLimiter<K>>,
        notifier: Arc<N>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            gate: CredentialGate::new(user_repo.clone(), creds_repo.clone(), config.clone()),
            sessions: SessionManager::new(user_repo.clone(), log_repo, config.clone()),
            otp: OtpService::new(creds_repo.clone(), notifier, config.clone()),
            two_factor: TwoFactorService::new(user_repo, creds_repo, config.clone()),
            limiter,
            config,
        }
    }

    pub async fn execute(
        &self,
        input: SignInInput,
        client: &ClientInfo,
    ) -> AuthResult<SignInOutcome> {
        let origin = client.origin();
        let rate_config = self.config.defaults.rate_limit_config();

        // Rate limit first; a blocked origin never reaches the gate, and the
        // refreshed window extends the block under continued abuse.
        if self.limiter.check(&origin, &rate_config).await? == RateLimitDecision::Blocked {
            return Err(AuthError::RateLimited);
        }
        self.limiter.record_attempt(&origin, &rate_config).await?;

        let authenticated = self
            .gate
            .authenticate(&input.business_id, &input.identifier, &input.password)
            .await?;

        // Full credential success clears this origin's counter.
        self.limiter.clear(&origin).await?;

        let mut user = authenticated.user;
        let mut credentials = authenticated.credentials;
        let settings = authenticated.settings;

        // Branch point: unverified email detours through the OTP service.
        if !user.has_verified_email() {
            self.otp
                .issue(&user, &mut credentials, OtpPurpose::VerifyEmail)
                .await?;
            return Ok(SignInOutcome::EmailVerificationRequired {
                public_id: user.public_id.to_string(),
            });
        }

        // Branch point: enabled 2FA requires a second factor.
        if credentials.requires_2fa() {
            match input.two_factor_code.as_deref() {
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
            .complete_login(&mut user, &settings, client, LoginMethod::Normal)
            .await?;

        Ok(SignInOutcome::Success {
            public_id: user.public_id.to_string(),
            session,
            remember_me: input.remember_me,
        })
    }
}
