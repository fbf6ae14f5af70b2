//! End-to-end flow tests over the in-memory repositories.
//!
//! Covers the login pipeline (rate limiting, lockout, password age), the
//! email-verification and two-factor branches, social resolution precedence,
//! the session concurrency limit, and the compensation paths.

use std::net::IpAddr;
use std::sync::Arc;

use auth::application::{
    AuthConfig, CheckSessionUseCase, OtpPurpose, OtpService, PasswordResetUseCase, RegisterInput,
    RegisterUseCase, SignInInput, SignInOutcome, SignInUseCase, TwoFactorService,
    VerifyEmailUseCase, social::{ProviderAssertion, SocialIdentityLinker},
};
use auth::domain::repository::{
    AuthLogRepository, CredentialsRepository, UserRepository,
};
use auth::domain::settings::{Settings, SocialLogins};
use auth::domain::value_object::{ids::BusinessId, provider::Provider};
use auth::error::AuthError;
use auth::infra::memory::MemoryAuthRepository;
use platform::cache::MemoryCache;
use platform::client::ClientInfo;
use platform::notify::LogNotifier;
use platform::rate_limit::RateLimiter;

const PASSWORD: &str = "correct horse battery";

struct TestEnv {
    repo: Arc<MemoryAuthRepository>,
    limiter: Arc<RateLimiter<MemoryCache>>,
    notifier: Arc<LogNotifier>,
    config: Arc<AuthConfig>,
    business_id: BusinessId,
}

impl TestEnv {
    fn new() -> Self {
        Self::with_defaults(Settings::default())
    }

    fn with_defaults(defaults: Settings) -> Self {
        let config = AuthConfig {
            defaults,
            ..AuthConfig::development()
        };
        Self {
            repo: Arc::new(MemoryAuthRepository::new()),
            limiter: Arc::new(RateLimiter::new(MemoryCache::new(), "login")),
            notifier: Arc::new(LogNotifier),
            config: Arc::new(config),
            business_id: BusinessId::new(),
        }
    }

    fn sign_in_use_case(
        &self,
    ) -> SignInUseCase<
        MemoryAuthRepository,
        MemoryAuthRepository,
        MemoryAuthRepository,
        MemoryCache,
        LogNotifier,
    > {
        SignInUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.repo.clone(),
            self.limiter.clone(),
            self.notifier.clone(),
            self.config.clone(),
        )
    }

    fn otp_service(&self) -> OtpService<MemoryAuthRepository, LogNotifier> {
        OtpService::new(self.repo.clone(), self.notifier.clone(), self.config.clone())
    }

    fn two_factor(&self) -> TwoFactorService<MemoryAuthRepository, MemoryAuthRepository> {
        TwoFactorService::new(self.repo.clone(), self.repo.clone(), self.config.clone())
    }

    /// Register a user and mark the email verified, so sign-in tests start
    /// from a fully usable account.
    async fn create_verified_user(&self, user_name: &str, email: &str) -> auth::models::User {
        let register = RegisterUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.notifier.clone(),
            self.config.clone(),
        );
        register
            .execute(RegisterInput {
                business_id: self.business_id,
                user_name: user_name.to_string(),
                email: email.to_string(),
                password: PASSWORD.to_string(),
            })
            .await
            .expect("registration should succeed");

        let mut user = self
            .repo
            .find_by_email(
                &self.business_id,
                &auth::domain::value_object::email::Email::new(email).unwrap(),
            )
            .await
            .unwrap()
            .expect("registered user exists");
        user.mark_email_verified();
        UserRepository::update(self.repo.as_ref(), &user)
            .await
            .unwrap();
        user
    }

    fn sign_in_input(&self, identifier: &str, password: &str) -> SignInInput {
        SignInInput {
            business_id: self.business_id,
            identifier: identifier.to_string(),
            password: password.to_string(),
            remember_me: false,
            two_factor_code: None,
        }
    }
}

fn client(ip: &str) -> ClientInfo {
    ClientInfo {
        ip: Some(ip.parse::<IpAddr>().unwrap()),
        user_agent: Some("Mozilla/5.0 Test Browser".to_string()),
    }
}

// ============================================================================
// Credential gate + session establishment
// ============================================================================

#[tokio::test]
async fn sign_in_success_establishes_session() {
    let env = TestEnv::new();
    let user = env.create_verified_user("alice", "alice@example.com").await;

    let outcome = env
        .sign_in_use_case()
        .execute(env.sign_in_input("alice", PASSWORD), &client("10.0.0.1"))
        .await
        .expect("sign in should succeed");

    let SignInOutcome::Success { session, .. } = outcome else {
        panic!("expected a successful sign in");
    };

    // User row carries the token, and the audit row is online.
    let stored = env.repo.find_by_id(&user.user_id).await.unwrap().unwrap();
    assert_eq!(stored.session_token.as_deref(), Some(session.token.as_str()));
    assert_eq!(env.repo.count_online(&user.user_id).await.unwrap(), 1);

    let log = env
        .repo
        .find_by_token(session.token.as_str())
        .await
        .unwrap()
        .expect("audit row exists");
    assert!(log.online);
    assert_eq!(log.device.as_deref(), Some("Mozilla/5.0 Test Browser"));
}

#[tokio::test]
async fn unknown_user_and_wrong_password_are_indistinguishable() {
    let env = TestEnv::new();
    env.create_verified_user("alice", "alice@example.com").await;

    let unknown = env
        .sign_in_use_case()
        .execute(env.sign_in_input("nobody", PASSWORD), &client("10.0.0.1"))
        .await
        .unwrap_err();
    let wrong = env
        .sign_in_use_case()
        .execute(env.sign_in_input("alice", "wrong password 1"), &client("10.0.0.2"))
        .await
        .unwrap_err();

    assert!(matches!(unknown, AuthError::InvalidCredentials));
    assert!(matches!(wrong, AuthError::InvalidCredentials));
}

// ============================================================================
// Lockout
// ============================================================================

#[tokio::test]
async fn account_locks_after_limit_failures_even_for_correct_password() {
    let env = TestEnv::new();
    let user = env.create_verified_user("alice", "alice@example.com").await;

    for attempt in 0..3 {
        let err = env
            .sign_in_use_case()
            .execute(
                env.sign_in_input("alice", "wrong password 1"),
                // Distinct origins keep the rate limiter out of this test.
                &client(&format!("10.0.1.{}", attempt)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    // 4th attempt with the CORRECT password is still rejected as locked.
    let err = env
        .sign_in_use_case()
        .execute(env.sign_in_input("alice", PASSWORD), &client("10.0.1.9"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::AccountLocked));

    // Once the lockout duration has elapsed, the account is attemptable
    // again and success resets the counter.
    let mut creds = env
        .repo
        .find_by_user_id(&user.user_id)
        .await
        .unwrap()
        .unwrap();
    creds.locked_at = Some(chrono::Utc::now() - chrono::Duration::minutes(6));
    CredentialsRepository::update(env.repo.as_ref(), &creds)
        .await
        .unwrap();

    let outcome = env
        .sign_in_use_case()
        .execute(env.sign_in_input("alice", PASSWORD), &client("10.0.1.9"))
        .await
        .expect("login after lockout expiry should succeed");
    assert!(matches!(outcome, SignInOutcome::Success { .. }));

    let creds = env
        .repo
        .find_by_user_id(&user.user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(creds.failed_login_count, 0);
    assert!(creds.locked_at.is_none());
}

// ============================================================================
// Rate limiting
// ============================================================================

#[tokio::test]
async fn sixth_attempt_from_one_origin_is_rate_limited() {
    let env = TestEnv::new();
    env.create_verified_user("alice", "alice@example.com").await;

    // 5 failed attempts from the same origin fill the window.
    for _ in 0..5 {
        let err = env
            .sign_in_use_case()
            .execute(env.sign_in_input("alice", "wrong password 1"), &client("10.0.0.7"))
            .await
            .unwrap_err();
        // The account locks after 3, but that is not the limiter's concern.
        assert!(matches!(
            err,
            AuthError::InvalidCredentials | AuthError::AccountLocked
        ));
    }

    // 6th attempt is rejected before credentials are even looked at.
    let err = env
        .sign_in_use_case()
        .execute(env.sign_in_input("alice", PASSWORD), &client("10.0.0.7"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::RateLimited));

    // A different origin is unaffected.
    let err = env
        .sign_in_use_case()
        .execute(env.sign_in_input("alice", "wrong password 1"), &client("10.0.0.8"))
        .await
        .unwrap_err();
    assert!(!matches!(err, AuthError::RateLimited));
}

#[tokio::test]
async fn successful_login_clears_the_origin_counter() {
    let env = TestEnv::new();
    env.create_verified_user("alice", "alice@example.com").await;

    for _ in 0..2 {
        let _ = env
            .sign_in_use_case()
            .execute(env.sign_in_input("alice", "wrong password 1"), &client("10.0.0.7"))
            .await;
    }

    let outcome = env
        .sign_in_use_case()
        .execute(env.sign_in_input("alice", PASSWORD), &client("10.0.0.7"))
        .await;
    // Two failures lie below the lockout limit of 3, so this succeeds and
    // clears the origin counter.
    assert!(matches!(outcome, Ok(SignInOutcome::Success { .. })));

    // The full window is available again.
    for _ in 0..4 {
        let err = env
            .sign_in_use_case()
            .execute(env.sign_in_input("alice", "wrong password 1"), &client("10.0.0.7"))
            .await
            .unwrap_err();
        assert!(!matches!(err, AuthError::RateLimited));
    }
}

// ============================================================================
// Email verification branch
// ============================================================================

#[tokio::test]
async fn unverified_email_detours_to_otp() {
    let env = TestEnv::new();
    let register = RegisterUseCase::new(
        env.repo.clone(),
        env.repo.clone(),
        env.notifier.clone(),
        env.config.clone(),
    );
    register
        .execute(RegisterInput {
            business_id: env.business_id,
            user_name: "bob".to_string(),
            email: "bob@example.com".to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap();

    let outcome = env
        .sign_in_use_case()
        .execute(env.sign_in_input("bob", PASSWORD), &client("10.0.0.1"))
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        SignInOutcome::EmailVerificationRequired { .. }
    ));

    // A code is pending and no session exists.
    let user = env
        .repo
        .find_by_user_name(
            &env.business_id,
            &auth::domain::value_object::user_name::UserName::new("bob").unwrap(),
        )
        .await
        .unwrap()
        .unwrap();
    let creds = env
        .repo
        .find_by_user_id(&user.user_id)
        .await
        .unwrap()
        .unwrap();
    assert!(creds.otp_hash.is_some());
    assert_eq!(env.repo.count_online(&user.user_id).await.unwrap(), 0);
}

#[tokio::test]
async fn verify_email_with_code_completes_login() {
    let env = TestEnv::new();
    let register = RegisterUseCase::new(
        env.repo.clone(),
        env.repo.clone(),
        env.notifier.clone(),
        env.config.clone(),
    );
    register
        .execute(RegisterInput {
            business_id: env.business_id,
            user_name: "bob".to_string(),
            email: "bob@example.com".to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap();

    // Re-issue to get the plaintext code in hand.
    let user = env
        .repo
        .find_by_email(
            &env.business_id,
            &auth::domain::value_object::email::Email::new("bob@example.com").unwrap(),
        )
        .await
        .unwrap()
        .unwrap();
    let mut creds = env
        .repo
        .find_by_user_id(&user.user_id)
        .await
        .unwrap()
        .unwrap();
    let code = env
        .otp_service()
        .issue(&user, &mut creds, OtpPurpose::VerifyEmail)
        .await
        .unwrap();
    assert_eq!(code.as_str().len(), 6);

    let verify = VerifyEmailUseCase::new(
        env.repo.clone(),
        env.repo.clone(),
        env.repo.clone(),
        env.notifier.clone(),
        env.config.clone(),
    );
    let output = verify
        .execute(env.business_id, "bob@example.com", code.as_str(), &client("10.0.0.1"))
        .await
        .expect("verification should establish the session");

    let user = env.repo.find_by_id(&user.user_id).await.unwrap().unwrap();
    assert!(user.has_verified_email());
    assert_eq!(
        user.session_token.as_deref(),
        Some(output.session.token.as_str())
    );

    // The code was consumed; replaying it fails.
    let err = verify
        .execute(env.business_id, "bob@example.com", code.as_str(), &client("10.0.0.1"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::OtpInvalidOrExpired));
}

#[tokio::test]
async fn otp_fails_closed_when_expired_or_cleared() {
    let env = TestEnv::new();
    let user = env.create_verified_user("alice", "alice@example.com").await;
    let mut creds = env
        .repo
        .find_by_user_id(&user.user_id)
        .await
        .unwrap()
        .unwrap();

    let otp = env.otp_service();
    let code = otp
        .issue(&user, &mut creds, OtpPurpose::PasswordReset)
        .await
        .unwrap();

    // Verification is a side-effect-free read: it holds until cleared.
    assert!(otp.verify(&creds, code.as_str()));
    assert!(otp.verify(&creds, code.as_str()));
    assert!(!otp.verify(&creds, "000000"));

    // Expired codes fail without distinction.
    creds.otp_expires_at = Some(chrono::Utc::now() - chrono::Duration::minutes(1));
    assert!(!otp.verify(&creds, code.as_str()));

    // Cleared codes never verify again.
    creds.otp_expires_at = Some(chrono::Utc::now() + chrono::Duration::minutes(5));
    otp.clear(&mut creds).await.unwrap();
    assert!(!otp.verify(&creds, code.as_str()));
}

// ============================================================================
// Two-factor branch
// ============================================================================

async fn enroll_two_factor(env: &TestEnv, user: &auth::models::User) -> Vec<String> {
    let service = env.two_factor();
    service
        .setup(&user.business_id, &user.public_id)
        .await
        .unwrap();

    let creds = env
        .repo
        .find_by_user_id(&user.user_id)
        .await
        .unwrap()
        .unwrap();
    let secret = creds.totp_secret.clone().unwrap();
    let code = secret.generate_current(user.user_name.as_str()).unwrap();

    service
        .confirm(&user.business_id, &user.public_id, &code)
        .await
        .unwrap()
}

#[tokio::test]
async fn two_factor_requires_and_accepts_totp() {
    let env = TestEnv::new();
    let user = env.create_verified_user("alice", "alice@example.com").await;
    enroll_two_factor(&env, &user).await;

    // Without a code the branch stops and asks for one.
    let outcome = env
        .sign_in_use_case()
        .execute(env.sign_in_input("alice", PASSWORD), &client("10.0.0.1"))
        .await
        .unwrap();
    assert!(matches!(outcome, SignInOutcome::TwoFactorRequired { .. }));
    assert_eq!(env.repo.count_online(&user.user_id).await.unwrap(), 0);

    // A wrong code is rejected.
    let mut input = env.sign_in_input("alice", PASSWORD);
    input.two_factor_code = Some("000000".to_string());
    let err = env
        .sign_in_use_case()
        .execute(input, &client("10.0.0.2"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TwoFactorInvalid));

    // The current TOTP code passes.
    let creds = env
        .repo
        .find_by_user_id(&user.user_id)
        .await
        .unwrap()
        .unwrap();
    let code = creds
        .totp_secret
        .unwrap()
        .generate_current(user.user_name.as_str())
        .unwrap();
    let mut input = env.sign_in_input("alice", PASSWORD);
    input.two_factor_code = Some(code);
    let outcome = env
        .sign_in_use_case()
        .execute(input, &client("10.0.0.3"))
        .await
        .unwrap();
    assert!(matches!(outcome, SignInOutcome::Success { .. }));
}

#[tokio::test]
async fn recovery_code_verifies_at_most_once() {
    let env = TestEnv::new();
    let user = env.create_verified_user("alice", "alice@example.com").await;
    let recovery_codes = enroll_two_factor(&env, &user).await;
    let code = recovery_codes[0].clone();

    let mut input = env.sign_in_input("alice", PASSWORD);
    input.two_factor_code = Some(code.clone());
    let outcome = env
        .sign_in_use_case()
        .execute(input, &client("10.0.0.1"))
        .await
        .unwrap();
    assert!(matches!(outcome, SignInOutcome::Success { .. }));

    // The same code is spent now.
    let mut input = env.sign_in_input("alice", PASSWORD);
    input.two_factor_code = Some(code);
    let err = env
        .sign_in_use_case()
        .execute(input, &client("10.0.0.2"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TwoFactorInvalid));

    // A different code still works.
    let mut input = env.sign_in_input("alice", PASSWORD);
    input.two_factor_code = Some(recovery_codes[1].clone());
    let outcome = env
        .sign_in_use_case()
        .execute(input, &client("10.0.0.3"))
        .await
        .unwrap();
    assert!(matches!(outcome, SignInOutcome::Success { .. }));
}

// ============================================================================
// Session concurrency limit
// ============================================================================

#[tokio::test]
async fn session_count_never_stabilizes_above_the_limit() {
    let env = TestEnv::new();
    let user = env.create_verified_user("alice", "alice@example.com").await;

    for i in 0..3 {
        let outcome = env
            .sign_in_use_case()
            .execute(env.sign_in_input("alice", PASSWORD), &client(&format!("10.0.2.{}", i)))
            .await
            .unwrap();
        assert!(matches!(outcome, SignInOutcome::Success { .. }));
    }
    assert_eq!(env.repo.count_online(&user.user_id).await.unwrap(), 3);

    // The 4th login authenticates but its session is terminated.
    let err = env
        .sign_in_use_case()
        .execute(env.sign_in_input("alice", PASSWORD), &client("10.0.2.9"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::SessionLimitExceeded));
    assert_eq!(env.repo.count_online(&user.user_id).await.unwrap(), 3);

    // The evicted login left no token behind.
    let stored = env.repo.find_by_id(&user.user_id).await.unwrap().unwrap();
    assert!(stored.session_token.is_none());
}

#[tokio::test]
async fn user_row_failure_aborts_before_any_session_exists() {
    let env = TestEnv::new();
    let user = env.create_verified_user("alice", "alice@example.com").await;

    env.repo.fail_next_user_update();
    let err = env
        .sign_in_use_case()
        .execute(env.sign_in_input("alice", PASSWORD), &client("10.0.0.1"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Internal(_)));

    // Nothing was written: no token, no audit row.
    let stored = env.repo.find_by_id(&user.user_id).await.unwrap().unwrap();
    assert!(stored.session_token.is_none());
    assert_eq!(env.repo.count_online(&user.user_id).await.unwrap(), 0);
}

#[tokio::test]
async fn auth_log_failure_invalidates_the_half_established_session() {
    let env = TestEnv::new();
    let user = env.create_verified_user("alice", "alice@example.com").await;

    env.repo.fail_next_log_insert();
    let err = env
        .sign_in_use_case()
        .execute(env.sign_in_input("alice", PASSWORD), &client("10.0.0.1"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Internal(_)));

    // Compensation: no token, no audit row, nothing observably logged in.
    let stored = env.repo.find_by_id(&user.user_id).await.unwrap().unwrap();
    assert!(stored.session_token.is_none());
    assert_eq!(env.repo.count_online(&user.user_id).await.unwrap(), 0);
}

// ============================================================================
// Session validation
// ============================================================================

#[tokio::test]
async fn idle_sessions_time_out_and_are_closed() {
    let env = TestEnv::new();
    let user = env.create_verified_user("alice", "alice@example.com").await;

    let outcome = env
        .sign_in_use_case()
        .execute(env.sign_in_input("alice", PASSWORD), &client("10.0.0.1"))
        .await
        .unwrap();
    let SignInOutcome::Success { session, .. } = outcome else {
        panic!("expected success");
    };

    let check = CheckSessionUseCase::new(env.repo.clone(), env.repo.clone(), env.config.clone());
    assert!(check.is_valid(session.token.as_str()).await);

    // Garbage and unsigned tokens never reach storage.
    assert!(!check.is_valid("garbage").await);

    // Push activity past the timeout; the session closes on next check.
    let mut log = env
        .repo
        .find_by_token(session.token.as_str())
        .await
        .unwrap()
        .unwrap();
    log.last_activity_at = chrono::Utc::now() - chrono::Duration::minutes(61);
    AuthLogRepository::update(env.repo.as_ref(), &log)
        .await
        .unwrap();

    assert!(!check.is_valid(session.token.as_str()).await);
    assert_eq!(env.repo.count_online(&user.user_id).await.unwrap(), 0);
}

// ============================================================================
// Social resolution precedence
// ============================================================================

fn assertion(subject: &str, email: &str) -> ProviderAssertion {
    ProviderAssertion {
        subject_id: subject.to_string(),
        email: email.to_string(),
        access_token: Some("access".to_string()),
        refresh_token: Some("refresh".to_string()),
        expires_at: None,
    }
}

fn linker(
    env: &TestEnv,
) -> SocialIdentityLinker<MemoryAuthRepository, MemoryAuthRepository, MemoryAuthRepository> {
    SocialIdentityLinker::new(
        env.repo.clone(),
        env.repo.clone(),
        env.repo.clone(),
        env.config.clone(),
    )
}

#[tokio::test]
async fn social_existing_link_wins_over_email_match() {
    let env = TestEnv::new();
    let linked = env.create_verified_user("alice", "alice@example.com").await;
    let other = env.create_verified_user("bob", "bob@example.com").await;

    // First resolution creates the link for alice via email match.
    let resolved = linker(&env)
        .resolve(&env.business_id, Provider::Google, &assertion("sub-1", "alice@example.com"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.user_id, linked.user_id);

    // Same subject now asserts bob's email: the link still wins, and bob's
    // address stays taken, so no email hijack either.
    let resolved = linker(&env)
        .resolve(&env.business_id, Provider::Google, &assertion("sub-1", "bob@example.com"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.user_id, linked.user_id);

    let alice = env.repo.find_by_id(&linked.user_id).await.unwrap().unwrap();
    assert_eq!(alice.email.as_str(), "alice@example.com");
    let bob = env.repo.find_by_id(&other.user_id).await.unwrap().unwrap();
    assert_eq!(bob.email.as_str(), "bob@example.com");
}

#[tokio::test]
async fn social_email_update_clears_verification_when_address_is_free() {
    let env = TestEnv::new();
    let user = env.create_verified_user("alice", "alice@example.com").await;

    linker(&env)
        .resolve(&env.business_id, Provider::Google, &assertion("sub-1", "alice@example.com"))
        .await
        .unwrap();

    // The provider now asserts a new, free address.
    let resolved = linker(&env)
        .resolve(&env.business_id, Provider::Google, &assertion("sub-1", "alice@corp.example.com"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.user_id, user.user_id);

    let stored = env.repo.find_by_id(&user.user_id).await.unwrap().unwrap();
    assert_eq!(stored.email.as_str(), "alice@corp.example.com");
    assert!(!stored.has_verified_email());
}

#[tokio::test]
async fn social_provisions_new_account_when_enabled() {
    let env = TestEnv::new();

    let resolved = linker(&env)
        .resolve(&env.business_id, Provider::Google, &assertion("sub-9", "carol@example.com"))
        .await
        .unwrap()
        .expect("provisioning enabled by default");

    assert_eq!(resolved.user_name.as_str(), "carol.google");
    assert!(resolved.has_verified_email());

    // The provider toggle landed in the user's settings override.
    let settings = Settings::resolve(&env.config.defaults, resolved.settings.as_ref());
    assert!(settings.social_logins.enabled(Provider::Google));

    // Credentials and link exist; the password is unusable but present.
    let creds = env
        .repo
        .find_by_user_id(&resolved.user_id)
        .await
        .unwrap()
        .expect("provisioned credentials exist");
    assert_eq!(creds.failed_login_count, 0);

    // A second provisioning for the same local part gets a suffix.
    let second = linker(&env)
        .resolve(&env.business_id, Provider::Google, &assertion("sub-10", "carol@other.example.com"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.user_name.as_str(), "carol.google1");
}

#[tokio::test]
async fn social_registration_disabled_never_creates_an_account() {
    let env = TestEnv::with_defaults(Settings {
        social_logins: SocialLogins {
            google: false,
            facebook: false,
            linkedin: false,
            twitter: false,
        },
        ..Settings::default()
    });

    let resolved = linker(&env)
        .resolve(&env.business_id, Provider::Google, &assertion("sub-9", "carol@example.com"))
        .await
        .unwrap();
    assert!(resolved.is_none());

    // No orphan rows either.
    let user = env
        .repo
        .find_by_email(
            &env.business_id,
            &auth::domain::value_object::email::Email::new("carol@example.com").unwrap(),
        )
        .await
        .unwrap();
    assert!(user.is_none());
}

// ============================================================================
// Password reset
// ============================================================================

#[tokio::test]
async fn password_reset_rotates_and_logs_out_all_devices() {
    let env = TestEnv::new();
    let user = env.create_verified_user("alice", "alice@example.com").await;

    // An active session that the reset should terminate.
    env.sign_in_use_case()
        .execute(env.sign_in_input("alice", PASSWORD), &client("10.0.0.1"))
        .await
        .unwrap();
    assert_eq!(env.repo.count_online(&user.user_id).await.unwrap(), 1);

    let reset = PasswordResetUseCase::new(
        env.repo.clone(),
        env.repo.clone(),
        env.repo.clone(),
        env.notifier.clone(),
        env.config.clone(),
    );

    // Unknown addresses get the same generic acknowledgement.
    reset
        .request(env.business_id, "nobody@example.com")
        .await
        .unwrap();

    // Grab the plaintext code by issuing directly.
    let mut creds = env
        .repo
        .find_by_user_id(&user.user_id)
        .await
        .unwrap()
        .unwrap();
    let code = env
        .otp_service()
        .issue(&user, &mut creds, OtpPurpose::PasswordReset)
        .await
        .unwrap();

    let new_password = "brand new passphrase 5";
    reset
        .reset(env.business_id, "alice@example.com", code.as_str(), new_password.to_string())
        .await
        .unwrap();

    // Every device is signed out and the tokens are gone.
    assert_eq!(env.repo.count_online(&user.user_id).await.unwrap(), 0);
    let stored = env.repo.find_by_id(&user.user_id).await.unwrap().unwrap();
    assert!(stored.session_token.is_none());

    // Old password no longer verifies; the new one does.
    let err = env
        .sign_in_use_case()
        .execute(env.sign_in_input("alice", PASSWORD), &client("10.0.0.2"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));

    let outcome = env
        .sign_in_use_case()
        .execute(env.sign_in_input("alice", new_password), &client("10.0.0.3"))
        .await
        .unwrap();
    assert!(matches!(outcome, SignInOutcome::Success { .. }));
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn registration_rejects_duplicates() {
    let env = TestEnv::new();
    env.create_verified_user("alice", "alice@example.com").await;

    let register = RegisterUseCase::new(
        env.repo.clone(),
        env.repo.clone(),
        env.notifier.clone(),
        env.config.clone(),
    );

    let err = register
        .execute(RegisterInput {
            business_id: env.business_id,
            user_name: "Alice".to_string(),
            email: "fresh@example.com".to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::UserNameTaken));

    let err = register
        .execute(RegisterInput {
            business_id: env.business_id,
            user_name: "fresh".to_string(),
            email: "alice@example.com".to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::EmailTaken));
}

#[tokio::test]
async fn same_name_in_another_tenant_is_fine() {
    let env = TestEnv::new();
    env.create_verified_user("alice", "alice@example.com").await;

    let register = RegisterUseCase::new(
        env.repo.clone(),
        env.repo.clone(),
        env.notifier.clone(),
        env.config.clone(),
    );

    let other_tenant = BusinessId::new();
    let output = register
        .execute(RegisterInput {
            business_id: other_tenant,
            user_name: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .expect("tenants are isolated");
    assert!(!output.public_id.is_empty());
}
