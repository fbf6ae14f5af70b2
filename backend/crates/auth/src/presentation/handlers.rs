//! HTTP Handlers
//!
//! Thin boundary: extract tenant/client context, run the use case, translate
//! the outcome into the response shape and cookie operations. The session
//! cookie is only ever issued after `complete_login` succeeds.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use std::sync::Arc;

use platform::cache::CacheStore;
use platform::client::extract_client_info;
use platform::cookie;
use platform::notify::Notifier;
use platform::rate_limit::RateLimiter;

use crate::application::{
    ActiveSession, CheckSessionUseCase, CompletedSession, PasswordResetUseCase, RegisterInput,
    RegisterUseCase, SignInInput, SignInOutcome, SignInUseCase, SignOutUseCase,
    SocialSignInUseCase, TwoFactorService, VerifyEmailUseCase, config::AuthConfig,
    social::ProviderAssertion,
};
use crate::domain::repository::{
    AuthLogRepository, CredentialsRepository, ProviderLinkRepository, UserRepository,
};
use crate::domain::value_object::{ids::BusinessId, provider::Provider};
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    AcceptedResponse, ForgotPasswordRequest, RegisterRequest, RegisterResponse, ResendOtpRequest,
    ResetPasswordRequest, SessionEntry, SessionListResponse, SessionStatusResponse, SignInRequest,
    SignInResponse, SocialSignInRequest, TwoFactorConfirmRequest, TwoFactorConfirmResponse,
    TwoFactorDisableRequest, TwoFactorSetupResponse, VerifyEmailRequest,
};

/// Tenant header carrying the business identifier.
pub const BUSINESS_HEADER: &str = "x-business-id";

/// Shared state for auth handlers
pub struct AuthAppState<R, K, N>
where
    R: UserRepository
        + CredentialsRepository
        + AuthLogRepository
        + ProviderLinkRepository
        + Send
        + Sync
        + 'static,
    K: CacheStore + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub limiter: Arc<RateLimiter<K>>,
    pub notifier: Arc<N>,
    pub config: Arc<AuthConfig>,
}

impl<R, K, N> Clone for AuthAppState<R, K, N>
where
    R: UserRepository
        + CredentialsRepository
        + AuthLogRepository
        + ProviderLinkRepository
        + Send
        + Sync
        + 'static,
    K: CacheStore + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            limiter: self.limiter.clone(),
            notifier: self.notifier.clone(),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// Register
// ============================================================================

/// POST /api/auth/register
pub async fn register<R, K, N>(
    State(state): State<AuthAppState<R, K, N>>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<Json<RegisterResponse>>
where
    R: UserRepository
        + CredentialsRepository
        + AuthLogRepository
        + ProviderLinkRepository
        + Send
        + Sync
        + 'static,
    K: CacheStore + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let business_id = business_id_from_headers(&headers)?;

    let use_case = RegisterUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.notifier.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(RegisterInput {
            business_id,
            user_name: req.user_name,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(Json(RegisterResponse {
        public_id: output.public_id,
        verification_required: true,
    }))
}

// ============================================================================
// Sign In
// ============================================================================

/// POST /api/auth/signin
pub async fn sign_in<R, K, N>(
    State(state): State<AuthAppState<R, K, N>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<SignInRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository
        + CredentialsRepository
        + AuthLogRepository
        + ProviderLinkRepository
        + Send
        + Sync
        + 'static,
    K: CacheStore + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let business_id = business_id_from_headers(&headers)?;
    let client = extract_client_info(&headers, Some(addr.ip()));

    let use_case = SignInUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.limiter.clone(),
        state.notifier.clone(),
        state.config.clone(),
    );

    let outcome = use_case
        .execute(
            SignInInput {
                business_id,
                identifier: req.identifier,
                password: req.password,
                remember_me: req.remember_me,
                two_factor_code: req.two_factor_code,
            },
            &client,
        )
        .await?;

    Ok(sign_in_response(&state.config, outcome))
}

// ============================================================================
// Email verification
// ============================================================================

/// POST /api/auth/verify-email
pub async fn verify_email<R, K, N>(
    State(state): State<AuthAppState<R, K, N>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<VerifyEmailRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository
        + CredentialsRepository
        + AuthLogRepository
        + ProviderLinkRepository
        + Send
        + Sync
        + 'static,
    K: CacheStore + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let business_id = business_id_from_headers(&headers)?;
    let client = extract_client_info(&headers, Some(addr.ip()));

    let use_case = VerifyEmailUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.notifier.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(business_id, &req.email, &req.code, &client)
        .await?;

    let cookie = session_cookie(&state.config, &output.session, false);
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(SignInResponse {
            public_id: output.public_id,
            requires_2fa: false,
            requires_email_verification: false,
        }),
    ))
}

/// POST /api/auth/otp/resend
pub async fn resend_otp<R, K, N>(
    State(state): State<AuthAppState<R, K, N>>,
    headers: HeaderMap,
    Json(req): Json<ResendOtpRequest>,
) -> AuthResult<Json<AcceptedResponse>>
where
    R: UserRepository
        + CredentialsRepository
        + AuthLogRepository
        + ProviderLinkRepository
        + Send
        + Sync
        + 'static,
    K: CacheStore + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let business_id = business_id_from_headers(&headers)?;

    let use_case = VerifyEmailUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.notifier.clone(),
        state.config.clone(),
    );

    use_case.resend(business_id, &req.email).await?;
    Ok(Json(AcceptedResponse::new(
        "If the address is registered, a code has been sent",
    )))
}

// ============================================================================
// Password reset
// ============================================================================

/// POST /api/auth/password/forgot
pub async fn forgot_password<R, K, N>(
    State(state): State<AuthAppState<R, K, N>>,
    headers: HeaderMap,
    Json(req): Json<ForgotPasswordRequest>,
) -> AuthResult<Json<AcceptedResponse>>
where
    R: UserRepository
        + CredentialsRepository
        + AuthLogRepository
        + ProviderLinkRepository
        + Send
        + Sync
        + 'static,
    K: CacheStore + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let business_id = business_id_from_headers(&headers)?;

    let use_case = PasswordResetUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.notifier.clone(),
        state.config.clone(),
    );

    use_case.request(business_id, &req.email).await?;
    Ok(Json(AcceptedResponse::new(
        "If the address is registered, a reset code has been sent",
    )))
}

/// POST /api/auth/password/reset
pub async fn reset_password<R, K, N>(
    State(state): State<AuthAppState<R, K, N>>,
    headers: HeaderMap,
    Json(req): Json<ResetPasswordRequest>,
) -> AuthResult<Json<AcceptedResponse>>
where
    R: UserRepository
        + CredentialsRepository
        + AuthLogRepository
        + ProviderLinkRepository
        + Send
        + Sync
        + 'static,
    K: CacheStore + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let business_id = business_id_from_headers(&headers)?;

    let use_case = PasswordResetUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.notifier.clone(),
        state.config.clone(),
    );

    use_case
        .reset(business_id, &req.email, &req.code, req.new_password)
        .await?;
    Ok(Json(AcceptedResponse::new("Password has been reset")))
}

// ============================================================================
// Social sign in
// ============================================================================

/// POST /api/auth/social/signin
pub async fn social_sign_in<R, K, N>(
    State(state): State<AuthAppState<R, K, N>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<SocialSignInRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository
        + CredentialsRepository
        + AuthLogRepository
        + ProviderLinkRepository
        + Send
        + Sync
        + 'static,
    K: CacheStore + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let business_id = business_id_from_headers(&headers)?;
    let client = extract_client_info(&headers, Some(addr.ip()));

    let provider = Provider::parse(&req.provider)
        .map_err(|e| AuthError::Validation(e.message().to_string()))?;

    let assertion = ProviderAssertion {
        subject_id: req.subject_id,
        email: req.email,
        access_token: req.access_token,
        refresh_token: req.refresh_token,
        expires_at: req
            .expires_at
            .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0)),
    };

    let use_case = SocialSignInUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.notifier.clone(),
        state.config.clone(),
    );

    let outcome = use_case
        .execute(business_id, provider, assertion, req.two_factor_code, &client)
        .await?;

    Ok(sign_in_response(&state.config, outcome))
}

// ============================================================================
// Sign out
// ============================================================================

/// POST /api/auth/signout
pub async fn sign_out<R, K, N>(
    State(state): State<AuthAppState<R, K, N>>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository
        + CredentialsRepository
        + AuthLogRepository
        + ProviderLinkRepository
        + Send
        + Sync
        + 'static,
    K: CacheStore + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    if let Some(token) = session_cookie_value(&headers, &state.config) {
        let use_case =
            SignOutUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());
        // Clear the cookie regardless of what storage says.
        let _ = use_case.execute(&token).await;
    }

    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_cookie(&state.config))],
    ))
}

/// POST /api/auth/signout/all
pub async fn sign_out_all<R, K, N>(
    State(state): State<AuthAppState<R, K, N>>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository
        + CredentialsRepository
        + AuthLogRepository
        + ProviderLinkRepository
        + Send
        + Sync
        + 'static,
    K: CacheStore + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let token =
        session_cookie_value(&headers, &state.config).ok_or(AuthError::SessionInvalid)?;

    let use_case =
        SignOutUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());
    use_case.execute_all(&token).await?;

    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_cookie(&state.config))],
    ))
}

// ============================================================================
// Session status / device list
// ============================================================================

/// GET /api/auth/status
pub async fn session_status<R, K, N>(
    State(state): State<AuthAppState<R, K, N>>,
    headers: HeaderMap,
) -> AuthResult<Json<SessionStatusResponse>>
where
    R: UserRepository
        + CredentialsRepository
        + AuthLogRepository
        + ProviderLinkRepository
        + Send
        + Sync
        + 'static,
    K: CacheStore + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    match current_session(&state, &headers).await {
        Ok(session) => Ok(Json(SessionStatusResponse {
            authenticated: true,
            public_id: Some(session.user.public_id.to_string()),
            user_name: Some(session.user.user_name.as_str().to_string()),
        })),
        Err(_) => Ok(Json(SessionStatusResponse {
            authenticated: false,
            public_id: None,
            user_name: None,
        })),
    }
}

/// GET /api/auth/sessions
pub async fn session_list<R, K, N>(
    State(state): State<AuthAppState<R, K, N>>,
    headers: HeaderMap,
) -> AuthResult<Json<SessionListResponse>>
where
    R: UserRepository
        + CredentialsRepository
        + AuthLogRepository
        + ProviderLinkRepository
        + Send
        + Sync
        + 'static,
    K: CacheStore + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let session = current_session(&state, &headers).await?;

    let logs = state.repo.find_online_by_user(&session.user.user_id).await?;
    let sessions = logs
        .iter()
        .map(|log| SessionEntry {
            device: log.device.clone(),
            ip_address: log.ip_address.clone(),
            method: log.method.as_str().to_string(),
            logged_in_at: log.logged_in_at.timestamp_millis(),
            last_activity_at: log.last_activity_at.timestamp_millis(),
            is_current: log.session_token == session.log.session_token,
        })
        .collect();

    Ok(Json(SessionListResponse { sessions }))
}

// ============================================================================
// Two-factor enrollment (requires authentication)
// ============================================================================

/// POST /api/auth/totp/setup
pub async fn totp_setup<R, K, N>(
    State(state): State<AuthAppState<R, K, N>>,
    headers: HeaderMap,
) -> AuthResult<Json<TwoFactorSetupResponse>>
where
    R: UserRepository
        + CredentialsRepository
        + AuthLogRepository
        + ProviderLinkRepository
        + Send
        + Sync
        + 'static,
    K: CacheStore + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let session = current_session(&state, &headers).await?;

    let service =
        TwoFactorService::new(state.repo.clone(), state.repo.clone(), state.config.clone());
    let output = service
        .setup(&session.user.business_id, &session.user.public_id)
        .await?;

    Ok(Json(TwoFactorSetupResponse {
        qr_code: output.qr_code_base64,
        secret: output.secret,
        otpauth_url: output.otpauth_url,
    }))
}

/// POST /api/auth/totp/confirm
pub async fn totp_confirm<R, K, N>(
    State(state): State<AuthAppState<R, K, N>>,
    headers: HeaderMap,
    Json(req): Json<TwoFactorConfirmRequest>,
) -> AuthResult<Json<TwoFactorConfirmResponse>>
where
    R: UserRepository
        + CredentialsRepository
        + AuthLogRepository
        + ProviderLinkRepository
        + Send
        + Sync
        + 'static,
    K: CacheStore + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let session = current_session(&state, &headers).await?;

    let service =
        TwoFactorService::new(state.repo.clone(), state.repo.clone(), state.config.clone());
    let recovery_codes = service
        .confirm(&session.user.business_id, &session.user.public_id, &req.code)
        .await?;

    Ok(Json(TwoFactorConfirmResponse { recovery_codes }))
}

/// POST /api/auth/totp/disable
pub async fn totp_disable<R, K, N>(
    State(state): State<AuthAppState<R, K, N>>,
    headers: HeaderMap,
    Json(req): Json<TwoFactorDisableRequest>,
) -> AuthResult<StatusCode>
where
    R: UserRepository
        + CredentialsRepository
        + AuthLogRepository
        + ProviderLinkRepository
        + Send
        + Sync
        + 'static,
    K: CacheStore + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let session = current_session(&state, &headers).await?;

    let service =
        TwoFactorService::new(state.repo.clone(), state.repo.clone(), state.config.clone());
    service
        .disable(&session.user.business_id, &session.user.public_id, &req.code)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Helper Functions
// ============================================================================

fn business_id_from_headers(headers: &HeaderMap) -> AuthResult<BusinessId> {
    headers
        .get(BUSINESS_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<BusinessId>().ok())
        .ok_or_else(|| AuthError::Validation("Missing or invalid tenant header".to_string()))
}

fn session_cookie_value(headers: &HeaderMap, config: &AuthConfig) -> Option<String> {
    cookie::extract_cookie(headers, &config.session_cookie_name)
}

async fn current_session<R, K, N>(
    state: &AuthAppState<R, K, N>,
    headers: &HeaderMap,
) -> AuthResult<ActiveSession>
where
    R: UserRepository
        + CredentialsRepository
        + AuthLogRepository
        + ProviderLinkRepository
        + Send
        + Sync
        + 'static,
    K: CacheStore + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let token =
        session_cookie_value(headers, &state.config).ok_or(AuthError::SessionInvalid)?;

    let use_case =
        CheckSessionUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());
    use_case.execute(&token).await
}

/// Render a sign-in outcome: only `Success` issues the cookie.
fn sign_in_response(config: &AuthConfig, outcome: SignInOutcome) -> axum::response::Response {
    match outcome {
        SignInOutcome::Success {
            public_id,
            session,
            remember_me,
        } => {
            let cookie = session_cookie(config, &session, remember_me);
            (
                StatusCode::OK,
                [(header::SET_COOKIE, cookie)],
                Json(SignInResponse {
                    public_id,
                    requires_2fa: false,
                    requires_email_verification: false,
                }),
            )
                .into_response()
        }
        SignInOutcome::TwoFactorRequired { public_id } => (
            StatusCode::OK,
            Json(SignInResponse {
                public_id,
                requires_2fa: true,
                requires_email_verification: false,
            }),
        )
            .into_response(),
        SignInOutcome::EmailVerificationRequired { public_id } => (
            StatusCode::OK,
            Json(SignInResponse {
                public_id,
                requires_2fa: false,
                requires_email_verification: true,
            }),
        )
            .into_response(),
    }
}

/// Session cookie with the timeout as its expiry marker.
fn session_cookie(config: &AuthConfig, session: &CompletedSession, remember_me: bool) -> String {
    let max_age = if remember_me {
        config.remember_ttl.as_secs()
    } else {
        session.timeout.as_secs()
    };

    let cookie_config = cookie::CookieConfig {
        name: config.session_cookie_name.clone(),
        secure: config.cookie_secure,
        http_only: true,
        same_site: config.cookie_same_site,
        path: "/".to_string(),
        max_age_secs: Some(max_age as i64),
    };

    cookie_config.build_set_cookie(session.token.as_str())
}

fn clear_cookie(config: &AuthConfig) -> String {
    let cookie_config = cookie::CookieConfig {
        name: config.session_cookie_name.clone(),
        secure: config.cookie_secure,
        http_only: true,
        same_site: config.cookie_same_site,
        path: "/".to_string(),
        max_age_secs: None,
    };

    cookie_config.build_delete_cookie()
}
