//! Auth Router

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use platform::cache::{CacheStore, MemoryCache};
use platform::notify::{LogNotifier, Notifier};
use platform::rate_limit::RateLimiter;

use crate::application::config::AuthConfig;
use crate::domain::repository::{
    AuthLogRepository, CredentialsRepository, ProviderLinkRepository, UserRepository,
};
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState};

/// Rate-limit key prefix for login attempts
const LOGIN_RATE_PREFIX: &str = "login";

/// Create the Auth router with the PostgreSQL repository, the in-memory
/// cache, and the logging notifier.
pub fn auth_router(repo: PgAuthRepository, config: AuthConfig) -> Router {
    auth_router_generic(
        repo,
        MemoryCache::new(),
        LogNotifier,
        config,
    )
}

/// Create an Auth router for any repository/cache/notifier implementation.
pub fn auth_router_generic<R, K, N>(repo: R, cache: K, notifier: N, config: AuthConfig) -> Router
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
    let state = AuthAppState {
        repo: Arc::new(repo),
        limiter: Arc::new(RateLimiter::new(cache, LOGIN_RATE_PREFIX)),
        notifier: Arc::new(notifier),
        config: Arc::new(config),
    };

    Router::new()
        .route("/register", post(handlers::register::<R, K, N>))
        .route("/signin", post(handlers::sign_in::<R, K, N>))
        .route("/verify-email", post(handlers::verify_email::<R, K, N>))
        .route("/otp/resend", post(handlers::resend_otp::<R, K, N>))
        .route("/password/forgot", post(handlers::forgot_password::<R, K, N>))
        .route("/password/reset", post(handlers::reset_password::<R, K, N>))
        .route("/social/signin", post(handlers::social_sign_in::<R, K, N>))
        .route("/signout", post(handlers::sign_out::<R, K, N>))
        .route("/signout/all", post(handlers::sign_out_all::<R, K, N>))
        .route("/status", get(handlers::session_status::<R, K, N>))
        .route("/sessions", get(handlers::session_list::<R, K, N>))
        .route("/totp/setup", post(handlers::totp_setup::<R, K, N>))
        .route("/totp/confirm", post(handlers::totp_confirm::<R, K, N>))
        .route("/totp/disable", post(handlers::totp_disable::<R, K, N>))
        .with_state(state)
}
