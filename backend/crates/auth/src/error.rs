//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system. Every use case returns these; the
//! presentation boundary converts them to the uniform response shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Redirect hint attached to `PasswordExpired` responses.
pub const PASSWORD_RESET_PATH: &str = "/auth/password/reset";

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed input (bad email, bad provider name, weak password)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Wrong username/password or inactive account; deliberately generic
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Too many attempts from this origin
    #[error("Too many login attempts, please try again later")]
    RateLimited,

    /// Account is temporarily locked after repeated failures
    #[error("Account is temporarily locked")]
    AccountLocked,

    /// Password rotation policy exceeded; soft outcome with a reset redirect
    #[error("Password has expired and must be reset")]
    PasswordExpired,

    /// One-time code missing, wrong, or expired (indistinguishable by design)
    #[error("Verification code is invalid or has expired")]
    OtpInvalidOrExpired,

    /// TOTP/recovery code rejected
    #[error("Invalid two-factor authentication code")]
    TwoFactorInvalid,

    /// 2FA operation attempted before enrollment
    #[error("Two-factor authentication not set up")]
    TwoFactorNotSetup,

    /// Social sign-in for an unknown identity while provisioning is off
    #[error("Registration via this provider is disabled")]
    SocialRegistrationDisabled,

    /// Concurrent-session limit reached; the new session was terminated
    #[error("Maximum number of active sessions reached")]
    SessionLimitExceeded,

    /// Session token missing, malformed, or no longer active
    #[error("Session not found or expired")]
    SessionInvalid,

    /// User name already exists within the tenant
    #[error("User name already exists")]
    UserNameTaken,

    /// Email already exists within the tenant
    #[error("Email address already in use")]
    EmailTaken,

    /// User not found (internal flows only; never surfaced on login paths)
    #[error("User not found")]
    UserNotFound,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Cache error
    #[error("Cache error: {0}")]
    Cache(#[from] platform::cache::CacheError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) => ErrorKind::BadRequest,
            AuthError::InvalidCredentials
            | AuthError::OtpInvalidOrExpired
            | AuthError::TwoFactorInvalid
            | AuthError::SessionInvalid => ErrorKind::Unauthorized,
            AuthError::RateLimited => ErrorKind::TooManyRequests,
            AuthError::AccountLocked => ErrorKind::Locked,
            AuthError::PasswordExpired => ErrorKind::UnprocessableEntity,
            AuthError::TwoFactorNotSetup => ErrorKind::PreconditionFailed,
            AuthError::SocialRegistrationDisabled => ErrorKind::Forbidden,
            AuthError::SessionLimitExceeded
            | AuthError::UserNameTaken
            | AuthError::EmailTaken => ErrorKind::Conflict,
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::Database(_) | AuthError::Cache(_) | AuthError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Convert to AppError, attaching redirect hints and source detail.
    pub fn to_app_error(self) -> AppError {
        let kind = self.kind();
        match self {
            AuthError::PasswordExpired => {
                AppError::new(kind, self.to_string()).with_redirect(PASSWORD_RESET_PATH)
            }
            // Storage failures surface a generic message; the source is only
            // echoed under the diagnostics flag.
            AuthError::Database(e) => {
                AppError::new(kind, "An internal error occurred").with_source(e)
            }
            AuthError::Cache(e) => {
                AppError::new(kind, "An internal error occurred").with_source(e)
            }
            AuthError::Internal(msg) => {
                AppError::new(kind, "An internal error occurred")
                    .with_source(std::io::Error::other(msg))
            }
            other => AppError::new(kind, other.to_string()),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Cache(e) => {
                tracing::error!(error = %e, "Auth cache error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::AccountLocked => {
                tracing::warn!("Login attempt on locked account");
            }
            AuthError::RateLimited => {
                tracing::warn!("Rate limited login attempt");
            }
            AuthError::SessionLimitExceeded => {
                tracing::warn!("Concurrent session limit reached");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Validation(err.message().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AuthError::RateLimited.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(AuthError::AccountLocked.status_code(), StatusCode::LOCKED);
        assert_eq!(
            AuthError::SessionLimitExceeded.status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_password_expired_carries_redirect() {
        let app = AuthError::PasswordExpired.to_app_error();
        assert_eq!(app.redirect(), Some(PASSWORD_RESET_PATH));
        assert_eq!(app.status_code(), 422);
    }

    #[test]
    fn test_storage_failure_message_is_generic() {
        let app = AuthError::Internal("pool exploded".to_string()).to_app_error();
        assert_eq!(app.message(), "An internal error occurred");
        assert_eq!(app.source_detail().as_deref(), Some("pool exploded"));
    }
}
