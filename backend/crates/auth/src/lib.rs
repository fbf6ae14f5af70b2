//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, settings resolution, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - PostgreSQL and in-memory repository implementations
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - Registration with email verification (6-digit one-time codes)
//! - Username/email + password sign-in with rate limiting and lockout
//! - Password rotation policy and OTP-based password reset
//! - TOTP 2FA with single-use recovery codes
//! - Social sign-in (google/facebook/linkedin/twitter) with account
//!   linking and optional self-provisioning
//! - Per-account concurrent-session limit over an auth log audit trail
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, optional application pepper
//! - Only OTP digests are persisted; codes expire after 10 minutes
//! - HMAC-signed session tokens; sessions idle out per tenant settings
//! - Failed-login lockout and per-origin login rate limiting
//! - All storage operations scoped by a business (tenant) identifier

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::memory::MemoryAuthRepository;
pub use infra::postgres::PgAuthRepository;
pub use presentation::router::{auth_router, auth_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::auth_log::*;
    pub use crate::domain::entity::credentials::*;
    pub use crate::domain::entity::provider_link::*;
    pub use crate::domain::entity::user::*;
    pub use crate::domain::settings::*;
    pub use crate::presentation::dto::*;
}
