//! Domain Layer
//!
//! Entities, value objects, settings resolution, and repository traits.

pub mod entity;
pub mod repository;
pub mod settings;
pub mod value_object;

// Re-exports
pub use entity::{
    auth_log::{AuthLog, LoginMethod},
    credentials::Credentials,
    provider_link::ProviderLink,
    user::User,
};
pub use repository::{
    AuthLogRepository, CredentialsRepository, ProviderLinkRepository, UserRepository,
};
pub use settings::Settings;
