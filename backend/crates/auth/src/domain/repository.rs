//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the
//! infrastructure layer; all lookups are tenant-scoped.

use crate::domain::entity::{
    auth_log::AuthLog, credentials::Credentials, provider_link::ProviderLink, user::User,
};
use crate::domain::value_object::{
    email::Email,
    ids::{BusinessId, UserId},
    provider::Provider,
    public_id::PublicId,
    user_name::UserName,
};
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Create a new user
    async fn create(&self, user: &User) -> AuthResult<()>;

    /// Find user by internal ID
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    /// Find user by public ID within a tenant
    async fn find_by_public_id(
        &self,
        business_id: &BusinessId,
        public_id: &PublicId,
    ) -> AuthResult<Option<User>>;

    /// Find user by canonical user name within a tenant
    async fn find_by_user_name(
        &self,
        business_id: &BusinessId,
        user_name: &UserName,
    ) -> AuthResult<Option<User>>;

    /// Find user by email within a tenant
    async fn find_by_email(
        &self,
        business_id: &BusinessId,
        email: &Email,
    ) -> AuthResult<Option<User>>;

    /// Check if a user name exists within a tenant
    async fn exists_by_user_name(
        &self,
        business_id: &BusinessId,
        user_name: &UserName,
    ) -> AuthResult<bool>;

    /// Check if an email is taken within a tenant, optionally excluding one
    /// user (for email updates)
    async fn is_email_taken(
        &self,
        business_id: &BusinessId,
        email: &Email,
        exclude: Option<&UserId>,
    ) -> AuthResult<bool>;

    /// Update user
    async fn update(&self, user: &User) -> AuthResult<()>;

    /// Delete a user (rollback of partial provisioning only)
    async fn delete(&self, user_id: &UserId) -> AuthResult<()>;
}

/// Credentials repository trait
#[trait_variant::make(CredentialsRepository: Send)]
pub trait LocalCredentialsRepository {
    /// Create credentials
    async fn create(&self, credentials: &Credentials) -> AuthResult<()>;

    /// Find credentials by user ID
    async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Option<Credentials>>;

    /// Update credentials
    async fn update(&self, credentials: &Credentials) -> AuthResult<()>;

    /// Delete credentials (rollback of partial provisioning only)
    async fn delete(&self, user_id: &UserId) -> AuthResult<()>;

    /// Atomically mark a recovery code used.
    ///
    /// Returns true only when the code existed unused; a concurrent or
    /// repeated submission of the same code returns false.
    async fn mark_recovery_code_used(&self, user_id: &UserId, code: &str) -> AuthResult<bool>;
}

/// Auth log repository trait
#[trait_variant::make(AuthLogRepository: Send)]
pub trait LocalAuthLogRepository {
    /// Insert a log row
    async fn create(&self, log: &AuthLog) -> AuthResult<()>;

    /// Count currently online rows for a user
    async fn count_online(&self, user_id: &UserId) -> AuthResult<i64>;

    /// All online rows for a user, most recent activity first
    async fn find_online_by_user(&self, user_id: &UserId) -> AuthResult<Vec<AuthLog>>;

    /// Find the row auditing a session token
    async fn find_by_token(&self, session_token: &str) -> AuthResult<Option<AuthLog>>;

    /// Update a row (activity timestamps)
    async fn update(&self, log: &AuthLog) -> AuthResult<()>;

    /// Flip the row for one token offline; returns affected rows
    async fn close_by_token(&self, user_id: &UserId, session_token: &str) -> AuthResult<u64>;

    /// Flip every online row for a user offline; returns affected rows
    async fn close_all_for_user(&self, user_id: &UserId) -> AuthResult<u64>;
}

/// Provider link repository trait
#[trait_variant::make(ProviderLinkRepository: Send)]
pub trait LocalProviderLinkRepository {
    /// Find by the (provider, subject) unique pair
    async fn find_by_subject(
        &self,
        provider: Provider,
        subject_id: &str,
    ) -> AuthResult<Option<ProviderLink>>;

    /// Find a user's link for one provider
    async fn find_for_user(
        &self,
        user_id: &UserId,
        provider: Provider,
    ) -> AuthResult<Option<ProviderLink>>;

    /// Create a link
    async fn create(&self, link: &ProviderLink) -> AuthResult<()>;

    /// Update a link (token refresh)
    async fn update(&self, link: &ProviderLink) -> AuthResult<()>;
}
