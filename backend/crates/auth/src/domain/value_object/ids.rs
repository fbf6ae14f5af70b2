//! Typed ID aliases for the auth domain

use kernel::id::{Id, markers};

/// Internal user identifier (UUID v4)
pub type UserId = Id<markers::User>;

/// Tenant identifier scoping all storage operations
pub type BusinessId = Id<markers::Business>;
