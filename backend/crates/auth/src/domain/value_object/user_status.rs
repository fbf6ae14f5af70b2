//! User Status Value Object

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Account may authenticate
    #[default]
    #[display("active")]
    Active,
    /// Account is deactivated; login attempts are rejected
    #[display("inactive")]
    Inactive,
}

impl UserStatus {
    /// Numeric ID for database storage
    pub fn id(&self) -> i16 {
        match self {
            UserStatus::Active => 1,
            UserStatus::Inactive => 0,
        }
    }

    /// Restore from a database ID; unknown values are treated as inactive.
    pub fn from_id(id: i16) -> Self {
        match id {
            1 => UserStatus::Active,
            _ => UserStatus::Inactive,
        }
    }

    pub fn can_login(&self) -> bool {
        matches!(self, UserStatus::Active)
    }
}
