//! Shared Kernel - Domain-crossing minimal core
//!
//! The smallest vocabulary shared by every crate in the workspace:
//! - Unified error type and HTTP-mapped error kinds
//! - Typed ID primitives
//!
//! **Design Principle**: only things that are hard to change and mean the
//! same thing across all domains belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;

    pub use app_error::{AppError, AppResult, diagnostics_enabled, set_diagnostics};
    pub use kind::ErrorKind;
}
pub mod id;
