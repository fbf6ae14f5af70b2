//! Infrastructure Layer
//!
//! Database implementations and in-memory substitutes.

pub mod memory;
pub mod postgres;

pub use memory::MemoryAuthRepository;
pub use postgres::PgAuthRepository;
