//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations with no domain knowledge:
//! - Cryptographic utilities (SHA-256, random bytes, Base64)
//! - Password hashing (Argon2id, zeroized clear-text handling)
//! - Cookie management
//! - Client identification (IP, user agent)
//! - Expiring key-value cache abstraction
//! - Login rate limiting built on the cache
//! - Notification dispatch abstraction

pub mod cache;
pub mod client;
pub mod cookie;
pub mod crypto;
pub mod notify;
pub mod password;
pub mod rate_limit;
