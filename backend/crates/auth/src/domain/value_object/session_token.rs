//! Session Token Value Object
//!
//! Opaque transport-layer session identifier: a random ID signed with
//! HMAC-SHA256, rendered as `{id}.{signature}` in URL-safe base64. The
//! signature lets the service reject junk tokens before touching storage.

use hmac::{Hmac, Mac};
use platform::crypto::{from_base64_url, random_bytes, to_base64_url};
use sha2::Sha256;

/// A signed session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generate a fresh signed token.
    pub fn generate(secret: &[u8; 32]) -> Self {
        let id = to_base64_url(&random_bytes(16));

        let mut mac =
            Hmac::<Sha256>::new_from_slice(secret).expect("HMAC can take key of any size");
        mac.update(id.as_bytes());
        let signature = mac.finalize().into_bytes();

        Self(format!("{}.{}", id, to_base64_url(&signature)))
    }

    /// Wrap a stored token string (from the database or a cookie).
    pub fn from_string(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Verify the token's structure and signature.
    pub fn verify(token: &str, secret: &[u8; 32]) -> bool {
        let Some((id, signature_b64)) = token.split_once('.') else {
            return false;
        };
        let Ok(signature) = from_base64_url(signature_b64) else {
            return false;
        };

        let mut mac =
            Hmac::<Sha256>::new_from_slice(secret).expect("HMAC can take key of any size");
        mac.update(id.as_bytes());
        mac.verify_slice(&signature).is_ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
