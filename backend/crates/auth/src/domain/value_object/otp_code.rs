//! One-Time Passcode Value Object
//!
//! Short-lived 6-digit code delivered out-of-band. Only the SHA-256 digest
//! is ever persisted; the plaintext exists only in the delivery path.

use kernel::error::app_error::{AppError, AppResult};
use platform::crypto::{constant_time_eq, sha256_hex};
use rand::Rng;

/// OTP length in ASCII digits
pub const OTP_LENGTH: usize = 6;

/// A 6-digit one-time passcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    /// Generate a random code, zero-padded to 6 digits.
    pub fn generate() -> Self {
        let value: u32 = rand::rng().random_range(0..1_000_000);
        Self(format!("{:06}", value))
    }

    /// Parse user input; exactly 6 ASCII digits.
    pub fn parse(input: &str) -> AppResult<Self> {
        let trimmed = input.trim();
        if trimmed.len() != OTP_LENGTH || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::bad_request("Verification code must be 6 digits"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// SHA-256 digest for storage.
    pub fn digest(&self) -> String {
        sha256_hex(self.0.as_bytes())
    }

    /// Compare against a stored digest in constant time.
    pub fn matches_digest(&self, stored: &str) -> bool {
        constant_time_eq(self.digest().as_bytes(), stored.as_bytes())
    }
}

impl std::fmt::Display for OtpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = OtpCode::generate();
            assert_eq!(code.as_str().len(), OTP_LENGTH);
            assert!(code.as_str().chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(OtpCode::parse("12345").is_err());
        assert!(OtpCode::parse("1234567").is_err());
        assert!(OtpCode::parse("12a456").is_err());
        assert!(OtpCode::parse("").is_err());
        assert!(OtpCode::parse(" 123456 ").is_ok());
    }

    #[test]
    fn test_digest_match() {
        let code = OtpCode::parse("042107").unwrap();
        let stored = code.digest();

        assert!(OtpCode::parse("042107").unwrap().matches_digest(&stored));
        assert!(!OtpCode::parse("042108").unwrap().matches_digest(&stored));
    }
}
