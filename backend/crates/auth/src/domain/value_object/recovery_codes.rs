//! Recovery Codes Value Object
//!
//! Pre-generated single-use backup codes for two-factor authentication.
//! Stored as a map of code to used-flag; a used code never verifies again.

use std::collections::BTreeMap;

use kernel::error::app_error::{AppError, AppResult};
use rand::Rng;
use serde_json::Value;

/// Number of codes issued at enrollment
pub const RECOVERY_CODE_COUNT: usize = 8;

/// Recovery code length in characters
pub const RECOVERY_CODE_LENGTH: usize = 10;

/// Charset avoiding 0/O and 1/I confusion
const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// The set of recovery codes for one account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryCodes(BTreeMap<String, bool>);

impl RecoveryCodes {
    /// Generate a fresh set.
    ///
    /// Returns the set plus the plaintext codes in generation order; the
    /// plaintexts are shown to the user exactly once.
    pub fn generate(count: usize) -> (Self, Vec<String>) {
        let mut rng = rand::rng();
        let mut map = BTreeMap::new();
        let mut plain = Vec::with_capacity(count);

        while map.len() < count {
            let code: String = (0..RECOVERY_CODE_LENGTH)
                .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
                .collect();
            if map.insert(code.clone(), false).is_none() {
                plain.push(code);
            }
        }

        (Self(map), plain)
    }

    /// Consume a code: exact match on an unused entry marks it used and
    /// returns true; anything else returns false and changes nothing.
    pub fn consume(&mut self, code: &str) -> bool {
        match self.0.get_mut(code) {
            Some(used) if !*used => {
                *used = true;
                true
            }
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Remaining unused codes.
    pub fn unused_count(&self) -> usize {
        self.0.values().filter(|used| !**used).count()
    }

    /// Serialize for JSONB storage.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(&self.0).unwrap_or_else(|_| Value::Object(Default::default()))
    }

    /// Restore from JSONB storage.
    pub fn from_value(value: &Value) -> AppResult<Self> {
        let map: BTreeMap<String, bool> = serde_json::from_value(value.clone())
            .map_err(|e| AppError::internal(format!("Invalid recovery code map: {}", e)))?;
        Ok(Self(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_shape() {
        let (codes, plain) = RecoveryCodes::generate(RECOVERY_CODE_COUNT);
        assert_eq!(plain.len(), RECOVERY_CODE_COUNT);
        assert_eq!(codes.unused_count(), RECOVERY_CODE_COUNT);
        for code in &plain {
            assert_eq!(code.len(), RECOVERY_CODE_LENGTH);
        }
    }

    #[test]
    fn test_consume_is_single_use() {
        let (mut codes, plain) = RecoveryCodes::generate(4);
        let code = &plain[0];

        assert!(codes.consume(code));
        assert!(!codes.consume(code));
        assert_eq!(codes.unused_count(), 3);
    }

    #[test]
    fn test_consume_unknown_code() {
        let (mut codes, _) = RecoveryCodes::generate(4);
        assert!(!codes.consume("NOTACODE99"));
        assert_eq!(codes.unused_count(), 4);
    }

    #[test]
    fn test_value_roundtrip() {
        let (mut codes, plain) = RecoveryCodes::generate(4);
        codes.consume(&plain[1]);

        let restored = RecoveryCodes::from_value(&codes.to_value()).unwrap();
        assert_eq!(restored, codes);
        assert_eq!(restored.unused_count(), 3);
    }
}
