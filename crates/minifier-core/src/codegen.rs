//! Deterministic short-code derivation.

use crate::base62;
use crate::error::CoreError;
use crate::shortcode::ShortCode;
use sha2::{Digest, Sha256};

/// Length of derived codes unless configured otherwise.
pub const DEFAULT_CODE_LENGTH: usize = 7;

/// A `u64` never needs more than 11 base62 symbols.
const MAX_CODE_LENGTH: usize = 11;

/// Derives short codes from `(long_url, owner_id)` pairs and validates
/// custom aliases.
///
/// Derivation is a pure function: SHA-256 over the URL followed by the owner
/// id, the first eight digest bytes read as a big-endian `u64`, rendered in
/// base62 to a fixed width. The generator performs no I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeGenerator {
    length: usize,
}

impl CodeGenerator {
    /// Creates a generator producing [`DEFAULT_CODE_LENGTH`]-symbol codes.
    pub fn new() -> Self {
        Self {
            length: DEFAULT_CODE_LENGTH,
        }
    }

    /// Creates a generator producing codes of `length` symbols.
    ///
    /// The length is clamped to `3..=11`.
    pub fn with_length(length: usize) -> Self {
        Self {
            length: length.clamp(ShortCode::MIN_LENGTH, MAX_CODE_LENGTH),
        }
    }

    /// Number of symbols in every derived code.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Derives the code for a `(long_url, owner_id)` pair.
    ///
    /// The same pair always yields the same code.
    pub fn derive_code(&self, long_url: &str, owner_id: &str) -> ShortCode {
        self.derive_code_for_attempt(long_url, owner_id, 0)
    }

    /// Derives the candidate code for a given collision-retry attempt.
    ///
    /// Attempt `0` is identical to [`derive_code`](Self::derive_code). Later
    /// attempts append `#<attempt>` to the hash input so each retry explores
    /// a different candidate while staying deterministic.
    pub fn derive_code_for_attempt(&self, long_url: &str, owner_id: &str, attempt: u32) -> ShortCode {
        let mut hasher = Sha256::new();
        hasher.update(long_url.as_bytes());
        hasher.update(owner_id.as_bytes());
        if attempt > 0 {
            hasher.update(b"#");
            hasher.update(attempt.to_string().as_bytes());
        }
        let digest = hasher.finalize();

        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        let num = u64::from_be_bytes(prefix);

        ShortCode::new_unchecked(base62::encode_fixed(num, self.length))
    }

    /// Validates a caller-supplied alias and returns it as a [`ShortCode`].
    pub fn validate_alias(&self, alias: &str) -> Result<ShortCode, CoreError> {
        ShortCode::new(alias)
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base62::ALPHABET;

    const URL: &str = "https://example.com";

    fn assert_well_formed(code: &ShortCode, len: usize) {
        assert_eq!(code.as_str().len(), len);
        assert!(code.as_str().bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn derive_is_deterministic() {
        let generator = CodeGenerator::new();
        let first = generator.derive_code(URL, "u1");
        let second = generator.derive_code(URL, "u1");
        assert_eq!(first, second);
    }

    #[test]
    fn derive_matches_known_vectors() {
        let generator = CodeGenerator::new();
        assert_eq!(generator.derive_code(URL, "u1").as_str(), "FvRMbKa");
        assert_eq!(generator.derive_code(URL, "u2").as_str(), "aZRif0w");
        assert_eq!(generator.derive_code(URL, "user1").as_str(), "jLrb2Hb");
    }

    #[test]
    fn derive_produces_seven_base62_symbols() {
        let generator = CodeGenerator::new();
        for owner in ["u1", "u2", "", "someone@example.com"] {
            let code = generator.derive_code(URL, owner);
            assert_well_formed(&code, 7);
        }
    }

    #[test]
    fn different_owners_get_different_codes() {
        let generator = CodeGenerator::new();
        let a = generator.derive_code(URL, "user1");
        let b = generator.derive_code(URL, "user2");
        let c = generator.derive_code(URL, "user3");
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn retry_attempts_explore_new_candidates() {
        let generator = CodeGenerator::new();
        let base = generator.derive_code_for_attempt(URL, "u1", 0);
        let first_retry = generator.derive_code_for_attempt(URL, "u1", 1);
        let second_retry = generator.derive_code_for_attempt(URL, "u1", 2);

        assert_eq!(base, generator.derive_code(URL, "u1"));
        assert_eq!(first_retry.as_str(), "uAKvICv");
        assert_eq!(second_retry.as_str(), "EyJ0tML");
        assert_ne!(base, first_retry);
        assert_ne!(first_retry, second_retry);
    }

    #[test]
    fn custom_length_is_clamped() {
        assert_eq!(CodeGenerator::with_length(1).length(), 3);
        assert_eq!(CodeGenerator::with_length(64).length(), 11);

        let code = CodeGenerator::with_length(10).derive_code(URL, "u1");
        assert_well_formed(&code, 10);
    }

    #[test]
    fn alias_validation() {
        let generator = CodeGenerator::new();

        assert!(generator.validate_alias("my-custom-url").is_ok());
        assert!(generator.validate_alias("custom-url-123").is_ok());
        assert!(generator.validate_alias("under_score").is_ok());

        for len in 0..=2 {
            assert!(generator.validate_alias(&"a".repeat(len)).is_err());
        }
        assert!(generator.validate_alias(&"a".repeat(33)).is_err());
        for bad in ["my@custom#url", "percent%", "spa ce", "dot.ted"] {
            assert!(matches!(
                generator.validate_alias(bad),
                Err(CoreError::InvalidShortCode(_))
            ));
        }
    }
}
