use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A short code identifying a shortened URL.
///
/// Codes are either derived by the [`CodeGenerator`](crate::CodeGenerator)
/// or supplied by the caller as a custom alias. Aliases must be 3-32
/// characters long and contain only alphanumeric characters, hyphens, or
/// underscores.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortCode(String);

impl ShortCode {
    /// Shortest accepted alias.
    pub const MIN_LENGTH: usize = 3;
    /// Longest accepted alias.
    pub const MAX_LENGTH: usize = 32;

    /// Creates a new `ShortCode` after validating the input.
    ///
    /// Valid codes are 3-32 characters and contain only `[a-zA-Z0-9_-]`.
    pub fn new(code: impl AsRef<str>) -> Result<Self, CoreError> {
        let code = code.as_ref();
        Self::validate(code)?;
        Ok(Self(code.to_string()))
    }

    /// Creates a `ShortCode` without validation.
    ///
    /// Use this only for codes produced by trusted internal sources
    /// (the code generator, or values read back from a store).
    pub fn new_unchecked(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().to_string())
    }

    /// Generates the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self)
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(code: &str) -> Result<(), CoreError> {
        if !code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(CoreError::InvalidShortCode(format!(
                "must contain only alphanumeric characters, hyphens, or underscores: '{}'",
                code
            )));
        }

        if code.len() < Self::MIN_LENGTH || code.len() > Self::MAX_LENGTH {
            return Err(CoreError::InvalidShortCode(format!(
                "length must be between {} and {}, got {}",
                Self::MIN_LENGTH,
                Self::MAX_LENGTH,
                code.len()
            )));
        }

        Ok(())
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShortCode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_codes() {
        assert!(ShortCode::new("abc").is_ok());
        assert!(ShortCode::new("Abc-123_xyz").is_ok());
        assert!(ShortCode::new("a".repeat(32)).is_ok());
    }

    #[test]
    fn too_short() {
        assert!(ShortCode::new("ab").is_err());
        assert!(ShortCode::new("a").is_err());
        assert!(ShortCode::new("").is_err());
    }

    #[test]
    fn too_long() {
        assert!(ShortCode::new("a".repeat(33)).is_err());
        assert!(ShortCode::new("this-is-a-very-very-very-long-custom-alias").is_err());
    }

    #[test]
    fn invalid_characters() {
        assert!(ShortCode::new("abc def").is_err());
        assert!(ShortCode::new("abc/def").is_err());
        assert!(ShortCode::new("my@custom#url").is_err());
        assert!(ShortCode::new("100%").is_err());
        assert!(ShortCode::new("héllo").is_err());
    }

    #[test]
    fn display_round_trips_input() {
        let code = ShortCode::new("my-code").unwrap();
        assert_eq!(code.to_string(), "my-code");
    }

    #[test]
    fn serializes_as_plain_string() {
        let code = ShortCode::new("my-code").unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"my-code\"");
    }

    #[test]
    fn to_url_joins_base() {
        let code = ShortCode::new("abc123").unwrap();
        assert_eq!(code.to_url("https://min.ify"), "https://min.ify/abc123");
        assert_eq!(code.to_url("https://min.ify/"), "https://min.ify/abc123");
    }
}
