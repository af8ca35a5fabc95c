//! Redeemable short codes for action and quest templates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Letters in the random tail of a generated code.
pub const SHORT_CODE_LETTERS: usize = 4;

/// How many times code generation retries on a collision.
pub const SHORT_CODE_ATTEMPTS: usize = 5;

const MAX_LEN: usize = 32;

/// Case-insensitive code a player types to redeem a template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShortCode(String);

impl ShortCode {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let code = raw.as_ref().trim().to_lowercase();
        if code.is_empty() {
            return Err(DomainError::validation("code cannot be empty"));
        }
        if code.len() > MAX_LEN {
            return Err(DomainError::validation(format!(
                "code cannot exceed {MAX_LEN} characters"
            )));
        }
        Ok(Self(code))
    }

    /// Builds `dd-mm-yy-abcd` from a local date and four letter indices (0-25).
    pub fn generate(
        (day, month, year): (u32, u32, i32),
        letters: [u8; SHORT_CODE_LETTERS],
    ) -> Self {
        let tail: String = letters
            .iter()
            .map(|i| char::from(b'a' + (i % 26)))
            .collect();
        Self(format!(
            "{day:02}-{month:02}-{:02}-{tail}",
            year.rem_euclid(100)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ShortCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ShortCode> for String {
    fn from(value: ShortCode) -> Self {
        value.0
    }
}

impl fmt::Display for ShortCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_code_uses_local_date_and_letters() {
        let code = ShortCode::generate((5, 1, 2026), [0, 1, 25, 3]);
        assert_eq!(code.as_str(), "05-01-26-abzd");
    }

    #[test]
    fn input_is_normalized() {
        let code = ShortCode::new("  12-03-25-ABCD ").unwrap();
        assert_eq!(code.as_str(), "12-03-25-abcd");
        assert!(ShortCode::new("   ").is_err());
    }
}
