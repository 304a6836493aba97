//! Short category codes (e.g. `SHO` for shoes).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length of a category code, in characters.
pub const MAX_CATEGORY_CODE_LEN: usize = 4;

/// Errors that can occur when parsing a category code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CategoryCodeError {
    #[error("category code is required")]
    Empty,
    #[error("category code must be at most 4 characters")]
    TooLong,
}

/// A validated, non-empty category code of at most four characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryCode(String);

impl CategoryCode {
    /// Parse and validate a category code. Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns `CategoryCodeError::Empty` for blank input and
    /// `CategoryCodeError::TooLong` for codes longer than four characters.
    pub fn parse(raw: &str) -> Result<Self, CategoryCodeError> {
        let code = raw.trim();
        if code.is_empty() {
            return Err(CategoryCodeError::Empty);
        }
        if code.chars().count() > MAX_CATEGORY_CODE_LEN {
            return Err(CategoryCodeError::TooLong);
        }
        Ok(Self(code.to_owned()))
    }

    /// Get the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison, used for uniqueness checks.
    #[must_use]
    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.0.to_lowercase() == other.trim().to_lowercase()
    }
}

impl TryFrom<String> for CategoryCode {
    type Error = CategoryCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CategoryCode> for String {
    fn from(code: CategoryCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_codes() {
        assert_eq!(CategoryCode::parse("SHO").map(|c| c.to_string()), Ok("SHO".to_string()));
        assert_eq!(CategoryCode::parse(" ab1 ").map(|c| c.to_string()), Ok("ab1".to_string()));
        assert!(CategoryCode::parse("ABCD").is_ok());
    }

    #[test]
    fn test_parse_rejects_empty_and_long() {
        assert_eq!(CategoryCode::parse("   "), Err(CategoryCodeError::Empty));
        assert_eq!(CategoryCode::parse("ABCDE"), Err(CategoryCodeError::TooLong));
    }

    #[test]
    fn test_eq_ignore_case() {
        let code = CategoryCode::parse("Sho").expect("valid code");
        assert!(code.eq_ignore_case("SHO"));
        assert!(!code.eq_ignore_case("SH"));
    }
}
