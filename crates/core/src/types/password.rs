//! Admin password complexity policy.

use thiserror::Error;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Special characters accepted by the password policy.
pub const PASSWORD_SPECIAL_CHARS: &[char] = &['!', '_', '#', '$', '-'];

/// Reasons a password fails the complexity policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PasswordError {
    #[error("password must be at least 8 characters")]
    TooShort,
    #[error("password must contain an uppercase letter")]
    MissingUppercase,
    #[error("password must contain a lowercase letter")]
    MissingLowercase,
    #[error("password must contain a digit")]
    MissingDigit,
    #[error("password must contain one of ! _ # $ -")]
    MissingSpecial,
}

/// Check a password against the complexity policy.
///
/// At least eight characters with one uppercase letter, one lowercase letter,
/// one digit and one of `! _ # $ -`.
///
/// # Errors
///
/// Returns the first rule the password violates.
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(PasswordError::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(PasswordError::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordError::MissingDigit);
    }
    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(&c)) {
        return Err(PasswordError::MissingSpecial);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_complex_passwords() {
        for password in ["Abc123!_", "Abc123!@", "Passw0rd#", "xY9$aaaa", "Zz-00000a"] {
            assert_eq!(validate_password(password), Ok(()), "{password}");
        }
    }

    #[test]
    fn test_rejects_short_passwords() {
        assert_eq!(validate_password("Ab1!"), Err(PasswordError::TooShort));
        assert_eq!(validate_password("Abc12!_"), Err(PasswordError::TooShort));
    }

    #[test]
    fn test_rejects_missing_classes() {
        assert_eq!(validate_password("abc123!_"), Err(PasswordError::MissingUppercase));
        assert_eq!(validate_password("ABC123!_"), Err(PasswordError::MissingLowercase));
        assert_eq!(validate_password("Abcdef!_"), Err(PasswordError::MissingDigit));
        assert_eq!(validate_password("Abc12345"), Err(PasswordError::MissingSpecial));
    }

    #[test]
    fn test_other_symbols_do_not_count_as_special() {
        assert_eq!(validate_password("Abc123@%"), Err(PasswordError::MissingSpecial));
    }
}
