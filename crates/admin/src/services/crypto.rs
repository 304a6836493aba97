//! Symmetric encryption and token helpers.
//!
//! [`FieldCipher`] seals short strings with AES-256-GCM. The output is
//! `base64url(nonce || ciphertext)` without padding, with a fresh random
//! 96-bit nonce per call, so encrypting the same value twice yields different
//! ciphertexts. Used for usernames at rest and for session payload cookies.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Errors from sealing or opening values.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid encryption key: {0}")]
    InvalidKey(String),

    #[error("encryption failed")]
    Encrypt,

    /// Malformed input, wrong key, or tampered ciphertext.
    #[error("decryption failed")]
    Decrypt,
}

/// AES-256-GCM cipher for short string fields.
#[derive(Clone)]
pub struct FieldCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FieldCipher([REDACTED])")
    }
}

impl FieldCipher {
    /// Build a cipher from raw key bytes.
    #[must_use]
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        Self {
            cipher: Aes256Gcm::new(key.into()),
        }
    }

    /// Build a cipher from a standard base64 encoded 32-byte key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKey` if the input is not base64 or not 32 bytes.
    pub fn from_base64_key(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        let key = <[u8; KEY_LEN]>::try_from(bytes.as_slice())
            .map_err(|_| CryptoError::InvalidKey(format!("expected {KEY_LEN} bytes")))?;
        Ok(Self::new(&key))
    }

    /// Encrypt a string.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Encrypt` if the AEAD rejects the input.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|_| CryptoError::Encrypt)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    /// Decrypt a value produced by [`FieldCipher::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Decrypt` for malformed, tampered, or foreign input.
    pub fn decrypt(&self, sealed: &str) -> Result<String, CryptoError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(sealed.trim())
            .map_err(|_| CryptoError::Decrypt)?;
        if bytes.len() <= NONCE_LEN {
            return Err(CryptoError::Decrypt);
        }

        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CryptoError::Decrypt)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::Decrypt)
    }
}

/// Generate `len` random bytes, hex encoded.
#[must_use]
pub fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// SHA-256 of a string, hex encoded.
#[must_use]
pub fn sha256_hex(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

/// Compare two strings in constant time.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cipher() -> FieldCipher {
        FieldCipher::new(&[42u8; KEY_LEN])
    }

    #[test]
    fn test_encrypt_decrypt() {
        let cipher = cipher();
        let sealed = cipher.encrypt("admin").unwrap();
        assert_ne!(sealed, "admin");
        assert_eq!(cipher.decrypt(&sealed).unwrap(), "admin");
    }

    #[test]
    fn test_nonce_makes_ciphertexts_differ() {
        let cipher = cipher();
        assert_ne!(cipher.encrypt("same").unwrap(), cipher.encrypt("same").unwrap());
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = cipher().encrypt("admin").unwrap();
        let other = FieldCipher::new(&[7u8; KEY_LEN]);
        assert!(matches!(other.decrypt(&sealed), Err(CryptoError::Decrypt)));
    }

    #[test]
    fn test_tampered_or_garbage_input_fails() {
        let cipher = cipher();
        let mut sealed = cipher.encrypt("admin").unwrap();
        sealed.push('A');
        assert!(cipher.decrypt(&sealed).is_err());
        assert!(cipher.decrypt("not*base64").is_err());
        assert!(cipher.decrypt("").is_err());
    }

    #[test]
    fn test_from_base64_key_checks_length() {
        assert!(FieldCipher::from_base64_key(&STANDARD.encode([1u8; 32])).is_ok());
        assert!(matches!(
            FieldCipher::from_base64_key(&STANDARD.encode([1u8; 16])),
            Err(CryptoError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_random_hex_length() {
        assert_eq!(random_hex(16).len(), 32);
        assert_ne!(random_hex(16), random_hex(16));
    }

    #[test]
    fn test_sha256_hex_known_value() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "ab"));
    }

    #[test]
    fn test_debug_is_redacted() {
        assert_eq!(format!("{:?}", cipher()), "FieldCipher([REDACTED])");
    }
}
