//! Cryptography module
//!
//! Provides AES-256-GCM sealing for session payloads and Argon2id
//! password hashing for user credentials.

use crate::error::{AppError, Result};
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

const NONCE_SIZE: usize = 12; // 96 bits for GCM
const SALT_SIZE: usize = 16; // 128 bits

/// Symmetric key used to seal and open opaque tokens.
///
/// Tokens are `base64url(nonce || ciphertext)`; the GCM tag makes any
/// tampering detectable on open.
#[derive(Clone)]
pub struct SealingKey {
    cipher: Aes256Gcm,
}

impl SealingKey {
    /// Derive a 256-bit key from an arbitrary-length secret
    pub fn from_secret(secret: &str) -> Result<Self> {
        let key = Sha256::digest(secret.as_bytes());

        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| AppError::Crypto(format!("Cipher initialization failed: {}", e)))?;

        Ok(Self { cipher })
    }

    /// Encrypt `plaintext` into a URL-safe token
    pub fn seal(&self, plaintext: &[u8]) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| AppError::Crypto(format!("Encryption failed: {}", e)))?;

        let mut token = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        token.extend_from_slice(&nonce_bytes);
        token.extend_from_slice(&ciphertext);

        Ok(URL_SAFE_NO_PAD.encode(token))
    }

    /// Decrypt a token produced by [`SealingKey::seal`]
    pub fn open(&self, token: &str) -> Result<Vec<u8>> {
        let raw = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| AppError::Crypto(format!("Malformed token: {}", e)))?;

        if raw.len() <= NONCE_SIZE {
            return Err(AppError::Crypto("Token too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_SIZE);

        self.cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| AppError::Crypto(format!("Decryption failed: {}", e)))
    }
}

/// Hash a password into a PHC string using Argon2id
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);

    let salt_string = SaltString::encode_b64(&salt)
        .map_err(|e| AppError::Crypto(format!("Salt encoding failed: {}", e)))?;

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt_string)
        .map_err(|e| AppError::Crypto(format!("Password hashing failed: {}", e)))?;

    Ok(hash.to_string())
}

/// Check a password against a stored PHC string
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AppError::Crypto(format!("Stored hash is invalid: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> SealingKey {
        SealingKey::from_secret("an-adequately-long-test-secret-value").unwrap()
    }

    #[test]
    fn test_seal_open() {
        let key = test_key();
        let token = key.seal(br#"{"id":7}"#).unwrap();

        assert_eq!(key.open(&token).unwrap(), br#"{"id":7}"#);
    }

    #[test]
    fn test_tokens_are_url_safe() {
        let token = test_key().seal(b"payload").unwrap();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_fresh_nonce_per_seal() {
        let key = test_key();
        assert_ne!(key.seal(b"same").unwrap(), key.seal(b"same").unwrap());
    }

    #[test]
    fn test_wrong_key() {
        let token = test_key().seal(b"Secret data").unwrap();
        let other = SealingKey::from_secret("a-completely-different-secret-value").unwrap();

        assert!(other.open(&token).is_err());
    }

    #[test]
    fn test_corrupted_token() {
        let key = test_key();
        let token = key.seal(b"Original message").unwrap();

        let mut raw = URL_SAFE_NO_PAD.decode(&token).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xFF;
        let corrupted = URL_SAFE_NO_PAD.encode(raw);

        assert!(key.open(&corrupted).is_err(), "Tampered token should fail");
    }

    #[test]
    fn test_garbage_token() {
        let key = test_key();
        assert!(key.open("").is_err());
        assert!(key.open("not base64 at all!").is_err());
        assert!(key.open("AAAA").is_err());
    }

    #[test]
    fn test_password_hash_verify() {
        let hash = hash_password("correct horse").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_password_hashes_are_salted() {
        assert_ne!(
            hash_password("same-password").unwrap(),
            hash_password("same-password").unwrap()
        );
    }

    #[test]
    fn test_invalid_stored_hash() {
        assert!(verify_password("whatever", "plaintext-not-a-hash").is_err());
    }
}
