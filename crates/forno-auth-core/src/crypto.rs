//! Cryptographic utilities for token handling
//!
//! Token secrets are never stored. What the database holds is a keyed
//! HMAC-SHA256 digest of the secret bytes, so a leaked table does not
//! yield usable credentials, and lookups compare digest to digest.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Errors from the credential primitives
#[derive(Debug, Clone, thiserror::Error)]
pub enum CryptoError {
    #[error("digest key too short: got {actual} bytes, need at least {minimum}")]
    KeyTooShort { actual: usize, minimum: usize },

    /// A presented token secret was not valid hex.
    #[error("token secret is not valid hex")]
    InvalidTokenFormat,
}

/// Pre-validated HMAC key used to digest token secrets for storage.
///
/// Creating an HMAC instance from raw bytes has overhead; this struct
/// validates the key once and clones cheaply.
#[derive(Clone)]
pub struct TokenDigest {
    key_bytes: Arc<[u8]>,
}

impl TokenDigest {
    /// Minimum allowed key length in bytes (256 bits)
    pub const MIN_KEY_LENGTH: usize = 32;

    /// Create a new digest key from bytes.
    ///
    /// # Errors
    /// Returns an error if the key is shorter than 32 bytes.
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self, CryptoError> {
        let key_bytes = key.as_ref();
        if key_bytes.len() < Self::MIN_KEY_LENGTH {
            return Err(CryptoError::KeyTooShort {
                actual: key_bytes.len(),
                minimum: Self::MIN_KEY_LENGTH,
            });
        }
        Ok(Self {
            key_bytes: Arc::from(key_bytes),
        })
    }

    fn create_hmac(&self) -> Hmac<Sha256> {
        // This cannot fail because we validated key length in new()
        Hmac::<Sha256>::new_from_slice(&self.key_bytes)
            .expect("HMAC key length already validated")
    }

    /// Digest token secret bytes into the hex form stored in the database.
    pub fn digest(&self, secret: &[u8]) -> String {
        let mut mac = self.create_hmac();
        mac.update(secret);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Check whether a secret digests to a stored hash, in constant time.
    pub fn matches(&self, secret: &[u8], stored_hash: &str) -> bool {
        let computed = self.digest(secret);
        constant_time_eq(computed.as_bytes(), stored_hash.as_bytes())
    }
}

impl std::fmt::Debug for TokenDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenDigest")
            .field("key_length", &self.key_bytes.len())
            .finish_non_exhaustive()
    }
}

/// Constant-time byte slice comparison.
///
/// Length is not secret: slices of different lengths compare unequal
/// immediately. Equal-length slices are compared without data-dependent
/// branches.
#[inline]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_digest() -> TokenDigest {
        TokenDigest::new("0123456789abcdef0123456789abcdef").unwrap()
    }

    #[test]
    fn test_key_too_short() {
        let result = TokenDigest::new("short");
        assert!(matches!(result, Err(CryptoError::KeyTooShort { .. })));
    }

    #[test]
    fn test_digest_is_deterministic() {
        let digest = test_digest();
        let secret = b"some token secret bytes";
        let a = digest.digest(secret);
        let b = digest.digest(secret);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64); // SHA-256 = 32 bytes = 64 hex chars
    }

    #[test]
    fn test_different_secrets_differ() {
        let digest = test_digest();
        assert_ne!(digest.digest(b"one"), digest.digest(b"two"));
    }

    #[test]
    fn test_different_keys_differ() {
        let a = TokenDigest::new("a".repeat(32)).unwrap();
        let b = TokenDigest::new("b".repeat(32)).unwrap();
        assert_ne!(a.digest(b"secret"), b.digest(b"secret"));
    }

    #[test]
    fn test_matches() {
        let digest = test_digest();
        let hash = digest.digest(b"secret");
        assert!(digest.matches(b"secret", &hash));
        assert!(!digest.matches(b"other", &hash));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc123", b"abc123"));
        assert!(!constant_time_eq(b"abc123", b"xyz789"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }
}
