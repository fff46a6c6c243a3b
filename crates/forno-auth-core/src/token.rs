//! Token secrets and grant types

use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;

use crate::crypto::{CryptoError, TokenDigest};

/// Number of random bytes in a token secret (64 hex chars on the wire).
pub const TOKEN_SECRET_BYTES: usize = 32;

/// A token secret in both of its forms: the raw hex sent to the client
/// (never persisted) and the keyed digest stored for lookup.
#[derive(Debug, Clone)]
pub struct TokenSecret {
    pub hex: String,
    pub hash: String,
}

impl TokenSecret {
    /// Generate a fresh cryptographically random secret.
    pub fn generate(digest: &TokenDigest) -> Self {
        let mut bytes = [0u8; TOKEN_SECRET_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self {
            hex: hex::encode(bytes),
            hash: digest.digest(&bytes),
        }
    }

    /// Re-derive the stored form of a secret a client presented.
    ///
    /// # Errors
    /// Fails with [`CryptoError::InvalidTokenFormat`] if the input is not
    /// valid hex.
    pub fn from_hex(digest: &TokenDigest, token_hex: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(token_hex).map_err(|_| CryptoError::InvalidTokenFormat)?;
        Ok(Self {
            hex: token_hex.to_string(),
            hash: digest.digest(&bytes),
        })
    }
}

/// Refresh token part of a grant response. Only the raw secret is exposed.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshTokenGrant {
    pub token: String,
}

/// Access token part of a grant response.
#[derive(Debug, Clone, Serialize)]
pub struct AccessTokenGrant {
    pub token: String,
    pub expiration_time: i64,
}

/// Token pair returned from login and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenGrant {
    pub refresh_token: RefreshTokenGrant,
    pub access_token: AccessTokenGrant,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_digest() -> TokenDigest {
        TokenDigest::new("0123456789abcdef0123456789abcdef").unwrap()
    }

    #[test]
    fn test_generate_shape() {
        let digest = test_digest();
        let secret = TokenSecret::generate(&digest);
        assert_eq!(secret.hex.len(), TOKEN_SECRET_BYTES * 2);
        assert_eq!(secret.hash.len(), 64);
        assert!(secret.hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_is_unique() {
        let digest = test_digest();
        let a = TokenSecret::generate(&digest);
        let b = TokenSecret::generate(&digest);
        assert_ne!(a.hex, b.hex);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_from_hex_roundtrip() {
        let digest = test_digest();
        let generated = TokenSecret::generate(&digest);
        let parsed = TokenSecret::from_hex(&digest, &generated.hex).unwrap();
        assert_eq!(parsed.hash, generated.hash);
    }

    #[test]
    fn test_from_hex_rejects_non_hex() {
        let digest = test_digest();
        let result = TokenSecret::from_hex(&digest, "not hex at all!");
        assert!(matches!(result, Err(CryptoError::InvalidTokenFormat)));
    }
}
