//! Forno Auth Core - Token issuance and rotation
//!
//! Implements the bearer credential protocol of the ordering backend:
//! login issues a refresh/access token pair, refresh rotates the pair
//! following RFC 6819 5.2.2.3 (reuse of a rotated refresh token revokes
//! the whole chain), and a per-user lock serializes token mutations.

pub mod config;
pub mod crypto;
pub mod error;
pub mod headers;
pub mod locks;
pub mod password;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use crypto::{constant_time_eq, CryptoError, TokenDigest};
pub use error::AuthError;
pub use headers::{parse_basic_auth, parse_bearer_token, BasicCredentials};
pub use locks::UserLocks;
pub use password::{hash_password, verify_password};
pub use service::AuthService;
pub use token::{AccessTokenGrant, RefreshTokenGrant, TokenGrant, TokenSecret};
