//! Configuration types for the auth service

use std::time::Duration;

/// Token protocol configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// How long a freshly issued access token is valid
    pub access_token_valid_time: Duration,
    /// How close to access token expiry a refresh is accepted. Refreshing
    /// earlier than this window is rejected.
    pub access_token_transition_time: Duration,
    /// Maximum number of valid refresh tokens a single user may hold
    pub max_refresh_tokens: u32,
}

impl AuthConfig {
    /// Create a config with the protocol defaults: 10 minute access token
    /// lifetime, 20 second refresh window, 10 refresh tokens per user.
    pub fn new() -> Self {
        Self {
            access_token_valid_time: Duration::from_secs(600),
            access_token_transition_time: Duration::from_secs(20),
            max_refresh_tokens: 10,
        }
    }

    /// Set the access token lifetime
    pub fn with_access_token_valid_time(mut self, duration: Duration) -> Self {
        self.access_token_valid_time = duration;
        self
    }

    /// Set the refresh acceptance window
    pub fn with_access_token_transition_time(mut self, duration: Duration) -> Self {
        self.access_token_transition_time = duration;
        self
    }

    /// Set the per-user refresh token limit
    pub fn with_max_refresh_tokens(mut self, limit: u32) -> Self {
        self.max_refresh_tokens = limit;
        self
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}
