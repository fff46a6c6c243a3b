//! Configuration for the Order API service.

use std::time::Duration;

use forno_auth_core::AuthConfig;

/// Order API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,

    /// Database URL (SQLite path or `sqlite:` URL)
    pub database_url: String,

    /// Key for the token digest, minimum 32 bytes
    pub token_secret: String,

    /// Token protocol configuration
    pub auth: AuthConfig,

    /// Capacity of the store queue
    pub store_queue_capacity: usize,

    /// How often the store worker re-checks an empty queue
    pub store_refresh_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let http_port = std::env::var("HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        let token_secret =
            std::env::var("TOKEN_SECRET").map_err(|_| ConfigError::Missing("TOKEN_SECRET"))?;
        if token_secret.len() < 32 {
            return Err(ConfigError::Invalid(
                "TOKEN_SECRET must be at least 32 characters",
            ));
        }

        let access_token_valid_time: u64 = std::env::var("ACCESS_TOKEN_VALID_TIME")
            .unwrap_or_else(|_| "600".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("ACCESS_TOKEN_VALID_TIME"))?;

        let access_token_transition_time: u64 = std::env::var("ACCESS_TOKEN_TRANSITION_TIME")
            .unwrap_or_else(|_| "20".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("ACCESS_TOKEN_TRANSITION_TIME"))?;

        let max_refresh_tokens: u32 = std::env::var("MAX_REFRESH_TOKENS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("MAX_REFRESH_TOKENS"))?;

        let store_queue_capacity: usize = std::env::var("STORE_QUEUE_CAPACITY")
            .unwrap_or_else(|_| "64".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("STORE_QUEUE_CAPACITY"))?;

        let store_refresh_interval_ms: u64 = std::env::var("STORE_REFRESH_INTERVAL_MS")
            .unwrap_or_else(|_| "500".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("STORE_REFRESH_INTERVAL_MS"))?;

        let auth = AuthConfig::new()
            .with_access_token_valid_time(Duration::from_secs(access_token_valid_time))
            .with_access_token_transition_time(Duration::from_secs(access_token_transition_time))
            .with_max_refresh_tokens(max_refresh_tokens);

        Ok(Self {
            http_port,
            database_url,
            token_secret,
            auth,
            store_queue_capacity,
            store_refresh_interval: Duration::from_millis(store_refresh_interval_ms),
        })
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
