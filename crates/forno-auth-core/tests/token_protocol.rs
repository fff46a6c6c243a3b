//! End-to-end tests of the token protocol against a real SQLite database.
//!
//! The store worker is not spawned; tests drain the queue themselves so
//! every step is deterministic.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use forno_auth_core::{hash_password, AuthConfig, AuthError, AuthService, TokenDigest};
use forno_db::store::{drain_queue, StoreOperation, StoreQueue};
use forno_db::{
    create_pool, ensure_schema, CreateDeliveryUser, DbPool, SqliteTokenRepository,
    SqliteUserRepository, UserRepository,
};
use tempfile::TempDir;
use tokio::sync::mpsc;

const DIGEST_KEY: &str = "0123456789abcdef0123456789abcdef";

struct Harness {
    _dir: TempDir,
    pool: DbPool,
    service: AuthService<SqliteUserRepository, SqliteTokenRepository>,
    rx: mpsc::Receiver<StoreOperation>,
}

impl Harness {
    async fn new(config: AuthConfig) -> Self {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("forno.db");
        let pool = create_pool(db_path.to_str().unwrap()).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        ensure_schema(&mut conn).await.unwrap();
        drop(conn);

        let users = SqliteUserRepository::new(pool.clone());
        let tokens = SqliteTokenRepository::new(pool.clone());
        users
            .create(CreateDeliveryUser {
                username: "carrier".into(),
                pw_hash: hash_password("secret").unwrap(),
                date_created: Utc::now().timestamp(),
            })
            .await
            .unwrap();

        let (queue, rx) = StoreQueue::bounded(16);
        let service = AuthService::new(
            config,
            TokenDigest::new(DIGEST_KEY).unwrap(),
            Arc::new(users),
            Arc::new(tokens),
            queue,
        );

        Self {
            _dir: dir,
            pool,
            service,
            rx,
        }
    }

    /// Execute everything the service queued so far.
    async fn drain(&mut self) -> usize {
        let mut conn = self.pool.acquire().await.unwrap();
        drain_queue(&mut self.rx, &mut conn).await
    }

    async fn count(&self, sql: &str) -> i64 {
        let (count,): (i64,) = sqlx::query_as(sql).fetch_one(&self.pool).await.unwrap();
        count
    }
}

fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Config whose refresh window always accepts a rotation.
fn rotation_friendly_config() -> AuthConfig {
    AuthConfig::new().with_access_token_transition_time(Duration::from_secs(3600))
}

#[tokio::test]
async fn test_login_issues_token_pair() {
    let mut harness = Harness::new(AuthConfig::new()).await;

    let before = Utc::now().timestamp();
    let grant = harness
        .service
        .login(Some(&basic_auth("carrier", "secret")), Some("phone".into()))
        .await
        .unwrap();

    assert_eq!(grant.refresh_token.token.len(), 64);
    assert_eq!(grant.access_token.token.len(), 64);
    assert!(grant
        .refresh_token
        .token
        .chars()
        .all(|c| c.is_ascii_hexdigit()));

    // Expiration is roughly now + the configured lifetime.
    let expected = before + 600;
    assert!((expected..=expected + 2).contains(&grant.access_token.expiration_time));

    // The response was optimistic; rows appear once the queue drains.
    assert_eq!(harness.count("SELECT COUNT(*) FROM refresh_token").await, 0);
    assert_eq!(harness.drain().await, 1);
    assert_eq!(harness.count("SELECT COUNT(*) FROM refresh_token").await, 1);
    assert_eq!(harness.count("SELECT COUNT(*) FROM access_token").await, 1);
    assert_eq!(
        harness
            .count("SELECT COUNT(*) FROM refresh_token_description")
            .await,
        1
    );

    // The issued access token is accepted.
    harness
        .service
        .check_access(Some(&bearer(&grant.access_token.token)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let mut harness = Harness::new(AuthConfig::new()).await;

    let err = harness
        .service
        .login(Some(&basic_auth("carrier", "wrong")), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));

    let err = harness
        .service
        .login(Some(&basic_auth("nobody", "secret")), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));

    let err = harness.service.login(None, None).await.unwrap_err();
    assert!(matches!(err, AuthError::MalformedAuthorization));

    // Nothing was queued.
    assert_eq!(harness.drain().await, 0);
}

#[tokio::test]
async fn test_refresh_rotates_and_invalidates_predecessor() {
    let mut harness = Harness::new(rotation_friendly_config()).await;

    let first = harness
        .service
        .login(Some(&basic_auth("carrier", "secret")), None)
        .await
        .unwrap();
    harness.drain().await;

    let second = harness
        .service
        .refresh(Some(&bearer(&first.refresh_token.token)))
        .await
        .unwrap();
    harness.drain().await;

    assert_ne!(first.refresh_token.token, second.refresh_token.token);

    // The chain stays on one description; the old token is invalid, the
    // new one references it.
    assert_eq!(
        harness
            .count("SELECT COUNT(*) FROM refresh_token_description")
            .await,
        1
    );
    assert_eq!(harness.count("SELECT COUNT(*) FROM refresh_token").await, 2);
    assert_eq!(
        harness
            .count("SELECT COUNT(*) FROM refresh_token WHERE valid = 1")
            .await,
        1
    );
    assert_eq!(
        harness
            .count("SELECT COUNT(*) FROM refresh_token WHERE originated_from IS NOT NULL")
            .await,
        1
    );
}

#[tokio::test]
async fn test_refresh_token_reuse_revokes_chain() {
    let mut harness = Harness::new(rotation_friendly_config()).await;

    let first = harness
        .service
        .login(Some(&basic_auth("carrier", "secret")), None)
        .await
        .unwrap();
    harness.drain().await;

    harness
        .service
        .refresh(Some(&bearer(&first.refresh_token.token)))
        .await
        .unwrap();
    harness.drain().await;

    // Presenting the rotated token again looks like theft.
    let err = harness
        .service
        .refresh(Some(&bearer(&first.refresh_token.token)))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::ReuseDetected));
    assert_eq!(err.status_code(), 403);
    assert_eq!(err.error_code(), "invalid_refresh_token");

    // The revocation cascades through the whole chain.
    harness.drain().await;
    assert_eq!(
        harness
            .count("SELECT COUNT(*) FROM refresh_token_description")
            .await,
        0
    );
    assert_eq!(harness.count("SELECT COUNT(*) FROM refresh_token").await, 0);
    assert_eq!(harness.count("SELECT COUNT(*) FROM access_token").await, 0);

    // The user can log in again afterwards.
    harness
        .service
        .login(Some(&basic_auth("carrier", "secret")), None)
        .await
        .unwrap();
    assert_eq!(harness.drain().await, 1);
}

#[tokio::test]
async fn test_refresh_too_early_is_rejected_without_side_effects() {
    // Default config: 20 second window on a 600 second token.
    let mut harness = Harness::new(AuthConfig::new()).await;

    let grant = harness
        .service
        .login(Some(&basic_auth("carrier", "secret")), None)
        .await
        .unwrap();
    harness.drain().await;

    let err = harness
        .service
        .refresh(Some(&bearer(&grant.refresh_token.token)))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::AccessTokenNotExpired));
    assert_eq!(err.status_code(), 409);

    // Nothing queued, nothing changed; the presented token is still valid.
    assert_eq!(harness.drain().await, 0);
    assert_eq!(
        harness
            .count("SELECT COUNT(*) FROM refresh_token WHERE valid = 1")
            .await,
        1
    );
}

#[tokio::test]
async fn test_concurrent_logins_one_wins() {
    let harness = Harness::new(AuthConfig::new()).await;
    let auth = basic_auth("carrier", "secret");

    // The queue is not drained between the two calls, so the first login
    // still holds the user lock when the second one reaches it.
    let (a, b) = tokio::join!(
        harness.service.login(Some(&auth), None),
        harness.service.login(Some(&auth), None),
    );

    let busy = match (&a, &b) {
        (Ok(_), Err(AuthError::LockBusy)) | (Err(AuthError::LockBusy), Ok(_)) => true,
        _ => false,
    };
    assert!(busy, "expected exactly one login to hit the busy lock");
}

#[tokio::test]
async fn test_refresh_token_limit() {
    let mut harness = Harness::new(AuthConfig::new().with_max_refresh_tokens(3)).await;
    let auth = basic_auth("carrier", "secret");

    for _ in 0..3 {
        harness.service.login(Some(&auth), None).await.unwrap();
        harness.drain().await;
    }

    let err = harness.service.login(Some(&auth), None).await.unwrap_err();
    assert!(matches!(err, AuthError::RefreshTokenLimitReached));
    assert_eq!(err.error_code(), "reached_refresh_token_limit");

    // The rejected login left no rows behind.
    assert_eq!(harness.drain().await, 0);
    assert_eq!(harness.count("SELECT COUNT(*) FROM refresh_token").await, 3);

    // The limit counts valid tokens only; rotation does not consume it.
    // (Rotated-away tokens are invalid and free the slot they held.)
    assert_eq!(
        harness
            .count("SELECT COUNT(*) FROM refresh_token WHERE valid = 1")
            .await,
        3
    );
}

#[tokio::test]
async fn test_unknown_refresh_token_rejected() {
    let harness = Harness::new(AuthConfig::new()).await;

    // Well-formed hex that was never issued.
    let err = harness
        .service
        .refresh(Some(&bearer(&"ab".repeat(32))))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidRefreshToken));

    // Not hex at all.
    let err = harness
        .service
        .refresh(Some(&bearer("zz-not-hex")))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidRefreshToken));
}

#[tokio::test]
async fn test_expired_access_token_rejected() {
    let mut harness = Harness::new(AuthConfig::new()).await;

    let grant = harness
        .service
        .login(Some(&basic_auth("carrier", "secret")), None)
        .await
        .unwrap();
    harness.drain().await;

    // Age the stored access token past its expiration.
    sqlx::query("UPDATE access_token SET expiration_time = ?")
        .bind(Utc::now().timestamp() - 10)
        .execute(&harness.pool)
        .await
        .unwrap();

    let err = harness
        .service
        .check_access(Some(&bearer(&grant.access_token.token)))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidAccessToken));

    let err = harness
        .service
        .check_access(Some(&bearer(&"cd".repeat(32))))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidAccessToken));
}
