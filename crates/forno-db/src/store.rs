//! Deferred store queue and background worker
//!
//! Request handlers never write to the database directly. They describe the
//! mutation as a [`StoreOperation`], push it onto a bounded queue and answer
//! the client. A single worker task owns a dedicated connection and drains
//! the queue in FIFO order, executing each operation in its own transaction.
//!
//! Token operations carry the per-user lock guard that was acquired by the
//! request handler. The guard is dropped only after the operation ran, so a
//! second token mutation for the same user cannot even be enqueued until the
//! first one committed.

use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::{Connection, Sqlite, SqliteConnection};
use tokio::sync::mpsc;
use tokio::sync::OwnedMutexGuard;
use tokio_util::sync::CancellationToken;

use crate::error::DbResult;

/// Guard for the per-user token mutation lock. Dropping it releases the lock.
pub type UserLockGuard = OwnedMutexGuard<()>;

/// How a new refresh token relates to a description chain.
#[derive(Debug, Clone)]
pub enum NewDescription {
    /// Start a fresh chain (login): insert a new description first.
    Create {
        user_id: i64,
        device_description: Option<String>,
    },
    /// Continue an existing chain (rotation): reference its description.
    Existing(i64),
}

/// Refresh token to insert
#[derive(Debug, Clone)]
pub struct CreateRefreshToken {
    pub originated_from: Option<i64>,
    pub token_hash: String,
    pub issuing_time: i64,
    pub description: NewDescription,
}

/// Access token to insert. The owning refresh token id is only known once
/// the refresh token row exists, so it is filled in by the worker.
#[derive(Debug, Clone)]
pub struct CreateAccessToken {
    pub token_hash: String,
    pub expiration_time: i64,
}

/// Order to insert
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub items: Vec<CreateOrderItem>,
}

/// Ordered item to insert
#[derive(Debug, Clone)]
pub struct CreateOrderItem {
    pub item_id: i64,
    pub unit_price: f64,
    pub quantity: i64,
}

/// A deferred unit of persistence work.
pub enum StoreOperation {
    /// Insert an order with its items.
    InsertOrder(CreateOrder),
    /// Insert a fresh refresh/access token pair (login).
    InsertTokens {
        refresh: CreateRefreshToken,
        access: CreateAccessToken,
        guard: Option<UserLockGuard>,
    },
    /// Atomically invalidate the old refresh token and insert the rotated
    /// pair (refresh). Both must land in one transaction.
    RotateTokens {
        invalidate_id: i64,
        refresh: CreateRefreshToken,
        access: CreateAccessToken,
        guard: Option<UserLockGuard>,
    },
    /// Delete a description chain, cascading to all its refresh and access
    /// tokens (reuse detection response).
    RevokeChain { description_id: i64 },
}

impl StoreOperation {
    /// Operation name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InsertOrder(_) => "insert_order",
            Self::InsertTokens { .. } => "insert_tokens",
            Self::RotateTokens { .. } => "rotate_tokens",
            Self::RevokeChain { .. } => "revoke_chain",
        }
    }

    /// Execute the operation against the worker's connection.
    ///
    /// Any lock guard travelling with the operation is dropped when this
    /// returns, on success and on failure alike.
    pub async fn execute(self, conn: &mut SqliteConnection) -> DbResult<()> {
        match self {
            Self::InsertOrder(order) => insert_order(conn, order).await,
            Self::InsertTokens {
                refresh,
                access,
                guard,
            } => {
                let result = insert_token_pair(conn, None, refresh, access).await;
                drop(guard);
                result
            }
            Self::RotateTokens {
                invalidate_id,
                refresh,
                access,
                guard,
            } => {
                let result = insert_token_pair(conn, Some(invalidate_id), refresh, access).await;
                drop(guard);
                result
            }
            Self::RevokeChain { description_id } => revoke_chain(conn, description_id).await,
        }
    }
}

impl std::fmt::Debug for StoreOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreOperation")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

async fn insert_token_pair(
    conn: &mut SqliteConnection,
    invalidate_id: Option<i64>,
    refresh: CreateRefreshToken,
    access: CreateAccessToken,
) -> DbResult<()> {
    let mut tx = conn.begin().await?;

    if let Some(old_id) = invalidate_id {
        sqlx::query("UPDATE refresh_token SET valid = 0 WHERE refresh_token_id = ?")
            .bind(old_id)
            .execute(&mut *tx)
            .await?;
    }

    let description_id = match refresh.description {
        NewDescription::Existing(id) => id,
        NewDescription::Create {
            user_id,
            device_description,
        } => {
            sqlx::query(
                r#"
                INSERT INTO refresh_token_description (user_id, device_description)
                VALUES (?, ?)
                "#,
            )
            .bind(user_id)
            .bind(&device_description)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid()
        }
    };

    // The refresh token row must exist before the access token can
    // reference it.
    let refresh_token_id = sqlx::query(
        r#"
        INSERT INTO refresh_token (originated_from, token_hash, valid, issuing_time, description_id)
        VALUES (?, ?, 1, ?, ?)
        "#,
    )
    .bind(refresh.originated_from)
    .bind(&refresh.token_hash)
    .bind(refresh.issuing_time)
    .bind(description_id)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    sqlx::query(
        r#"
        INSERT INTO access_token (refresh_token_id, token_hash, expiration_time)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(refresh_token_id)
    .bind(&access.token_hash)
    .bind(access.expiration_time)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

async fn revoke_chain(conn: &mut SqliteConnection, description_id: i64) -> DbResult<()> {
    sqlx::query("DELETE FROM refresh_token_description WHERE description_id = ?")
        .bind(description_id)
        .execute(conn)
        .await?;
    Ok(())
}

async fn insert_order(conn: &mut SqliteConnection, order: CreateOrder) -> DbResult<()> {
    let mut tx = conn.begin().await?;

    let order_id = sqlx::query(
        r#"
        INSERT INTO order_details (first_name, last_name, street, city, postal_code)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&order.first_name)
    .bind(&order.last_name)
    .bind(&order.street)
    .bind(&order.city)
    .bind(&order.postal_code)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    for item in &order.items {
        sqlx::query(
            r#"
            INSERT INTO order_item (order_id, item_id, unit_price, quantity)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(order_id)
        .bind(item.item_id)
        .bind(item.unit_price)
        .bind(item.quantity)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// The queue is full; the operation was rejected and any lock guard it
/// carried has been released.
#[derive(Debug, thiserror::Error)]
#[error("store queue is full")]
pub struct QueueFull;

/// Producer handle for the store queue
#[derive(Clone)]
pub struct StoreQueue {
    tx: mpsc::Sender<StoreOperation>,
}

impl StoreQueue {
    /// Create a bounded queue. The receiver goes to the worker.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<StoreOperation>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Try to enqueue an operation without blocking.
    ///
    /// A full (or closed) queue surfaces as [`QueueFull`]; the rejected
    /// operation is dropped here, which releases any lock guard it carried.
    pub fn submit(&self, op: StoreOperation) -> Result<(), QueueFull> {
        self.tx.try_send(op).map_err(|err| {
            let rejected = match &err {
                mpsc::error::TrySendError::Full(op) => op,
                mpsc::error::TrySendError::Closed(op) => op,
            };
            tracing::warn!(operation = rejected.kind(), "store queue rejected operation");
            QueueFull
        })
    }
}

/// Pop and execute queued operations until the queue is momentarily empty.
///
/// A failing operation is logged and skipped; it must not take the worker
/// down with it. Returns the number of operations executed. Draining an
/// empty queue is a no-op.
pub async fn drain_queue(
    rx: &mut mpsc::Receiver<StoreOperation>,
    conn: &mut SqliteConnection,
) -> usize {
    let mut executed = 0;
    loop {
        let op = match rx.try_recv() {
            Ok(op) => op,
            Err(_) => break,
        };
        let kind = op.kind();
        if let Err(err) = op.execute(conn).await {
            tracing::error!(operation = kind, error = %err, "store operation failed");
        }
        executed += 1;
    }
    executed
}

/// Run the store worker until cancelled.
///
/// The worker exclusively owns `conn` for its whole lifetime. Between
/// drains it waits on the cancellation token with a bounded timeout so an
/// empty queue is re-checked every `refresh_interval`.
pub async fn run_store_worker(
    mut conn: PoolConnection<Sqlite>,
    mut rx: mpsc::Receiver<StoreOperation>,
    cancel: CancellationToken,
    refresh_interval: Duration,
) {
    tracing::debug!("store worker started");
    loop {
        drain_queue(&mut rx, &mut conn).await;

        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(refresh_interval) => {}
        }
    }
    tracing::info!("store worker shut down");
}
