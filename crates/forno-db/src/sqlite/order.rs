//! SQLite order repository implementation

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error::DbResult;
use crate::models::{OrderItemRow, OrderRecord, OrderRow};
use crate::repo::OrderRepository;

/// SQLite order repository
#[derive(Clone)]
pub struct SqliteOrderRepository {
    pool: SqlitePool,
}

impl SqliteOrderRepository {
    /// Create a new order repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for SqliteOrderRepository {
    async fn all_orders(&self) -> DbResult<Vec<OrderRecord>> {
        let orders = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT order_id, first_name, last_name, street, city, postal_code
            FROM order_details
            ORDER BY order_id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(orders.len());
        for order in orders {
            let items = sqlx::query_as::<_, OrderItemRow>(
                r#"
                SELECT order_item_id, order_id, item_id, unit_price, quantity
                FROM order_item
                WHERE order_id = ?
                ORDER BY order_item_id
                "#,
            )
            .bind(order.order_id)
            .fetch_all(&self.pool)
            .await?;

            records.push(OrderRecord { order, items });
        }

        Ok(records)
    }
}
