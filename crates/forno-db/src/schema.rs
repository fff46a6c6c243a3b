//! Schema bootstrap
//!
//! Creates the tables required by the backend if they are missing. The
//! statements are idempotent so startup can run them unconditionally.

use sqlx::SqliteConnection;

use crate::error::DbResult;

/// Tables the backend requires to operate.
pub const REQUIRED_TABLES: &[&str] = &[
    "delivery_user",
    "refresh_token_description",
    "refresh_token",
    "access_token",
    "category",
    "item",
    "item_price",
    "item_speciality",
    "order_details",
    "order_item",
];

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS delivery_user (
    user_id INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    pw_hash TEXT NOT NULL,
    date_created INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS refresh_token_description (
    description_id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES delivery_user(user_id) ON DELETE CASCADE,
    device_description TEXT
);

CREATE TABLE IF NOT EXISTS refresh_token (
    refresh_token_id INTEGER PRIMARY KEY,
    originated_from INTEGER REFERENCES refresh_token(refresh_token_id) ON DELETE SET NULL,
    token_hash TEXT NOT NULL UNIQUE,
    valid INTEGER NOT NULL,
    issuing_time INTEGER NOT NULL,
    description_id INTEGER NOT NULL
        REFERENCES refresh_token_description(description_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS access_token (
    access_token_id INTEGER PRIMARY KEY,
    refresh_token_id INTEGER NOT NULL
        REFERENCES refresh_token(refresh_token_id) ON DELETE CASCADE,
    token_hash TEXT NOT NULL UNIQUE,
    expiration_time INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS category (
    category_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS item (
    item_id INTEGER PRIMARY KEY,
    category_id INTEGER NOT NULL REFERENCES category(category_id),
    name TEXT NOT NULL,
    image_name TEXT,
    ingredient_description TEXT
);

CREATE TABLE IF NOT EXISTS item_price (
    item_id INTEGER NOT NULL REFERENCES item(item_id),
    price_id INTEGER NOT NULL,
    price REAL NOT NULL,
    PRIMARY KEY (item_id, price_id)
);

CREATE TABLE IF NOT EXISTS item_speciality (
    item_id INTEGER PRIMARY KEY REFERENCES item(item_id),
    vegetarian INTEGER NOT NULL,
    vegan INTEGER NOT NULL,
    spicy INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS order_details (
    order_id INTEGER PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    street TEXT NOT NULL,
    city TEXT NOT NULL,
    postal_code TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS order_item (
    order_item_id INTEGER PRIMARY KEY,
    order_id INTEGER NOT NULL REFERENCES order_details(order_id) ON DELETE CASCADE,
    item_id INTEGER REFERENCES item(item_id) ON DELETE SET NULL,
    unit_price REAL NOT NULL,
    quantity INTEGER NOT NULL
);
"#;

/// Create all missing tables.
pub async fn ensure_schema(conn: &mut SqliteConnection) -> DbResult<()> {
    sqlx::raw_sql(SCHEMA_SQL).execute(&mut *conn).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Connection;

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();
        ensure_schema(&mut conn).await.unwrap();
        ensure_schema(&mut conn).await.unwrap();
    }

    #[tokio::test]
    async fn test_all_required_tables_created() {
        let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();
        ensure_schema(&mut conn).await.unwrap();

        for table in REQUIRED_TABLES {
            let found: Option<(String,)> = sqlx::query_as(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
            )
            .bind(table)
            .fetch_optional(&mut conn)
            .await
            .unwrap();
            assert!(found.is_some(), "missing table {table}");
        }
    }
}
