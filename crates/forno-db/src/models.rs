//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.
//! Timestamps are stored as unix seconds, matching the wire format of the
//! token expiration fields.

use sqlx::FromRow;

/// Delivery user row
#[derive(Debug, Clone, FromRow)]
pub struct DeliveryUserRow {
    pub user_id: i64,
    pub username: String,
    /// PHC-format password hash. Never leaves the data layer.
    pub pw_hash: String,
    pub date_created: i64,
}

/// Refresh token description row.
///
/// One description is shared by every refresh token of a rotation chain,
/// so per-device metadata is stored once instead of per token.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshTokenDescriptionRow {
    pub description_id: i64,
    pub user_id: i64,
    pub device_description: Option<String>,
}

/// Refresh token row. Only the keyed hash of the secret is stored.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshTokenRow {
    pub refresh_token_id: i64,
    /// Id of the refresh token this one was rotated from, if any.
    pub originated_from: Option<i64>,
    pub token_hash: String,
    pub valid: bool,
    pub issuing_time: i64,
    pub description_id: i64,
}

/// Access token row. Only the keyed hash of the secret is stored.
#[derive(Debug, Clone, FromRow)]
pub struct AccessTokenRow {
    pub access_token_id: i64,
    pub refresh_token_id: i64,
    pub token_hash: String,
    pub expiration_time: i64,
}

/// Catalog category row
#[derive(Debug, Clone, FromRow)]
pub struct CategoryRow {
    pub category_id: i64,
    pub name: String,
}

/// Catalog item row
#[derive(Debug, Clone, FromRow)]
pub struct ItemRow {
    pub item_id: i64,
    pub category_id: i64,
    pub name: String,
    pub image_name: Option<String>,
    pub ingredient_description: Option<String>,
}

/// Item price row. An item can have several price points.
#[derive(Debug, Clone, FromRow)]
pub struct ItemPriceRow {
    pub item_id: i64,
    pub price_id: i64,
    pub price: f64,
}

/// Item speciality row
#[derive(Debug, Clone, FromRow)]
pub struct ItemSpecialityRow {
    pub item_id: i64,
    pub vegetarian: bool,
    pub vegan: bool,
    pub spicy: bool,
}

/// Order row. Contact and address data live on the order itself because
/// ordering does not require an account.
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub order_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
}

/// Ordered item row. The unit price is copied at order time because the
/// catalog price may change later.
#[derive(Debug, Clone, FromRow)]
pub struct OrderItemRow {
    pub order_item_id: i64,
    pub order_id: i64,
    pub item_id: Option<i64>,
    pub unit_price: f64,
    pub quantity: i64,
}

/// An order together with its items
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub order: OrderRow,
    pub items: Vec<OrderItemRow>,
}

/// An item with its prices and optional speciality
#[derive(Debug, Clone)]
pub struct ItemRecord {
    pub item: ItemRow,
    pub prices: Vec<f64>,
    pub speciality: Option<ItemSpecialityRow>,
}

/// A category with all its items
#[derive(Debug, Clone)]
pub struct CategoryRecord {
    pub category: CategoryRow,
    pub items: Vec<ItemRecord>,
}
