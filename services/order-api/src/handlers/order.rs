//! Order handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use forno_db::store::{CreateOrder, CreateOrderItem, StoreOperation};
use forno_db::{OrderRecord, OrderRepository};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const MAX_ORDER_ITEMS: usize = 50;

#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    pub details: OrderDetails,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct OrderDetails {
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
}

#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub item_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<OrderJson>,
    pub time: i64,
}

#[derive(Debug, Serialize)]
pub struct OrderJson {
    pub order_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub items: Vec<OrderItemJson>,
}

#[derive(Debug, Serialize)]
pub struct OrderItemJson {
    pub item_id: Option<i64>,
    pub unit_price: f64,
    pub quantity: i64,
}

/// Turn a request body into a store operation, or reject it.
///
/// An order is valid when all detail fields are non-empty, the postal code
/// is purely numeric, the item count is within range and every item id
/// exists in the catalog.
fn validate_order(catalog: &Catalog, req: OrderRequest) -> Result<CreateOrder, ApiError> {
    if req.items.is_empty() || req.items.len() > MAX_ORDER_ITEMS {
        tracing::debug!(items = req.items.len(), "item count out of range");
        return Err(ApiError::OrderNotValid);
    }

    let details = &req.details;
    let fields = [
        &details.first_name,
        &details.last_name,
        &details.street,
        &details.city,
        &details.postal_code,
    ];
    if fields.iter().any(|field| field.trim().is_empty()) {
        tracing::debug!("order details have empty fields");
        return Err(ApiError::OrderNotValid);
    }
    if !details.postal_code.chars().all(|c| c.is_ascii_digit()) {
        tracing::debug!("postal code contains non-digit characters");
        return Err(ApiError::OrderNotValid);
    }

    let mut items = Vec::with_capacity(req.items.len());
    for item in &req.items {
        if item.quantity < 1 {
            return Err(ApiError::OrderNotValid);
        }
        let unit_price = match catalog.base_price(item.item_id) {
            Some(price) => price,
            None => {
                tracing::info!(item_id = item.item_id, "item id not found in catalog");
                return Err(ApiError::OrderNotValid);
            }
        };
        items.push(CreateOrderItem {
            item_id: item.item_id,
            unit_price,
            quantity: item.quantity,
        });
    }

    Ok(CreateOrder {
        first_name: req.details.first_name,
        last_name: req.details.last_name,
        street: req.details.street,
        city: req.details.city,
        postal_code: req.details.postal_code,
        items,
    })
}

/// POST /order
///
/// Hand in a new order. The order is answered before it is persisted; the
/// store worker writes it in the background.
pub async fn make_order(
    State(state): State<AppState>,
    body: Result<Json<OrderRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(req) = body.map_err(|err| ApiError::BadRequest(err.to_string()))?;
    let order = validate_order(&state.catalog, req)?;

    state.queue.submit(StoreOperation::InsertOrder(order))?;
    tracing::debug!("order handed to store queue");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /orders
///
/// List all orders for delivery users. Requires a valid access token.
pub async fn list_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<OrdersResponse>> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    state.auth.check_access(authorization).await?;

    let orders = state.repos.orders.all_orders().await?;
    Ok(Json(OrdersResponse {
        orders: orders.into_iter().map(order_json).collect(),
        time: Utc::now().timestamp(),
    }))
}

fn order_json(record: OrderRecord) -> OrderJson {
    OrderJson {
        order_id: record.order.order_id,
        first_name: record.order.first_name,
        last_name: record.order.last_name,
        street: record.order.street,
        city: record.order.city,
        postal_code: record.order.postal_code,
        items: record
            .items
            .into_iter()
            .map(|item| OrderItemJson {
                item_id: item.item_id,
                unit_price: item.unit_price,
                quantity: item.quantity,
            })
            .collect(),
    }
}
