//! HTTP handlers

mod auth;
mod catalog;
mod health;
mod order;

pub use auth::{login, refresh};
pub use catalog::get_catalog;
pub use health::{health, ready};
pub use order::{list_orders, make_order};
