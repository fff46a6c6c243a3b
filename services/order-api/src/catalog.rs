//! In-memory catalog snapshot
//!
//! The catalog is read-mostly and small, so it is loaded once at startup
//! and served from memory: the JSON response is rendered once and the set
//! of known item ids is kept for order validation.

use std::collections::HashMap;

use forno_db::{CatalogRepository, DbResult};
use serde_json::{json, Map, Value};

/// Loaded catalog: pre-rendered response plus an item price index.
#[derive(Debug, Clone)]
pub struct Catalog {
    response: Value,
    item_prices: HashMap<i64, Vec<f64>>,
}

impl Catalog {
    /// Load the catalog through a repository.
    pub async fn load(repo: &impl CatalogRepository) -> DbResult<Self> {
        let categories = repo.load().await?;

        let mut item_prices = HashMap::new();
        let mut rendered = Map::new();
        for category in &categories {
            let mut all_items = Vec::new();
            for record in &category.items {
                item_prices.insert(record.item.item_id, record.prices.clone());

                // Items without a speciality row get a default one so the
                // JSON structure stays uniform.
                let speciality = match &record.speciality {
                    Some(row) => json!({
                        "vegetarian": row.vegetarian,
                        "vegan": row.vegan,
                        "spicy": row.spicy,
                    }),
                    None => json!({
                        "vegetarian": false,
                        "vegan": false,
                        "spicy": false,
                    }),
                };
                all_items.push(json!({
                    "id": record.item.item_id,
                    "name": record.item.name,
                    "image_name": record.item.image_name,
                    "ingredient_description": record.item.ingredient_description,
                    "prices": record.prices,
                    "speciality": speciality,
                }));
            }
            rendered.insert(
                category.category.name.to_lowercase(),
                json!({
                    "category_id": category.category.category_id,
                    "all_items": all_items,
                }),
            );
        }

        Ok(Self {
            response: json!({ "categories": rendered }),
            item_prices,
        })
    }

    /// The pre-rendered catalog response
    pub fn response(&self) -> &Value {
        &self.response
    }

    /// Whether an item id exists in the catalog
    pub fn contains_item(&self, item_id: i64) -> bool {
        self.item_prices.contains_key(&item_id)
    }

    /// Lowest listed price for an item, if the item exists and has prices
    pub fn base_price(&self, item_id: i64) -> Option<f64> {
        self.item_prices
            .get(&item_id)?
            .iter()
            .copied()
            .min_by(|a, b| a.total_cmp(b))
    }
}
