//! SQLite catalog repository implementation

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error::DbResult;
use crate::models::{
    CategoryRecord, CategoryRow, ItemPriceRow, ItemRecord, ItemRow, ItemSpecialityRow,
};
use crate::repo::CatalogRepository;

/// SQLite catalog repository
#[derive(Clone)]
pub struct SqliteCatalogRepository {
    pool: SqlitePool,
}

impl SqliteCatalogRepository {
    /// Create a new catalog repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for SqliteCatalogRepository {
    async fn load(&self) -> DbResult<Vec<CategoryRecord>> {
        let categories = sqlx::query_as::<_, CategoryRow>(
            "SELECT category_id, name FROM category ORDER BY category_id",
        )
        .fetch_all(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT item_id, category_id, name, image_name, ingredient_description
            FROM item
            ORDER BY item_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let prices = sqlx::query_as::<_, ItemPriceRow>(
            "SELECT item_id, price_id, price FROM item_price ORDER BY item_id, price_id",
        )
        .fetch_all(&self.pool)
        .await?;

        let specialities = sqlx::query_as::<_, ItemSpecialityRow>(
            "SELECT item_id, vegetarian, vegan, spicy FROM item_speciality",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut prices_by_item: HashMap<i64, Vec<f64>> = HashMap::new();
        for price in prices {
            prices_by_item.entry(price.item_id).or_default().push(price.price);
        }
        let mut speciality_by_item: HashMap<i64, ItemSpecialityRow> = specialities
            .into_iter()
            .map(|row| (row.item_id, row))
            .collect();

        let mut items_by_category: HashMap<i64, Vec<ItemRecord>> = HashMap::new();
        for item in items {
            let record = ItemRecord {
                prices: prices_by_item.remove(&item.item_id).unwrap_or_default(),
                speciality: speciality_by_item.remove(&item.item_id),
                item,
            };
            items_by_category
                .entry(record.item.category_id)
                .or_default()
                .push(record);
        }

        let records = categories
            .into_iter()
            .map(|category| CategoryRecord {
                items: items_by_category
                    .remove(&category.category_id)
                    .unwrap_or_default(),
                category,
            })
            .collect();

        Ok(records)
    }
}
