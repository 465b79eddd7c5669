use crate::errors::Result;
use crate::models::{Category, Item, ItemType};
use async_trait::async_trait;

/// Durable access to the item collection and its deletion archive.
///
/// Implementations serialize every operation behind a single lock so a
/// read-modify-write span is never interleaved with another caller's.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Item>>;
    async fn get_by_id(&self, id: i32) -> Result<Option<Item>>;
    async fn search(&self, query: &str) -> Result<Vec<Item>>;
    /// Assigns the id and `created_at`; both are overwritten in the input.
    async fn add(&self, item: Item) -> Result<Item>;
    /// Overwrites the stored item, keeping its `created_at` and
    /// `product_code` and stamping `updated_at`. `None` if the id is absent.
    async fn update(&self, item: Item) -> Result<Option<Item>>;
    /// Removes the item and archives a full copy; `false` if the id is absent.
    async fn delete(&self, id: i32) -> Result<bool>;
}

/// Read-only access to the type and category reference data.
#[async_trait]
pub trait LookupStore: Send + Sync {
    async fn all_types(&self) -> Result<Vec<ItemType>>;
    async fn all_categories(&self) -> Result<Vec<Category>>;
    async fn category_by_id(&self, id: i32) -> Result<Option<Category>>;
    async fn categories_by_type(&self, type_id: i32) -> Result<Vec<Category>>;
}

/// Case-insensitive substring match over name, description and product code.
pub(crate) fn matches_query(item: &Item, query: &str) -> bool {
    let needle = query.to_lowercase();
    item.name.to_lowercase().contains(&needle)
        || item.description.to_lowercase().contains(&needle)
        || item.product_code.to_lowercase().contains(&needle)
}

/// Next id: one past the highest live id, starting at 1.
pub(crate) fn next_id(items: &[Item]) -> i32 {
    items.iter().map(|i| i.id).max().unwrap_or(0) + 1
}

pub mod json;
pub mod memory;
