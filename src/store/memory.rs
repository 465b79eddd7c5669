use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::errors::Result;
use crate::models::{Category, DeletedItem, Item, ItemType};
use crate::store::{matches_query, next_id, ItemStore, LookupStore};

/// In-memory item store with the same contract as the file-backed one.
#[derive(Clone, Default)]
pub struct MemoryItemStore {
    items: Arc<Mutex<Vec<Item>>>,
    archive: Arc<Mutex<Vec<DeletedItem>>>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the deletion archive, oldest first.
    pub fn archived(&self) -> Vec<DeletedItem> {
        self.archive.lock().unwrap().clone()
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn get_all(&self) -> Result<Vec<Item>> {
        Ok(self.items.lock().unwrap().clone())
    }

    async fn get_by_id(&self, id: i32) -> Result<Option<Item>> {
        let items = self.items.lock().unwrap();
        Ok(items.iter().find(|i| i.id == id).cloned())
    }

    async fn search(&self, query: &str) -> Result<Vec<Item>> {
        let items = self.items.lock().unwrap();
        Ok(items
            .iter()
            .filter(|i| matches_query(i, query))
            .cloned()
            .collect())
    }

    async fn add(&self, mut item: Item) -> Result<Item> {
        let mut items = self.items.lock().unwrap();
        item.id = next_id(&items);
        item.created_at = Utc::now();
        items.push(item.clone());
        Ok(item)
    }

    async fn update(&self, mut item: Item) -> Result<Option<Item>> {
        let mut items = self.items.lock().unwrap();
        match items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => {
                item.created_at = existing.created_at;
                item.product_code = existing.product_code.clone();
                item.updated_at = Some(Utc::now());
                *existing = item.clone();
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: i32) -> Result<bool> {
        let mut items = self.items.lock().unwrap();
        match items.iter().position(|i| i.id == id) {
            Some(index) => {
                let item = items.remove(index);
                self.archive.lock().unwrap().push(DeletedItem {
                    item,
                    deleted_at: Utc::now(),
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Fixed reference data for tests and embedding.
#[derive(Clone, Default)]
pub struct MemoryLookupStore {
    types: Vec<ItemType>,
    categories: Vec<Category>,
}

impl MemoryLookupStore {
    pub fn new(types: Vec<ItemType>, categories: Vec<Category>) -> Self {
        Self { types, categories }
    }
}

#[async_trait]
impl LookupStore for MemoryLookupStore {
    async fn all_types(&self) -> Result<Vec<ItemType>> {
        Ok(self.types.clone())
    }

    async fn all_categories(&self) -> Result<Vec<Category>> {
        Ok(self.categories.clone())
    }

    async fn category_by_id(&self, id: i32) -> Result<Option<Category>> {
        Ok(self.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn categories_by_type(&self, type_id: i32) -> Result<Vec<Category>> {
        Ok(self
            .categories
            .iter()
            .filter(|c| c.type_id == type_id)
            .cloned()
            .collect())
    }
}
