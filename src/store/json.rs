use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::sync::Mutex;

use crate::errors::Result;
use crate::models::{Category, DeletedItem, Item, ItemType};
use crate::store::{matches_query, next_id, ItemStore, LookupStore};

async fn read_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };
    Ok(serde_json::from_slice(&bytes)?)
}

async fn write_list<T: Serialize>(path: &Path, list: &[T]) -> Result<()> {
    let json = serde_json::to_vec_pretty(list)?;
    fs::write(path, json).await?;
    Ok(())
}

/// Item store backed by a pair of JSON files: the live collection and the
/// append-only deletion archive.
pub struct JsonItemStore {
    items_path: PathBuf,
    deleted_path: PathBuf,
    // held across each whole read-modify-write span against the files
    lock: Mutex<()>,
}

impl JsonItemStore {
    pub fn new(items_path: impl Into<PathBuf>, deleted_path: impl Into<PathBuf>) -> Self {
        Self {
            items_path: items_path.into(),
            deleted_path: deleted_path.into(),
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl ItemStore for JsonItemStore {
    async fn get_all(&self) -> Result<Vec<Item>> {
        let _guard = self.lock.lock().await;
        read_list(&self.items_path).await
    }

    async fn get_by_id(&self, id: i32) -> Result<Option<Item>> {
        let _guard = self.lock.lock().await;
        let items: Vec<Item> = read_list(&self.items_path).await?;
        Ok(items.into_iter().find(|i| i.id == id))
    }

    async fn search(&self, query: &str) -> Result<Vec<Item>> {
        let _guard = self.lock.lock().await;
        let items: Vec<Item> = read_list(&self.items_path).await?;
        Ok(items
            .into_iter()
            .filter(|i| matches_query(i, query))
            .collect())
    }

    async fn add(&self, mut item: Item) -> Result<Item> {
        let _guard = self.lock.lock().await;
        let mut items: Vec<Item> = read_list(&self.items_path).await?;
        item.id = next_id(&items);
        item.created_at = Utc::now();
        items.push(item.clone());
        write_list(&self.items_path, &items).await?;
        Ok(item)
    }

    async fn update(&self, mut item: Item) -> Result<Option<Item>> {
        let _guard = self.lock.lock().await;
        let mut items: Vec<Item> = read_list(&self.items_path).await?;
        let index = match items.iter().position(|i| i.id == item.id) {
            Some(index) => index,
            None => return Ok(None),
        };
        item.created_at = items[index].created_at;
        item.product_code = items[index].product_code.clone();
        item.updated_at = Some(Utc::now());
        items[index] = item.clone();
        write_list(&self.items_path, &items).await?;
        Ok(Some(item))
    }

    async fn delete(&self, id: i32) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut items: Vec<Item> = read_list(&self.items_path).await?;
        let index = match items.iter().position(|i| i.id == id) {
            Some(index) => index,
            None => return Ok(false),
        };
        let item = items.remove(index);
        write_list(&self.items_path, &items).await?;

        let mut deleted: Vec<DeletedItem> = read_list(&self.deleted_path).await?;
        deleted.push(DeletedItem {
            item,
            deleted_at: Utc::now(),
        });
        write_list(&self.deleted_path, &deleted).await?;
        Ok(true)
    }
}

/// One reference-data file, parsed once and kept for the store's lifetime.
/// Edits to the file after the first read are deliberately not picked up.
struct FileCache<T> {
    path: PathBuf,
    cache: Mutex<Option<Vec<T>>>,
}

impl<T: DeserializeOwned + Clone> FileCache<T> {
    fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    async fn load(&self) -> Result<Vec<T>> {
        let mut cache = self.cache.lock().await;
        if let Some(list) = cache.as_ref() {
            return Ok(list.clone());
        }
        if !fs::try_exists(&self.path).await? {
            return Ok(Vec::new());
        }
        let list: Vec<T> = read_list(&self.path).await?;
        *cache = Some(list.clone());
        Ok(list)
    }
}

/// Lookup store over the types and categories reference files.
pub struct JsonLookupStore {
    types: FileCache<ItemType>,
    categories: FileCache<Category>,
}

impl JsonLookupStore {
    pub fn new(types_path: impl Into<PathBuf>, categories_path: impl Into<PathBuf>) -> Self {
        Self {
            types: FileCache::new(types_path),
            categories: FileCache::new(categories_path),
        }
    }
}

#[async_trait]
impl LookupStore for JsonLookupStore {
    async fn all_types(&self) -> Result<Vec<ItemType>> {
        self.types.load().await
    }

    async fn all_categories(&self) -> Result<Vec<Category>> {
        self.categories.load().await
    }

    async fn category_by_id(&self, id: i32) -> Result<Option<Category>> {
        let categories = self.categories.load().await?;
        Ok(categories.into_iter().find(|c| c.id == id))
    }

    async fn categories_by_type(&self, type_id: i32) -> Result<Vec<Category>> {
        let categories = self.categories.load().await?;
        Ok(categories
            .into_iter()
            .filter(|c| c.type_id == type_id)
            .collect())
    }
}
