//! Caching wrapper around the remote item client.

use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::client::ItemApiClient;
use crate::errors::{Error, Result};
use crate::models::{Category, ItemDetails, ItemDraft, ItemType};

/// Wraps an [`ItemApiClient`] and shadows every successful read onto disk,
/// one snapshot file per query shape, so the dashboard keeps rendering the
/// last known data while the server is unreachable.
///
/// Writes are not cached; they go straight to the inner client.
pub struct CachedItemClient<C: ItemApiClient> {
    inner: C,
    cache_dir: PathBuf,
    /// Layer-wide flag, rewritten by every read: a success clears it, a
    /// transport failure sets it.
    offline: AtomicBool,
    // one lock for every snapshot read and write under `cache_dir`
    lock: Arc<Mutex<()>>,
}

impl<C: ItemApiClient> CachedItemClient<C> {
    pub fn new(inner: C, cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let cache_dir = cache_dir.into();
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            inner,
            cache_dir,
            offline: AtomicBool::new(false),
            lock: Arc::new(Mutex::new(())),
        })
    }

    /// Whether the most recent read fell back to a local snapshot.
    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    async fn get_with_cache<T, F, Fut>(&self, file_name: &str, call: F) -> Result<Vec<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        match call().await {
            Ok(result) => {
                self.offline.store(false, Ordering::SeqCst);
                self.persist_detached(file_name, &result);
                Ok(result)
            }
            Err(Error::Transport(reason)) => {
                self.offline.store(true, Ordering::SeqCst);
                debug!(%reason, snapshot = file_name, "server unreachable, serving cached snapshot");
                Ok(self.read_snapshot(file_name).await)
            }
            Err(other) => Err(other),
        }
    }

    /// Queue the snapshot write without awaiting it. The caller gets the
    /// fresh result immediately; a failed write is logged and otherwise
    /// unobservable.
    fn persist_detached<T: Serialize>(&self, file_name: &str, data: &[T]) {
        let json = match serde_json::to_vec_pretty(data) {
            Ok(json) => json,
            Err(err) => {
                debug!(snapshot = file_name, error = %err, "skipping cache write");
                return;
            }
        };
        let path = self.cache_dir.join(file_name);
        let lock = Arc::clone(&self.lock);
        tokio::spawn(async move {
            let _guard = lock.lock().await;
            if let Err(err) = fs::write(&path, json).await {
                debug!(path = %path.display(), error = %err, "cache write failed");
            }
        });
    }

    /// Last persisted snapshot for the query shape, or empty. This path
    /// never errors; an unreadable or corrupt snapshot reads as empty.
    async fn read_snapshot<T: DeserializeOwned>(&self, file_name: &str) -> Vec<T> {
        let path = self.cache_dir.join(file_name);
        let _guard = self.lock.lock().await;
        match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait]
impl<C: ItemApiClient> ItemApiClient for CachedItemClient<C> {
    async fn list_items(&self) -> Result<Vec<ItemDetails>> {
        self.get_with_cache("items.json", || self.inner.list_items())
            .await
    }

    async fn create_item(&self, draft: &ItemDraft) -> Result<ItemDetails> {
        self.inner.create_item(draft).await
    }

    async fn update_item(&self, id: i32, draft: &ItemDraft) -> Result<Option<ItemDetails>> {
        self.inner.update_item(id, draft).await
    }

    async fn delete_item(&self, id: i32) -> Result<bool> {
        self.inner.delete_item(id).await
    }

    async fn list_types(&self) -> Result<Vec<ItemType>> {
        self.get_with_cache("types.json", || self.inner.list_types())
            .await
    }

    async fn list_categories(&self, type_id: Option<i32>) -> Result<Vec<Category>> {
        let file_name = match type_id {
            Some(type_id) => format!("categories-{type_id}.json"),
            None => "categories.json".to_string(),
        };
        self.get_with_cache(&file_name, || self.inner.list_categories(type_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::time::sleep;

    #[derive(Clone, Copy)]
    enum Mode {
        Online,
        Unreachable,
        ServerError,
    }

    /// Inner client whose behavior is switched between calls.
    struct ScriptedClient {
        items: Vec<ItemDetails>,
        mode: std::sync::Mutex<Mode>,
    }

    impl ScriptedClient {
        fn new(items: Vec<ItemDetails>) -> Self {
            Self {
                items,
                mode: std::sync::Mutex::new(Mode::Online),
            }
        }

        fn set_mode(&self, mode: Mode) {
            *self.mode.lock().unwrap() = mode;
        }

        fn fail<T>(&self) -> Option<Result<T, Error>> {
            match *self.mode.lock().unwrap() {
                Mode::Online => None,
                Mode::Unreachable => Some(Err(Error::Transport("connection refused".to_string()))),
                Mode::ServerError => Some(Err(Error::Api("boom".to_string()))),
            }
        }
    }

    #[async_trait]
    impl ItemApiClient for ScriptedClient {
        async fn list_items(&self) -> Result<Vec<ItemDetails>, Error> {
            self.fail().unwrap_or_else(|| Ok(self.items.clone()))
        }

        async fn create_item(&self, _draft: &ItemDraft) -> Result<ItemDetails, Error> {
            self.fail()
                .unwrap_or_else(|| Ok(self.items[0].clone()))
        }

        async fn update_item(
            &self,
            _id: i32,
            _draft: &ItemDraft,
        ) -> Result<Option<ItemDetails>, Error> {
            self.fail().unwrap_or(Ok(None))
        }

        async fn delete_item(&self, _id: i32) -> Result<bool, Error> {
            self.fail().unwrap_or(Ok(true))
        }

        async fn list_types(&self) -> Result<Vec<ItemType>, Error> {
            self.fail().unwrap_or_else(|| {
                Ok(vec![ItemType {
                    id: 1,
                    name: "Electronics".to_string(),
                }])
            })
        }

        async fn list_categories(&self, type_id: Option<i32>) -> Result<Vec<Category>, Error> {
            self.fail().unwrap_or_else(|| {
                let all = vec![
                    Category {
                        id: 1,
                        name: "Phones".to_string(),
                        prefix: "PHN".to_string(),
                        type_id: 1,
                    },
                    Category {
                        id: 2,
                        name: "Desks".to_string(),
                        prefix: "DSK".to_string(),
                        type_id: 2,
                    },
                ];
                Ok(match type_id {
                    Some(t) => all.into_iter().filter(|c| c.type_id == t).collect(),
                    None => all,
                })
            })
        }
    }

    fn sample_items() -> Vec<ItemDetails> {
        vec![ItemDetails {
            id: 1,
            name: "Phone A".to_string(),
            description: "D1".to_string(),
            type_id: 1,
            type_name: "Electronics".to_string(),
            category_id: 1,
            category_name: "Phones".to_string(),
            product_code: "PHN-001".to_string(),
            price: Decimal::new(10, 0),
            quantity: 1,
            discount: Decimal::ZERO,
            discount_date: None,
            created_at: Utc::now(),
            updated_at: None,
        }]
    }

    fn draft() -> ItemDraft {
        ItemDraft {
            name: "Phone A".to_string(),
            description: "D1".to_string(),
            type_id: 1,
            category_id: 1,
            price: Decimal::new(10, 0),
            quantity: 1,
            discount: Decimal::ZERO,
        }
    }

    #[tokio::test]
    async fn test_online_read_returns_fresh_and_persists() -> Result<()> {
        let dir = tempdir()?;
        let cached = CachedItemClient::new(ScriptedClient::new(sample_items()), dir.path())?;

        let items = cached.list_items().await?;
        assert_eq!(items.len(), 1);
        assert!(!cached.is_offline());

        // Give the detached write time to land.
        sleep(Duration::from_millis(100)).await;
        assert!(dir.path().join("items.json").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_offline_read_serves_the_last_snapshot() -> Result<()> {
        let dir = tempdir()?;
        let inner = ScriptedClient::new(sample_items());
        let cached = CachedItemClient::new(inner, dir.path())?;

        cached.list_items().await?;
        sleep(Duration::from_millis(100)).await;

        cached.inner.set_mode(Mode::Unreachable);
        let items = cached.list_items().await?;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Phone A");
        assert!(cached.is_offline());

        // Back online: fresh data, flag cleared.
        cached.inner.set_mode(Mode::Online);
        let items = cached.list_items().await?;
        assert_eq!(items.len(), 1);
        assert!(!cached.is_offline());
        Ok(())
    }

    #[tokio::test]
    async fn test_offline_read_without_snapshot_is_empty() -> Result<()> {
        let dir = tempdir()?;
        let inner = ScriptedClient::new(sample_items());
        inner.set_mode(Mode::Unreachable);
        let cached = CachedItemClient::new(inner, dir.path())?;

        let items = cached.list_items().await?;
        assert!(items.is_empty());
        assert!(cached.is_offline());
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_reads_as_empty() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("items.json"), "not json")?;
        let inner = ScriptedClient::new(sample_items());
        inner.set_mode(Mode::Unreachable);
        let cached = CachedItemClient::new(inner, dir.path())?;

        let items = cached.list_items().await?;
        assert!(items.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_server_error_propagates_and_leaves_the_flag() -> Result<()> {
        let dir = tempdir()?;
        let inner = ScriptedClient::new(sample_items());
        let cached = CachedItemClient::new(inner, dir.path())?;

        // Go offline first so we can see the flag is left alone.
        cached.inner.set_mode(Mode::Unreachable);
        cached.list_items().await?;
        assert!(cached.is_offline());

        cached.inner.set_mode(Mode::ServerError);
        let err = cached.list_items().await.unwrap_err();
        assert!(matches!(err, Error::Api(_)));
        assert!(cached.is_offline());
        Ok(())
    }

    #[tokio::test]
    async fn test_categories_are_cached_per_type() -> Result<()> {
        let dir = tempdir()?;
        let inner = ScriptedClient::new(sample_items());
        let cached = CachedItemClient::new(inner, dir.path())?;

        assert_eq!(cached.list_categories(None).await?.len(), 2);
        assert_eq!(cached.list_categories(Some(1)).await?.len(), 1);
        sleep(Duration::from_millis(100)).await;
        assert!(dir.path().join("categories.json").exists());
        assert!(dir.path().join("categories-1.json").exists());

        cached.inner.set_mode(Mode::Unreachable);
        let filtered = cached.list_categories(Some(1)).await?;
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].prefix, "PHN");
        Ok(())
    }

    #[tokio::test]
    async fn test_writes_pass_straight_through() -> Result<()> {
        let dir = tempdir()?;
        let inner = ScriptedClient::new(sample_items());
        let cached = CachedItemClient::new(inner, dir.path())?;

        cached.inner.set_mode(Mode::ServerError);
        let err = cached.create_item(&draft()).await.unwrap_err();
        assert!(matches!(err, Error::Api(_)));

        // No fallback and no snapshot for write operations.
        cached.inner.set_mode(Mode::Unreachable);
        let err = cached.delete_item(1).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert!(!cached.is_offline());
        Ok(())
    }
}
