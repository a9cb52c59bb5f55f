//! Key-value accessor over the host's persistent string store.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ServiceError;
use crate::storage::json_map_store::JsonMapStore;

/// One hit of [`DataStorage::search_data`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEntry {
    pub key: String,
    pub data: String,
}

/// Trait abstraction for the shared key-value store.
/// Every implementation is visible to all consumers of the same backing store.
#[async_trait]
pub trait DataStorage: Send + Sync {
    /// Value stored under `key`, `None` if absent.
    async fn get_data(&self, key: &str) -> Option<String>;

    /// All entries whose key contains `key`, ordered by key.
    /// Returns `None` when nothing matches, never an empty vec.
    async fn search_data(&self, key: &str) -> Option<Vec<SearchEntry>>;

    /// Store `data` under `key`, replacing any previous value.
    async fn set_data(&self, key: &str, data: &str) -> Result<(), ServiceError>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete_data(&self, key: &str) -> Result<(), ServiceError>;
}

/// [`DataStorage`] backed by a JSON file on the host.
#[derive(Clone)]
pub struct LocalDataStorage {
    store: Arc<JsonMapStore<String, String>>,
}

impl LocalDataStorage {
    /// Open without a quota.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let store = JsonMapStore::<String, String>::new(path).await?;
        Ok(Arc::new(Self { store }))
    }

    pub async fn open_with_quota<P: Into<PathBuf>>(
        path: P,
        quota_bytes: usize,
    ) -> Result<Arc<Self>, ServiceError> {
        let store = JsonMapStore::<String, String>::with_quota(path, quota_bytes).await?;
        Ok(Arc::new(Self { store }))
    }
}

#[async_trait]
impl DataStorage for LocalDataStorage {
    async fn get_data(&self, key: &str) -> Option<String> {
        self.store.get(&key.to_string()).await
    }

    async fn search_data(&self, key: &str) -> Option<Vec<SearchEntry>> {
        let mut hits: Vec<SearchEntry> = self
            .store
            .list()
            .await
            .into_iter()
            .filter(|(k, _)| k.contains(key))
            .map(|(k, data)| SearchEntry { key: k, data })
            .collect();
        debug!(pattern = key, hits = hits.len(), "search_data");
        if hits.is_empty() {
            return None;
        }
        hits.sort_by(|a, b| a.key.cmp(&b.key));
        Some(hits)
    }

    async fn set_data(&self, key: &str, data: &str) -> Result<(), ServiceError> {
        debug!(key, bytes = data.len(), "set_data");
        self.store.insert(key.to_string(), data.to_string()).await
    }

    async fn delete_data(&self, key: &str) -> Result<(), ServiceError> {
        let existed = self.store.remove(&key.to_string()).await?;
        debug!(key, existed, "delete_data");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    async fn temp_storage() -> Result<(Arc<LocalDataStorage>, PathBuf), ServiceError> {
        let tmp = std::env::temp_dir().join(format!("ace_local_storage_{}.json", Uuid::new_v4()));
        Ok((LocalDataStorage::open(&tmp).await?, tmp))
    }

    #[tokio::test]
    async fn set_then_get_returns_value() -> Result<(), anyhow::Error> {
        let (storage, tmp) = temp_storage().await?;
        storage.set_data("theme", "dark").await?;
        assert_eq!(storage.get_data("theme").await.as_deref(), Some("dark"));

        // last write wins
        storage.set_data("theme", "light").await?;
        assert_eq!(storage.get_data("theme").await.as_deref(), Some("light"));

        // empty value is present, not absent
        storage.set_data("blank", "").await?;
        assert_eq!(storage.get_data("blank").await.as_deref(), Some(""));

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn missing_and_deleted_keys_are_absent() -> Result<(), anyhow::Error> {
        let (storage, tmp) = temp_storage().await?;
        assert!(storage.get_data("nope").await.is_none());

        storage.set_data("k", "v").await?;
        storage.delete_data("k").await?;
        assert!(storage.get_data("k").await.is_none());

        // deleting again is a no-op
        storage.delete_data("k").await?;
        storage.delete_data("never-set").await?;

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn search_matches_substring_with_values() -> Result<(), anyhow::Error> {
        let (storage, tmp) = temp_storage().await?;
        storage.set_data("beta", "3").await?;
        storage.set_data("alphabeta", "2").await?;
        storage.set_data("alpha", "1").await?;

        let hits = storage.search_data("alpha").await.expect("two matches");
        assert_eq!(
            hits,
            vec![
                SearchEntry { key: "alpha".into(), data: "1".into() },
                SearchEntry { key: "alphabeta".into(), data: "2".into() },
            ]
        );

        let hits = storage.search_data("beta").await.expect("two matches");
        let keys: Vec<&str> = hits.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["alphabeta", "beta"]);

        assert!(storage.search_data("zzz").await.is_none());

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn search_on_empty_store_is_absent() -> Result<(), anyhow::Error> {
        let (storage, tmp) = temp_storage().await?;
        assert!(storage.search_data("").await.is_none());
        storage.set_data("x", "1").await?;
        // empty pattern matches every key
        assert_eq!(storage.search_data("").await.map(|v| v.len()), Some(1));
        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn quota_error_propagates_unchanged() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir()
            .join(format!("ace_local_storage_quota_{}.json", Uuid::new_v4()));
        let storage = LocalDataStorage::open_with_quota(&tmp, 16).await?;
        let err = storage.set_data("key", &"v".repeat(32)).await.unwrap_err();
        assert!(matches!(err, ServiceError::QuotaExceeded { quota: 16, .. }));
        assert!(storage.get_data("key").await.is_none());
        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn values_survive_reopen() -> Result<(), anyhow::Error> {
        let (storage, tmp) = temp_storage().await?;
        storage.set_data("session", "abc").await?;
        drop(storage);

        let reopened = LocalDataStorage::open(&tmp).await?;
        assert_eq!(reopened.get_data("session").await.as_deref(), Some("abc"));
        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn failed_writes_leave_state_untouched() -> Result<(), anyhow::Error> {
        let (storage, tmp) = temp_storage().await?;
        storage.set_data("keep", "1").await?;

        // a directory where the file was makes every write fail
        tokio::fs::remove_file(&tmp).await?;
        tokio::fs::create_dir(&tmp).await?;

        let err = storage.set_data("k", "v").await.unwrap_err();
        assert!(matches!(err, ServiceError::Storage(_)), "got {err:?}");
        assert!(storage.get_data("k").await.is_none());

        let err = storage.set_data("keep", "2").await.unwrap_err();
        assert!(matches!(err, ServiceError::Storage(_)), "got {err:?}");
        assert_eq!(storage.get_data("keep").await.as_deref(), Some("1"));

        let err = storage.delete_data("keep").await.unwrap_err();
        assert!(matches!(err, ServiceError::Storage(_)), "got {err:?}");
        assert_eq!(storage.get_data("keep").await.as_deref(), Some("1"));

        let _ = tokio::fs::remove_dir_all(&tmp).await;
        Ok(())
    }

    #[test]
    fn search_entry_serializes_as_key_and_data() -> Result<(), anyhow::Error> {
        let json = serde_json::to_value(SearchEntry { key: "k".into(), data: "d".into() })?;
        assert_eq!(json, serde_json::json!({ "key": "k", "data": "d" }));
        Ok(())
    }
}
