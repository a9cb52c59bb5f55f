use std::{
    collections::HashMap,
    ffi::OsString,
    hash::Hash,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs, sync::RwLock};
use tracing::{debug, warn};

use crate::errors::ServiceError;

/// Generic JSON file-backed key-value map store.
///
/// Persists a `HashMap<K, V>` to a JSON file and provides simple CRUD helpers.
/// When a quota is set, the serialized document may never grow past it.
/// The in-memory map only changes when the file write succeeds.
#[derive(Clone)]
pub struct JsonMapStore<K, V> {
    inner: Arc<RwLock<HashMap<K, V>>>,
    file_path: PathBuf,
    quota_bytes: Option<usize>,
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone,
{
    /// Initialize the store from a path. Creates the file with an empty map if missing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        Self::open(path.into(), None).await
    }

    /// Like [`JsonMapStore::new`], rejecting writes that would push the file past `quota_bytes`.
    pub async fn with_quota<P: Into<PathBuf>>(
        path: P,
        quota_bytes: usize,
    ) -> Result<Arc<Self>, ServiceError> {
        Self::open(path.into(), Some(quota_bytes)).await
    }

    async fn open(
        file_path: PathBuf,
        quota_bytes: Option<usize>,
    ) -> Result<Arc<Self>, ServiceError> {
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(ServiceError::storage)?;
        }

        let map: HashMap<K, V> = match fs::read(&file_path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(map) => map,
                Err(e) => {
                    let backup = corrupt_backup_path(&file_path);
                    warn!(
                        path = %file_path.display(),
                        backup = %backup.display(),
                        error = %e,
                        "store file unreadable; moved aside and starting empty"
                    );
                    fs::rename(&file_path, &backup).await.map_err(ServiceError::storage)?;
                    Self::create_empty(&file_path).await?
                }
            },
            Err(_) => Self::create_empty(&file_path).await?,
        };
        debug!(path = %file_path.display(), entries = map.len(), "store opened");

        Ok(Arc::new(Self { inner: Arc::new(RwLock::new(map)), file_path, quota_bytes }))
    }

    async fn create_empty(file_path: &Path) -> Result<HashMap<K, V>, ServiceError> {
        let empty: HashMap<K, V> = HashMap::new();
        let data = serde_json::to_vec(&empty).map_err(ServiceError::storage)?;
        fs::write(file_path, data).await.map_err(ServiceError::storage)?;
        Ok(empty)
    }

    /// Serialize `map`, check the quota, and write it out.
    async fn persist(&self, map: &HashMap<K, V>) -> Result<(), ServiceError> {
        let data = serde_json::to_vec(map).map_err(ServiceError::storage)?;
        if let Some(quota) = self.quota_bytes {
            if data.len() > quota {
                warn!(quota, requested = data.len(), "store write rejected by quota");
                return Err(ServiceError::QuotaExceeded { quota, requested: data.len() });
            }
        }
        fs::write(&self.file_path, data).await.map_err(ServiceError::storage)
    }

    /// List all entries as `(key, value)` pairs.
    pub async fn list(&self) -> Vec<(K, V)> {
        let map = self.inner.read().await;
        map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Get value by key.
    pub async fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    /// Insert or update a value by key and persist.
    ///
    /// On [`ServiceError::QuotaExceeded`] or a failed write the previous value is kept.
    pub async fn insert(&self, key: K, value: V) -> Result<(), ServiceError> {
        let mut map = self.inner.write().await;
        let previous = map.insert(key.clone(), value);
        if let Err(e) = self.persist(&map).await {
            match previous {
                Some(old) => {
                    map.insert(key, old);
                }
                None => {
                    map.remove(&key);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    /// Remove a key and persist; returns whether it existed.
    ///
    /// A failed write puts the entry back.
    pub async fn remove(&self, key: &K) -> Result<bool, ServiceError> {
        let mut map = self.inner.write().await;
        let Some(old) = map.remove(key) else {
            return Ok(false);
        };
        if let Err(e) = self.persist(&map).await {
            map.insert(key.clone(), old);
            return Err(e);
        }
        Ok(true)
    }
}

/// `<file>.corrupt` next to the store file.
fn corrupt_backup_path(file_path: &Path) -> PathBuf {
    let mut name: OsString = file_path.as_os_str().to_owned();
    name.push(".corrupt");
    PathBuf::from(name)
}
