//! Free-function access to the shared store.
//!
//! Same semantics as [`DataStorage::get_data`] and [`DataStorage::set_data`].

use crate::data_storage::DataStorage;
use crate::errors::ServiceError;

pub async fn get_stored_data(storage: &dyn DataStorage, key: &str) -> Option<String> {
    storage.get_data(key).await
}

pub async fn set_stored_data(
    storage: &dyn DataStorage,
    key: &str,
    data: &str,
) -> Result<(), ServiceError> {
    storage.set_data(key, data).await
}
