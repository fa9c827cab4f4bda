use crate::{
    Config,
    error::StoreError,
    model::{Location, LocationId, LocationPatch, NewLocation},
    store::firestore::FirestoreStore,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod firestore;

/// Remote collection of saved locations. Every call is one round trip;
/// nothing is cached locally.
#[async_trait]
pub trait LocationStore: Send + Sync + Debug {
    /// Every location in the collection, in store-defined order.
    async fn list_all(&self) -> Result<Vec<Location>, StoreError>;

    /// Write a new location; the store stamps the write time.
    async fn create(&self, location: &NewLocation) -> Result<LocationId, StoreError>;

    /// Overwrite the fields set in `patch` and refresh the write time.
    /// Fails with [`StoreError::NotFound`] when `id` does not exist.
    async fn update(&self, id: &LocationId, patch: &LocationPatch) -> Result<(), StoreError>;

    async fn delete(&self, id: &LocationId) -> Result<(), StoreError>;
}

/// Construct the document store client described by config.
pub fn store_from_config(config: &Config) -> anyhow::Result<Arc<dyn LocationStore>> {
    let settings = config.store_settings()?;
    Ok(Arc::new(FirestoreStore::new(settings)))
}
