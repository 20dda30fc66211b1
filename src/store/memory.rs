//! In-process store client.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::store::{StoreClient, StoreError, StoreResult, StoredObject};

/// Store client backed by a `HashMap<id, StoredObject>`.
///
/// Contents do not survive a restart.
#[derive(Debug, Default)]
pub struct MemoryStoreClient {
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl MemoryStoreClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, HashMap<String, StoredObject>>> {
        self.objects
            .lock()
            .map_err(|_| StoreError::Query("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl StoreClient for MemoryStoreClient {
    async fn store(&self, object: StoredObject) -> StoreResult<String> {
        object.validate_contract()?;
        let id = object.id.clone();
        self.lock()?.insert(id.clone(), object);
        Ok(id)
    }

    async fn retrieve_from_store(&self, app_service_key: &str) -> StoreResult<Vec<StoredObject>> {
        let objects = self.lock()?;
        let mut matching: Vec<StoredObject> = objects
            .values()
            .filter(|o| o.app_service_key == app_service_key)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matching)
    }

    async fn update(&self, object: StoredObject) -> StoreResult<()> {
        object.validate_contract()?;
        let mut objects = self.lock()?;
        match objects.get_mut(&object.id) {
            Some(existing) => {
                *existing = object;
                Ok(())
            }
            None => Err(StoreError::NotFound(object.id)),
        }
    }

    async fn remove_from_store(&self, object: &StoredObject) -> StoreResult<()> {
        self.lock()?
            .remove(&object.id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(object.id.clone()))
    }
}
