use std::sync::Arc;

use crate::registry::names;
use crate::registry::Registry;
use crate::security::SecretProvider;
use crate::store::{StoreClient, StoreResult, StoredObject};

/// State for one pipeline execution.
#[derive(Debug)]
pub struct PipelineContext {
    correlation_id: String,
    registry: Arc<Registry>,
    retry_data: Option<Vec<u8>>,
}

impl PipelineContext {
    pub fn new(correlation_id: impl Into<String>, registry: Arc<Registry>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            registry,
            retry_data: None,
        }
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn secret_provider(&self) -> Option<Arc<dyn SecretProvider>> {
        names::secret_provider_from(&self.registry)
    }

    pub fn store_client(&self) -> Option<Arc<dyn StoreClient>> {
        names::store_client_from(&self.registry)
    }

    /// Put `data` in the carry-forward slot, replacing anything already
    /// there.
    pub fn set_retry_data(&mut self, data: Vec<u8>) {
        self.retry_data = Some(data);
    }

    pub fn retry_data(&self) -> Option<&[u8]> {
        self.retry_data.as_deref()
    }

    /// Empty the carry-forward slot and hand its contents to the caller.
    pub fn take_retry_data(&mut self) -> Option<Vec<u8>> {
        self.retry_data.take()
    }

    /// Turn the pending payload into a record for the store.
    pub fn take_retry_record(
        &mut self,
        app_service_key: &str,
        pipeline_position: usize,
        version: &str,
    ) -> Option<StoredObject> {
        let payload = self.take_retry_data()?;
        Some(
            StoredObject::new(app_service_key, payload, pipeline_position, version)
                .with_correlation_id(self.correlation_id.clone()),
        )
    }

    /// Hand the pending payload to the store client, if both exist.
    ///
    /// Returns the stored object's id. When store-and-forward is disabled
    /// the payload stays in the slot.
    pub async fn store_pending_retry(
        &mut self,
        app_service_key: &str,
        pipeline_position: usize,
        version: &str,
    ) -> StoreResult<Option<String>> {
        let Some(store) = self.store_client() else {
            return Ok(None);
        };
        let Some(record) = self.take_retry_record(app_service_key, pipeline_position, version)
        else {
            return Ok(None);
        };
        let id = store.store(record).await?;
        tracing::debug!(
            correlation_id = %self.correlation_id,
            id = %id,
            "Failed export saved for retry"
        );
        Ok(Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStoreClient;

    #[test]
    fn test_retry_slot_overwrites_and_takes() {
        let mut ctx = PipelineContext::new("corr-1", Arc::new(Registry::new()));
        assert!(ctx.retry_data().is_none());

        ctx.set_retry_data(b"first".to_vec());
        ctx.set_retry_data(b"second".to_vec());
        assert_eq!(ctx.retry_data(), Some(&b"second"[..]));

        assert_eq!(ctx.take_retry_data(), Some(b"second".to_vec()));
        assert!(ctx.take_retry_data().is_none());
    }

    #[test]
    fn test_retry_record_carries_correlation_id() {
        let mut ctx = PipelineContext::new("corr-7", Arc::new(Registry::new()));
        ctx.set_retry_data(b"payload".to_vec());

        let record = ctx.take_retry_record("svc", 2, "v1").unwrap();
        assert_eq!(record.payload, b"payload");
        assert_eq!(record.pipeline_position, 2);
        assert_eq!(record.correlation_id, "corr-7");
        assert!(ctx.retry_data().is_none());
    }

    #[tokio::test]
    async fn test_store_pending_retry() {
        let store: Arc<dyn StoreClient> = Arc::new(MemoryStoreClient::new());
        let mut registry = Registry::new();
        registry.insert(names::STORE_CLIENT, store.clone());

        let mut ctx = PipelineContext::new("corr-9", Arc::new(registry));
        ctx.set_retry_data(b"payload".to_vec());

        let id = ctx.store_pending_retry("svc", 0, "v1").await.unwrap().unwrap();
        let stored = store.retrieve_from_store("svc").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, id);
        assert!(ctx.retry_data().is_none());
    }

    #[tokio::test]
    async fn test_store_pending_retry_without_store_keeps_slot() {
        let mut ctx = PipelineContext::new("corr-9", Arc::new(Registry::new()));
        ctx.set_retry_data(b"payload".to_vec());

        assert_eq!(ctx.store_pending_retry("svc", 0, "v1").await.unwrap(), None);
        assert!(ctx.retry_data().is_some());
    }
}
