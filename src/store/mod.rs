//! Store-and-forward persistence.
//!
//! # Data Flow
//! ```text
//! Export failure (persist on error)
//!     → PipelineContext retry slot
//!     → StoredObject (payload + pipeline position)
//!     → StoreClient::store
//!     → forward side: retrieve_from_store → resend → update / remove
//! ```
//!
//! The gate in `bootstrap::database` decides whether a `StoreClient`
//! exists at all; every consumer handles `None` as normal operation.

pub mod memory;
pub mod surreal;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DatabaseInfo;

pub use memory::MemoryStoreClient;
pub use surreal::{SurrealConnector, SurrealStoreClient};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database connection failed: {0}")]
    Connection(String),

    #[error("database query failed: {0}")]
    Query(String),

    #[error("stored object is invalid: {0}")]
    Contract(String),

    #[error("stored object '{0}' not found")]
    NotFound(String),
}

impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        StoreError::Query(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A payload waiting to be forwarded again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    /// Unique identifier, assigned on construction.
    pub id: String,
    /// Service that owns the payload.
    pub app_service_key: String,
    /// Exact bytes that failed to export.
    pub payload: Vec<u8>,
    /// Forward attempts so far.
    pub retry_count: u32,
    /// Index of the pipeline function to resume from.
    pub pipeline_position: usize,
    /// Hash of the pipeline definition the payload was produced under.
    pub version: String,
    pub correlation_id: String,
    pub event_id: String,
    pub event_checksum: String,
}

impl StoredObject {
    pub fn new(
        app_service_key: impl Into<String>,
        payload: Vec<u8>,
        pipeline_position: usize,
        version: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            app_service_key: app_service_key.into(),
            payload,
            retry_count: 0,
            pipeline_position,
            version: version.into(),
            correlation_id: String::new(),
            event_id: String::new(),
            event_checksum: String::new(),
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }

    /// Check the fields every backend relies on.
    pub fn validate_contract(&self) -> StoreResult<()> {
        if self.id.is_empty() {
            return Err(StoreError::Contract("id is empty".to_string()));
        }
        if self.app_service_key.is_empty() {
            return Err(StoreError::Contract("app_service_key is empty".to_string()));
        }
        Ok(())
    }
}

/// Durable storage for payloads pending a later export attempt.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Persist `object` and return its id.
    async fn store(&self, object: StoredObject) -> StoreResult<String>;

    /// All objects owned by `app_service_key`.
    async fn retrieve_from_store(&self, app_service_key: &str) -> StoreResult<Vec<StoredObject>>;

    /// Replace a stored object (e.g. after bumping `retry_count`).
    async fn update(&self, object: StoredObject) -> StoreResult<()>;

    /// Delete a stored object.
    async fn remove_from_store(&self, object: &StoredObject) -> StoreResult<()>;
}

/// Builds a store client from connection parameters.
///
/// The store-and-forward gate retries `connect` failures within the
/// startup window.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self, database: &DatabaseInfo) -> StoreResult<std::sync::Arc<dyn StoreClient>>;
}
