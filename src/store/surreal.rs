//! SurrealDB-backed store client.
//!
//! Connects with `engine::any`, so the database type picks the transport:
//! `memory` uses `mem://`, anything else `ws://host:port`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use tracing::{debug, info, instrument};

use crate::config::DatabaseInfo;
use crate::store::{StoreClient, StoreConnector, StoreError, StoreResult, StoredObject};

const TABLE: &str = "store_forward";

/// Row layout. SurrealDB owns the `id` column, so the object id lives in
/// `object_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DbStoredObject {
    object_id: String,
    app_service_key: String,
    payload: Vec<u8>,
    retry_count: u32,
    pipeline_position: usize,
    version: String,
    correlation_id: String,
    event_id: String,
    event_checksum: String,
}

impl From<StoredObject> for DbStoredObject {
    fn from(o: StoredObject) -> Self {
        Self {
            object_id: o.id,
            app_service_key: o.app_service_key,
            payload: o.payload,
            retry_count: o.retry_count,
            pipeline_position: o.pipeline_position,
            version: o.version,
            correlation_id: o.correlation_id,
            event_id: o.event_id,
            event_checksum: o.event_checksum,
        }
    }
}

impl From<DbStoredObject> for StoredObject {
    fn from(r: DbStoredObject) -> Self {
        Self {
            id: r.object_id,
            app_service_key: r.app_service_key,
            payload: r.payload,
            retry_count: r.retry_count,
            pipeline_position: r.pipeline_position,
            version: r.version,
            correlation_id: r.correlation_id,
            event_id: r.event_id,
            event_checksum: r.event_checksum,
        }
    }
}

fn endpoint(database: &DatabaseInfo) -> String {
    if database.db_type == "memory" {
        "mem://".to_string()
    } else {
        format!("ws://{}:{}", database.host, database.port)
    }
}

/// Store client over a SurrealDB connection.
#[derive(Clone)]
pub struct SurrealStoreClient {
    db: Surreal<Any>,
}

impl SurrealStoreClient {
    /// Connect, sign in with the resolved credentials, and select the
    /// namespace and database.
    #[instrument(skip(database), fields(db_type = %database.db_type, host = %database.host, port = database.port))]
    pub async fn connect(database: &DatabaseInfo) -> StoreResult<Self> {
        let endpoint = endpoint(database);
        let timeout = Duration::from_secs(database.timeout_secs.max(1));

        let db = tokio::time::timeout(timeout, surrealdb::engine::any::connect(endpoint.as_str()))
            .await
            .map_err(|_| StoreError::Connection(format!("connect to {endpoint} timed out")))?
            .map_err(|e| StoreError::Connection(format!("failed to connect to {endpoint}: {e}")))?;

        if database.db_type != "memory" {
            db.signin(Root {
                username: &database.username,
                password: &database.password,
            })
            .await
            .map_err(|e| StoreError::Connection(format!("authentication failed: {e}")))?;
        }

        db.use_ns(&database.namespace)
            .use_db(&database.name)
            .await
            .map_err(|e| {
                StoreError::Connection(format!("failed to select namespace/database: {e}"))
            })?;

        info!(%endpoint, "Store-and-forward database connected");
        Ok(Self { db })
    }
}

#[async_trait]
impl StoreClient for SurrealStoreClient {
    #[instrument(skip(self, object), fields(id = %object.id))]
    async fn store(&self, object: StoredObject) -> StoreResult<String> {
        object.validate_contract()?;
        let id = object.id.clone();
        let created: Option<DbStoredObject> = self
            .db
            .create(TABLE)
            .content(DbStoredObject::from(object))
            .await?;
        created.ok_or_else(|| StoreError::Query(format!("failed to store object {id}")))?;
        debug!("Object stored");
        Ok(id)
    }

    async fn retrieve_from_store(&self, app_service_key: &str) -> StoreResult<Vec<StoredObject>> {
        let mut result = self
            .db
            .query("SELECT * FROM store_forward WHERE app_service_key = $key ORDER BY object_id")
            .bind(("key", app_service_key.to_string()))
            .await?;
        let rows: Vec<DbStoredObject> = result.take(0)?;
        Ok(rows.into_iter().map(StoredObject::from).collect())
    }

    #[instrument(skip(self, object), fields(id = %object.id))]
    async fn update(&self, object: StoredObject) -> StoreResult<()> {
        object.validate_contract()?;
        let id = object.id.clone();
        let mut result = self
            .db
            .query("UPDATE store_forward CONTENT $row WHERE object_id = $id")
            .bind(("row", DbStoredObject::from(object)))
            .bind(("id", id.clone()))
            .await?;
        let updated: Vec<DbStoredObject> = result.take(0)?;
        if updated.is_empty() {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    #[instrument(skip(self, object), fields(id = %object.id))]
    async fn remove_from_store(&self, object: &StoredObject) -> StoreResult<()> {
        let mut result = self
            .db
            .query("DELETE FROM store_forward WHERE object_id = $id RETURN BEFORE")
            .bind(("id", object.id.clone()))
            .await?;
        let removed: Vec<DbStoredObject> = result.take(0)?;
        if removed.is_empty() {
            return Err(StoreError::NotFound(object.id.clone()));
        }
        Ok(())
    }
}

/// Production connector used by the store-and-forward gate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurrealConnector;

#[async_trait]
impl StoreConnector for SurrealConnector {
    async fn connect(&self, database: &DatabaseInfo) -> StoreResult<Arc<dyn StoreClient>> {
        let client = SurrealStoreClient::connect(database).await?;
        Ok(Arc::new(client))
    }
}
