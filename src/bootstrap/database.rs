//! Store-and-forward gate.
//!
//! When `writable.store_and_forward.enabled` is false nothing is touched:
//! no secrets are read and no connection is attempted. Otherwise the
//! database credentials come from the secret provider (no retry) and the
//! connection is retried for the whole startup window.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::bootstrap::{BootstrapContext, BootstrapError, BootstrapHandler};
use crate::config::{AppConfig, DatabaseInfo};
use crate::registry::names;
use crate::resilience::{retry_until_elapsed, StartupTimer};
use crate::security::SecretProvider;
use crate::store::{StoreClient, StoreConnector, SurrealConnector};

/// Resolve credentials and connect a store client.
///
/// Usable outside bootstrap, e.g. when store-and-forward is switched on
/// at runtime.
pub async fn initialize_store_client(
    secret_provider: &dyn SecretProvider,
    database: &DatabaseInfo,
    timer: &StartupTimer,
    connector: &dyn StoreConnector,
) -> Result<Arc<dyn StoreClient>, BootstrapError> {
    let credentials = secret_provider
        .get_database_credentials(database)
        .await
        .map_err(BootstrapError::Credentials)?;

    let database = DatabaseInfo {
        username: credentials.username,
        password: credentials.password,
        ..database.clone()
    };

    let client = retry_until_elapsed(timer, "store client connect", || {
        connector.connect(&database)
    })
    .await?;

    info!(
        db_type = %database.db_type,
        host = %database.host,
        port = database.port,
        "Store client initialized"
    );
    Ok(client)
}

/// Decide whether a store client exists and build it if so.
pub async fn provision(
    config: &AppConfig,
    secret_provider: Option<&dyn SecretProvider>,
    timer: &StartupTimer,
    connector: &dyn StoreConnector,
) -> Result<Option<Arc<dyn StoreClient>>, BootstrapError> {
    if !config.writable.store_and_forward.enabled {
        info!("Store and forward is disabled");
        return Ok(None);
    }

    let secret_provider = secret_provider.ok_or(BootstrapError::MissingSecretProvider)?;
    let client = initialize_store_client(secret_provider, &config.database, timer, connector).await?;
    Ok(Some(client))
}

/// Registers the store client (possibly absent) under `StoreClient`.
pub struct Database {
    connector: Arc<dyn StoreConnector>,
}

impl Database {
    pub fn new() -> Self {
        Self::with_connector(Arc::new(SurrealConnector))
    }

    pub fn with_connector(connector: Arc<dyn StoreConnector>) -> Self {
        Self { connector }
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BootstrapHandler for Database {
    fn name(&self) -> &'static str {
        "database"
    }

    #[instrument(name = "store_and_forward", skip_all)]
    async fn run(
        &self,
        ctx: &mut BootstrapContext,
        timer: &StartupTimer,
    ) -> Result<(), BootstrapError> {
        let config = ctx.configuration()?;
        let secret_provider = names::secret_provider_from(&ctx.registry);

        let client = provision(
            &config,
            secret_provider.as_deref(),
            timer,
            self.connector.as_ref(),
        )
        .await?;

        ctx.registry.update(names::STORE_CLIENT, move |_| client.clone());
        Ok(())
    }
}
