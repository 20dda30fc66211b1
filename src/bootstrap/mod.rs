//! Bootstrap handlers.
//!
//! # Data Flow
//! ```text
//! lifecycle::startup::Bootstrap
//!     → version.rs    (major-version gate against core data)
//!     → database.rs   (store-and-forward gate → StoreClient)
//!     → clients.rs    (remote clients → Registry)
//!     → telemetry.rs  (CPU sampling task)
//! ```
//!
//! # Responsibilities
//! - Validate or provision one dependency per handler
//! - Register results in the `Registry` by logical name
//! - Report failure as a value; the sequencer decides what happens next

pub mod clients;
pub mod database;
pub mod telemetry;
pub mod version;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::clients::ClientError;
use crate::config::AppConfig;
use crate::lifecycle::Shutdown;
use crate::registry::{names, Registry};
use crate::resilience::{RetryError, StartupTimer};
use crate::security::SecretError;
use crate::store::StoreError;
use crate::version::VersionError;

pub use clients::Clients;
pub use database::{initialize_store_client, provision, Database};
pub use telemetry::Telemetry;
pub use version::VersionValidatorHandler;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("configuration is not registered")]
    MissingConfiguration,

    #[error("secret provider is not registered")]
    MissingSecretProvider,

    #[error("version check failed: {0}")]
    Version(#[from] VersionError),

    #[error("SDK version {sdk} is not compatible with core services version {core}")]
    IncompatibleVersion { sdk: String, core: String },

    #[error("failed to resolve database credentials: {0}")]
    Credentials(#[source] SecretError),

    #[error("store client unavailable: {0}")]
    Store(#[from] RetryError<StoreError>),

    #[error("failed to create {name} client: {source}")]
    Client {
        name: &'static str,
        #[source]
        source: ClientError,
    },
}

/// Mutable state threaded through the bootstrap sequence.
#[derive(Debug)]
pub struct BootstrapContext {
    pub registry: Registry,
    pub shutdown: Shutdown,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl BootstrapContext {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            shutdown: Shutdown::new(),
            tasks: Vec::new(),
        }
    }

    pub fn configuration(&self) -> Result<Arc<AppConfig>, BootstrapError> {
        names::configuration_from(&self.registry).ok_or(BootstrapError::MissingConfiguration)
    }

    /// Spawn a task that lives until shutdown.
    pub fn spawn_background<F>(&mut self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.push((name, tokio::spawn(task)));
    }

    pub fn background_task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Split into the frozen registry, the shutdown coordinator, and the
    /// background tasks to await on exit.
    pub fn into_parts(self) -> (Arc<Registry>, Shutdown, Vec<(&'static str, JoinHandle<()>)>) {
        (Arc::new(self.registry), self.shutdown, self.tasks)
    }
}

/// One ordered unit of service startup.
#[async_trait]
pub trait BootstrapHandler: Send + Sync {
    /// Step name for logs and metrics.
    fn name(&self) -> &'static str;

    async fn run(
        &self,
        ctx: &mut BootstrapContext,
        timer: &StartupTimer,
    ) -> Result<(), BootstrapError>;
}
