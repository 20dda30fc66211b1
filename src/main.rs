//! Edge application service runtime.
//!
//! # Startup Sequence
//!
//! ```text
//!   configuration.toml ──▶ AppConfig ──▶ logging / metrics
//!                              │
//!                              ▼
//!   Registry { Configuration, SecretProvider }
//!                              │
//!                              ▼
//!   Bootstrap: version ──▶ database ──▶ clients ──▶ telemetry
//!                              │  (first failure exits non-zero)
//!                              ▼
//!   Arc<Registry> (frozen) ──▶ pipelines read clients / store / secrets
//!                              │
//!                              ▼
//!   SIGINT/SIGTERM ──▶ Shutdown::trigger ──▶ await background tasks
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use edge_app_runtime::bootstrap::{
    BootstrapContext, Clients, Database, Telemetry, VersionValidatorHandler,
};
use edge_app_runtime::config::load_config;
use edge_app_runtime::lifecycle::signals::wait_for_signal;
use edge_app_runtime::lifecycle::Bootstrap;
use edge_app_runtime::observability::{logging, metrics};
use edge_app_runtime::registry::{names, Registry};
use edge_app_runtime::security::{InsecureSecretProvider, SecretProvider};

#[derive(Debug, Parser)]
#[command(name = "edge-app-runtime", version, about = "Edge application service runtime")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, env = "EDGE_APP_CONFIG", default_value = "res/configuration.toml")]
    config: PathBuf,

    /// Do not compare the SDK major version with core services.
    #[arg(long, env = "EDGE_APP_SKIP_VERSION_CHECK")]
    skip_version_check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    logging::init_logging(&config.writable.log_level);

    tracing::info!(
        service = %config.service.name,
        sdk_version = %config.service.sdk_version,
        config = %cli.config.display(),
        "edge-app-runtime starting"
    );

    if config.telemetry.metrics_enabled {
        let addr: SocketAddr = config.telemetry.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let secret_provider: Arc<dyn SecretProvider> =
        Arc::new(InsecureSecretProvider::new(&config.writable.insecure_secrets));
    let startup = config.startup.clone();

    let mut registry = Registry::new();
    registry.insert(names::CONFIGURATION, config);
    registry.insert(names::SECRET_PROVIDER, secret_provider);

    let bootstrap = Bootstrap::new(startup)
        .with_handler(VersionValidatorHandler::new(cli.skip_version_check))
        .with_handler(Database::new())
        .with_handler(Clients)
        .with_handler(Telemetry);

    let mut ctx = BootstrapContext::new(registry);
    bootstrap.run(&mut ctx).await?;

    let (registry, shutdown, tasks) = ctx.into_parts();
    tracing::info!(?registry, "Service started");

    let signal = wait_for_signal().await?;
    tracing::info!(signal, "Shutdown signal received");
    shutdown.trigger();

    for (name, task) in tasks {
        if let Err(err) = task.await {
            tracing::warn!(task = name, error = %err, "Background task ended abnormally");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
