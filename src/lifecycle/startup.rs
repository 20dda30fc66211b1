//! Startup orchestration.
//!
//! # Responsibilities
//! - Run bootstrap handlers in registration order
//! - Give each handler a fresh retry window from `[startup]`
//! - Stop at the first failing handler and report which one failed
//!
//! # Design Decisions
//! - Fail fast: any handler error is fatal
//! - Handlers run sequentially, never concurrently

use thiserror::Error;
use tracing::{error, info};

use crate::bootstrap::{BootstrapContext, BootstrapError, BootstrapHandler};
use crate::config::StartupConfig;
use crate::observability::metrics;
use crate::resilience::StartupTimer;

#[derive(Debug, Error)]
#[error("bootstrap step '{step}' failed: {source}")]
pub struct StartupError {
    pub step: &'static str,
    #[source]
    pub source: BootstrapError,
}

/// Ordered list of bootstrap handlers.
pub struct Bootstrap {
    policy: StartupConfig,
    handlers: Vec<Box<dyn BootstrapHandler>>,
}

impl Bootstrap {
    pub fn new(policy: StartupConfig) -> Self {
        Self {
            policy,
            handlers: Vec::new(),
        }
    }

    pub fn with_handler(mut self, handler: impl BootstrapHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn steps(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// Run every handler against `ctx`.
    pub async fn run(&self, ctx: &mut BootstrapContext) -> Result<(), StartupError> {
        for handler in &self.handlers {
            let step = handler.name();
            let timer = StartupTimer::from_config(&self.policy);

            match handler.run(ctx, &timer).await {
                Ok(()) => {
                    metrics::record_bootstrap_step(step, true);
                    info!(step, "Bootstrap step complete");
                }
                Err(source) => {
                    metrics::record_bootstrap_step(step, false);
                    error!(step, error = %source, "Bootstrap step failed");
                    return Err(StartupError { step, source });
                }
            }
        }
        info!(steps = self.handlers.len(), "Bootstrap complete");
        Ok(())
    }
}

impl std::fmt::Debug for Bootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bootstrap")
            .field("policy", &self.policy)
            .field("steps", &self.steps())
            .finish()
    }
}
