use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::bootstrap::{BootstrapContext, BootstrapError, BootstrapHandler};
use crate::observability::telemetry::run_cpu_usage_average;
use crate::resilience::StartupTimer;

/// Starts CPU usage sampling. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Telemetry;

#[async_trait]
impl BootstrapHandler for Telemetry {
    fn name(&self) -> &'static str {
        "telemetry"
    }

    async fn run(
        &self,
        ctx: &mut BootstrapContext,
        _timer: &StartupTimer,
    ) -> Result<(), BootstrapError> {
        let config = ctx.configuration()?;
        let interval = Duration::from_secs(config.telemetry.interval_secs);
        let signal = ctx.shutdown.subscribe();

        ctx.spawn_background("telemetry", run_cpu_usage_average(interval, signal));
        info!(interval_secs = config.telemetry.interval_secs, "Telemetry collection started");
        Ok(())
    }
}
