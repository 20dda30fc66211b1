//! Major-version gate against the core data service.

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::bootstrap::{BootstrapContext, BootstrapError, BootstrapHandler};
use crate::clients::{RemoteClient, API_VERSION_ROUTE};
use crate::config::CORE_DATA_CLIENT_NAME;
use crate::resilience::StartupTimer;
use crate::version::{Compatibility, VersionSource, VersionValidator};

/// Fails startup when core services run a different major version.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionValidatorHandler {
    skip_version_check: bool,
}

impl VersionValidatorHandler {
    pub fn new(skip_version_check: bool) -> Self {
        Self { skip_version_check }
    }
}

#[async_trait]
impl BootstrapHandler for VersionValidatorHandler {
    fn name(&self) -> &'static str {
        "version"
    }

    #[instrument(name = "version_check", skip_all)]
    async fn run(
        &self,
        ctx: &mut BootstrapContext,
        timer: &StartupTimer,
    ) -> Result<(), BootstrapError> {
        let config = ctx.configuration()?;
        let validator = VersionValidator::new(self.skip_version_check, &config.service.sdk_version);

        let source = config
            .clients
            .get(CORE_DATA_CLIENT_NAME)
            .map(|info| RemoteClient::new(CORE_DATA_CLIENT_NAME, info, API_VERSION_ROUTE))
            .transpose()
            .map_err(|source| BootstrapError::Client {
                name: CORE_DATA_CLIENT_NAME,
                source,
            })?;

        let outcome = validator
            .validate(source.as_ref().map(|c| c as &dyn VersionSource), timer)
            .await?;

        match outcome {
            Compatibility::Skipped => info!("Skipping core services version compatibility check"),
            Compatibility::SdkPreRelease => info!(
                sdk_version = validator.sdk_version(),
                "SDK is a pre-release build; skipping core services version check"
            ),
            Compatibility::CorePreRelease => info!(
                "Core services version is the pre-release sentinel; skipping version check"
            ),
            Compatibility::Compatible { sdk, core } => info!(
                sdk_version = %sdk,
                core_version = %core,
                "Core services version is compatible"
            ),
            Compatibility::Incompatible { sdk, core } => {
                warn!(
                    sdk_version = %sdk,
                    core_version = %core,
                    "SDK major version does not match core services"
                );
                return Err(BootstrapError::IncompatibleVersion { sdk, core });
            }
        }
        Ok(())
    }
}
