//! Remote client provisioning.
//!
//! A client is registered as `Some` only when its service has an entry in
//! `[clients]`; otherwise the registry holds `None` for that name.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::bootstrap::{BootstrapContext, BootstrapError, BootstrapHandler};
use crate::clients::{
    RemoteClient, API_DEVICE_ROUTE, API_EVENT_ROUTE, API_NOTIFICATION_ROUTE,
    API_VALUE_DESCRIPTOR_ROUTE,
};
use crate::config::{
    ClientInfo, CORE_COMMAND_CLIENT_NAME, CORE_DATA_CLIENT_NAME, NOTIFICATIONS_CLIENT_NAME,
};
use crate::registry::names;
use crate::resilience::StartupTimer;

/// (registry name, configured service, route)
const CLIENTS: [(&str, &str, &str); 4] = [
    (names::EVENT_CLIENT, CORE_DATA_CLIENT_NAME, API_EVENT_ROUTE),
    (
        names::VALUE_DESCRIPTOR_CLIENT,
        CORE_DATA_CLIENT_NAME,
        API_VALUE_DESCRIPTOR_ROUTE,
    ),
    (names::COMMAND_CLIENT, CORE_COMMAND_CLIENT_NAME, API_DEVICE_ROUTE),
    (
        names::NOTIFICATIONS_CLIENT,
        NOTIFICATIONS_CLIENT_NAME,
        API_NOTIFICATION_ROUTE,
    ),
];

fn build_client(
    clients: &HashMap<String, ClientInfo>,
    service: &'static str,
    route: &str,
) -> Result<Option<RemoteClient>, BootstrapError> {
    clients
        .get(service)
        .map(|info| RemoteClient::new(service, info, route))
        .transpose()
        .map_err(|source| BootstrapError::Client {
            name: service,
            source,
        })
}

/// Registers the event, value descriptor, command, and notifications
/// clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct Clients;

#[async_trait]
impl BootstrapHandler for Clients {
    fn name(&self) -> &'static str {
        "clients"
    }

    #[instrument(name = "clients", skip_all)]
    async fn run(
        &self,
        ctx: &mut BootstrapContext,
        _timer: &StartupTimer,
    ) -> Result<(), BootstrapError> {
        let config = ctx.configuration()?;

        for (name, service, route) in CLIENTS {
            let client = build_client(&config.clients, service, route)?;
            match &client {
                Some(c) => debug!(client = name, url = %c.url(), "Client registered"),
                None => debug!(client = name, service, "Service not configured; client absent"),
            }
            ctx.registry.update(name, move |_| client.clone());
        }
        Ok(())
    }
}
