//! Logical registry names and typed accessors.
//!
//! Every optional capability is read back as an `Option`; callers must
//! handle "not configured" as a normal state.

use std::sync::Arc;

use crate::clients::RemoteClient;
use crate::config::AppConfig;
use crate::registry::Registry;
use crate::security::SecretProvider;
use crate::store::StoreClient;

pub const CONFIGURATION: &str = "Configuration";
pub const SECRET_PROVIDER: &str = "SecretProvider";
pub const STORE_CLIENT: &str = "StoreClient";
pub const EVENT_CLIENT: &str = "EventClient";
pub const VALUE_DESCRIPTOR_CLIENT: &str = "ValueDescriptorClient";
pub const COMMAND_CLIENT: &str = "CommandClient";
pub const NOTIFICATIONS_CLIENT: &str = "NotificationsClient";

pub fn configuration_from(registry: &Registry) -> Option<Arc<AppConfig>> {
    registry.get::<AppConfig>(CONFIGURATION)
}

pub fn secret_provider_from(registry: &Registry) -> Option<Arc<dyn SecretProvider>> {
    registry.get_cloned::<Arc<dyn SecretProvider>>(SECRET_PROVIDER)
}

pub fn store_client_from(registry: &Registry) -> Option<Arc<dyn StoreClient>> {
    registry.get_cloned::<Arc<dyn StoreClient>>(STORE_CLIENT)
}

pub fn event_client_from(registry: &Registry) -> Option<RemoteClient> {
    registry.get_cloned::<RemoteClient>(EVENT_CLIENT)
}

pub fn value_descriptor_client_from(registry: &Registry) -> Option<RemoteClient> {
    registry.get_cloned::<RemoteClient>(VALUE_DESCRIPTOR_CLIENT)
}

pub fn command_client_from(registry: &Registry) -> Option<RemoteClient> {
    registry.get_cloned::<RemoteClient>(COMMAND_CLIENT)
}

pub fn notifications_client_from(registry: &Registry) -> Option<RemoteClient> {
    registry.get_cloned::<RemoteClient>(NOTIFICATIONS_CLIENT)
}
