//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the runtime.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Client table key for the core data service.
pub const CORE_DATA_CLIENT_NAME: &str = "CoreData";
/// Client table key for the core command service.
pub const CORE_COMMAND_CLIENT_NAME: &str = "Command";
/// Client table key for the notifications service.
pub const NOTIFICATIONS_CLIENT_NAME: &str = "Notifications";

/// Root configuration for the application runtime.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Service identity.
    pub service: ServiceInfo,

    /// Startup retry policy shared by every bootstrap step.
    pub startup: StartupConfig,

    /// Remote services keyed by logical client name.
    pub clients: HashMap<String, ClientInfo>,

    /// Settings that may change while the service runs.
    pub writable: WritableInfo,

    /// Store-and-forward database connection.
    pub database: DatabaseInfo,

    /// Telemetry collection and metrics exposition.
    pub telemetry: TelemetryConfig,
}

/// Service identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceInfo {
    /// Service name, used as the store-and-forward key.
    pub name: String,

    /// Semantic version this runtime reports, `[v]major.minor.patch[-tag]`.
    pub sdk_version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            name: "edge-app-runtime".to_string(),
            sdk_version: format!("v{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Bounded retry policy for bootstrap.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StartupConfig {
    /// Total retry window per bootstrap step in seconds.
    pub duration_secs: u64,

    /// Fixed sleep between attempts in seconds.
    pub interval_secs: u64,
}

impl StartupConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            duration_secs: 60,
            interval_secs: 1,
        }
    }
}

/// Address of a remote service.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ClientInfo {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_protocol")]
    pub protocol: String,
}

fn default_protocol() -> String {
    "http".to_string()
}

impl ClientInfo {
    /// Base URL of the service, e.g. `http://localhost:48080`.
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

/// Writable configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WritableInfo {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub store_and_forward: StoreAndForwardInfo,

    /// Secrets served when no secret store is available, keyed by name.
    pub insecure_secrets: HashMap<String, InsecureSecretsInfo>,
}

impl Default for WritableInfo {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            store_and_forward: StoreAndForwardInfo::default(),
            insecure_secrets: HashMap::new(),
        }
    }
}

/// Store-and-forward settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreAndForwardInfo {
    /// Provision the durable retry store.
    pub enabled: bool,

    /// How often the forward side retries stored payloads, in seconds.
    pub retry_interval_secs: u64,

    /// Retries before a stored payload is dropped (0 = unlimited).
    pub max_retry_count: u32,
}

impl Default for StoreAndForwardInfo {
    fn default() -> Self {
        Self {
            enabled: false,
            retry_interval_secs: 300,
            max_retry_count: 10,
        }
    }
}

/// One entry of the insecure secrets table.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct InsecureSecretsInfo {
    pub path: String,
    pub secrets: HashMap<String, String>,
}

/// Database connection parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseInfo {
    /// Backend type: `memory` or `surrealdb`.
    #[serde(rename = "type")]
    pub db_type: String,
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64,
    pub namespace: String,
    pub name: String,

    /// Filled from the secret provider, never read from file.
    #[serde(skip)]
    pub username: String,
    #[serde(skip)]
    pub password: String,
}

impl Default for DatabaseInfo {
    fn default() -> Self {
        Self {
            db_type: "surrealdb".to_string(),
            host: "localhost".to_string(),
            port: 8000,
            timeout_secs: 5,
            namespace: "edge".to_string(),
            name: "application-service".to_string(),
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// CPU sampling interval in seconds.
    pub interval_secs: u64,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
