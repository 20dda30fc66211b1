//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated)
//!     → registered in the Registry, read by bootstrap handlers
//! ```
//!
//! All fields have defaults so a minimal file is enough to start.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::AppConfig;
pub use schema::ClientInfo;
pub use schema::DatabaseInfo;
pub use schema::StartupConfig;
pub use schema::{CORE_COMMAND_CLIENT_NAME, CORE_DATA_CLIENT_NAME, NOTIFICATIONS_CLIENT_NAME};
