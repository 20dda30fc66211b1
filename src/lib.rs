//! Edge application service runtime library.

pub mod bootstrap;
pub mod clients;
pub mod config;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod pipeline;
pub mod registry;
pub mod resilience;
pub mod security;
pub mod store;
pub mod transforms;
pub mod version;

pub use config::schema::AppConfig;
pub use lifecycle::{Bootstrap, Shutdown};
pub use registry::Registry;
