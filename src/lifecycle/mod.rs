//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Registry (configuration, secrets)
//!         → version → database → clients → telemetry
//!         → first failure aborts startup
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → background tasks observe the signal → main awaits them
//! ```
//!
//! # Design Decisions
//! - Ordered startup: each step may rely on what earlier steps registered
//! - Each step gets its own retry window

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{Bootstrap, StartupError};
