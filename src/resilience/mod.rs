//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Bootstrap step:
//!     → timer.rs (one StartupTimer per step, same global policy)
//!     → retries.rs (retry transient failures at a fixed interval)
//!     → on exhaustion: RetryError escalates to a fatal startup failure
//! ```

pub mod retries;
pub mod timer;

pub use retries::{retry_until_elapsed, RetryError};
pub use timer::StartupTimer;
