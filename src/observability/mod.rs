//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and gauges via the metrics facade)
//!
//! telemetry.rs (background task):
//!     /proc/stat → cpu_usage_average gauge
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Prometheus scrape endpoint (when telemetry.metrics_enabled)
//! ```

pub mod logging;
pub mod metrics;
pub mod telemetry;
