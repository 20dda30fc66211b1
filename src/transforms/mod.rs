//! Pipeline functions that move data out of the service.
//!
//! # Data Flow
//! ```text
//! PipelineData (previous function's output)
//!     → coerce to bytes
//!     → http.rs (POST, optional secret header, optional client cert)
//!     → Ok(response body) continues the pipeline
//!     → Err(ExportError) stops it; retry slot may hold the payload
//! ```

pub mod http;

pub use http::{ExportError, HttpSender, HttpSenderConfig};
