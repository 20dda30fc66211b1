//! Per-execution pipeline state.
//!
//! # Data Flow
//! ```text
//! Message arrives
//!     → PipelineContext::new(correlation id, frozen registry)
//!     → pipeline functions (e.g. transforms::http) receive &mut context
//!     → failure with persist-on-error → retry slot
//!     → take_retry_record / store_pending_retry → StoreClient
//! ```
//!
//! Each execution owns its context, so the retry slot is never shared.

mod context;
mod data;

pub use context::PipelineContext;
pub use data::PipelineData;
