//! Network transport helpers.
//!
//! `tls.rs` turns PEM files on disk into a `reqwest` client identity and
//! trust store for exports to endpoints that require mutual TLS.

pub mod tls;

pub use tls::{TlsError, TlsMaterial};
