//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! writable.insecure_secrets (config)
//!     → secrets.rs (SecretProvider)
//!     → database credentials for the store-and-forward gate
//!     → export header secrets for the HTTP sender
//! ```

pub mod secrets;

pub use secrets::{Credentials, InsecureSecretProvider, SecretError, SecretProvider};
