//! # Error Handling
//!
//! Errors are surfaced to the caller unmodified and never retried. Local
//! failures (`NotFound`, `Validation`, `Deployment`) abort the build before
//! anything is submitted; `ProviderRejected` carries the engine's reason
//! verbatim.

pub mod types;

pub use types::{GatelinkError, Result};

/// Shorthand used across the crate
pub type Error = GatelinkError;
