//! # Observability
//!
//! Structured logging for builds and submissions.

pub mod logging;

pub use logging::{check_log_level, init_logging, log_config_info};
