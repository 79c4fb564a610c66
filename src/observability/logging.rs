//! # Structured Logging
//!
//! Structured logging setup and span macros using the tracing ecosystem.
//! In JSON mode every event carries the fields of its enclosing spans, so a
//! build can be followed by its `stack` and `operation_id` fields.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{AppConfig, ObservabilityConfig};
use crate::errors::{GatelinkError, Result};

/// Create a tracing span for a build or submission step
///
/// ```rust,ignore
/// let span = build_span!("synthesize", "DocumentConverterApiGWStack");
/// let span = build_span!("submit", stack_name, engine = "filesystem");
/// ```
#[macro_export]
macro_rules! build_span {
    ($operation:expr, $stack:expr) => {
        tracing::info_span!(
            "build_operation",
            operation = %$operation,
            stack = %$stack,
            operation_id = %uuid::Uuid::new_v4()
        )
    };
    ($operation:expr, $stack:expr, $($field:tt)*) => {
        tracing::info_span!(
            "build_operation",
            operation = %$operation,
            stack = %$stack,
            operation_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Build the filter: `RUST_LOG` wins over the configured level
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

/// Install the global subscriber. Calling it twice is harmless; the second
/// call leaves the existing subscriber in place.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = env_filter(config);

    let installed = if config.json_logging {
        tracing::subscriber::set_global_default(
            fmt().json().with_env_filter(filter).with_current_span(true).finish(),
        )
    } else {
        tracing::subscriber::set_global_default(
            fmt().with_env_filter(filter).with_writer(std::io::stderr).finish(),
        )
    };

    if installed.is_err() {
        // Subscriber already set elsewhere (e.g. tests); ignore.
        tracing::debug!("Global tracing subscriber already installed");
    }

    Ok(())
}

/// Parse a log level string early so typos surface as config errors
pub fn check_log_level(level: &str) -> Result<()> {
    EnvFilter::try_new(level)
        .map(|_| ())
        .map_err(|e| GatelinkError::config(format!("Invalid log level '{}': {}", level, e)))
}

/// Log configuration at startup
pub fn log_config_info(config: &AppConfig) {
    tracing::info!(
        stack = %config.stack.stack_name(),
        region = %config.stack.region,
        account = %config.stack.account,
        target_endpoint = %config.stack.target_endpoint_handle,
        stage = %config.stack.stage_name,
        allowed_sources = config.stack.allowed_source_ips.len(),
        log_retention_days = config.stack.log_retention_days,
        json_logging = config.observability.json_logging,
        "gatelink configuration"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_macros_compile() {
        let _span = build_span!("synthesize", "DocumentConverterApiGWStack");
        let _span = build_span!("submit", "DocumentConverterApiGWStack", engine = "filesystem");
    }

    #[test]
    #[traced_test]
    fn test_build_span_carries_uuid_operation_id() {
        let span = build_span!("synthesize", "DocumentConverterApiGWStack");
        span.in_scope(|| tracing::info!("inside build"));

        logs_assert(|lines: &[&str]| {
            let line = lines
                .iter()
                .find(|line| line.contains("inside build"))
                .ok_or_else(|| "no log line from inside the span".to_string())?;
            let id = line
                .split("operation_id=")
                .nth(1)
                .and_then(|rest| rest.split(|c| c == '}' || c == ' ').next())
                .ok_or_else(|| format!("no operation_id in '{}'", line))?;
            uuid::Uuid::parse_str(id).map(|_| ()).map_err(|e| format!("'{}' is not a uuid: {}", id, e))
        });
    }

    #[test]
    fn test_check_log_level() {
        assert!(check_log_level("debug").is_ok());
        assert!(check_log_level("gatelink=trace,info").is_ok());
        assert!(check_log_level("gatelink=verbose").is_err());
    }

    #[test]
    fn test_env_filter_uses_configured_level() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = ObservabilityConfig { log_level: "warn".to_string(), ..Default::default() };
        assert_eq!(env_filter(&config).to_string(), "warn");
    }

    #[test]
    fn test_log_config_info() {
        // This should not panic
        log_config_info(&AppConfig::default());
    }
}
