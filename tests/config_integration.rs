//! Integration tests for configuration management
//!
//! These tests validate the layering order: file, then `GATELINK_`
//! environment variables, then command line overrides.

mod common;

use gatelink::config::{load_config, load_validated, ConfigOverrides};
use gatelink::{build_topology, GatelinkError, Result, StaticEndpointResolver};
use std::env;
use std::io::Write;
use std::sync::Mutex;

// Use a mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const ENV_KEYS: &[&str] = &[
    "GATELINK_STACK__REGION",
    "GATELINK_STACK__ALLOWED_SOURCE_IPS",
    "GATELINK_STACK__LOG_RETENTION_DAYS",
    "GATELINK_STACK__STAGE_NAME",
    "GATELINK_STACK__ACCOUNT",
];

struct EnvGuard {
    saved: Vec<(&'static str, Option<String>)>,
}

impl EnvGuard {
    fn capture() -> Self {
        Self { saved: ENV_KEYS.iter().map(|k| (*k, env::var(k).ok())).collect() }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key),
            }
        }
    }
}

fn config_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(
        file,
        r#"
[stack]
region = "us-east-1"
account = "123456789012"
application_name = "DocumentConverter"
target_endpoint_handle = "{handle}"
allowed_source_ips = ["10.0.0.0/8"]

[[stack.endpoints]]
handle = "{handle}"
arn = "{arn}"
dns_name = "{dns}"

[observability]
log_level = "warn"
"#,
        handle = common::NLB_HANDLE,
        arn = common::NLB_ARN,
        dns = common::NLB_DNS,
    )
    .unwrap();
    file
}

/// File values and built-in defaults combine
#[test]
fn test_file_layer_with_defaults() -> Result<()> {
    let _guard = ENV_MUTEX.lock().unwrap();
    let _env = EnvGuard::capture();
    for key in ENV_KEYS {
        env::remove_var(key);
    }

    let file = config_file();
    let config = load_validated(Some(file.path()), ConfigOverrides::default())?;

    assert_eq!(config.stack.region, "us-east-1");
    assert_eq!(config.stack.stage_name, "DEV");
    assert_eq!(config.stack.log_retention_days, 7);
    assert_eq!(config.stack.methods, vec!["GET", "POST"]);
    assert_eq!(config.observability.log_level, "warn");
    Ok(())
}

/// Environment variables override the file
#[test]
fn test_environment_overrides_file() -> Result<()> {
    let _guard = ENV_MUTEX.lock().unwrap();
    let _env = EnvGuard::capture();

    env::set_var("GATELINK_STACK__REGION", "eu-west-1");
    env::set_var("GATELINK_STACK__ALLOWED_SOURCE_IPS", "10.0.0.0/8,192.168.0.0/16");
    env::set_var("GATELINK_STACK__LOG_RETENTION_DAYS", "14");

    let file = config_file();
    let config = load_config(Some(file.path()))?;

    assert_eq!(config.stack.region, "eu-west-1");
    assert_eq!(config.stack.allowed_source_ips, vec!["10.0.0.0/8", "192.168.0.0/16"]);
    assert_eq!(config.stack.log_retention_days, 14);
    Ok(())
}

/// Digit-only identifiers from the environment keep their leading zeros
#[test]
fn test_environment_account_keeps_leading_zero() -> Result<()> {
    let _guard = ENV_MUTEX.lock().unwrap();
    let _env = EnvGuard::capture();
    for key in ENV_KEYS {
        env::remove_var(key);
    }
    env::set_var("GATELINK_STACK__ACCOUNT", "012345678901");
    env::set_var("GATELINK_STACK__STAGE_NAME", "2024");
    env::set_var("GATELINK_STACK__ALLOWED_SOURCE_IPS", "10.0.0.0/8,192.168.0.0/16");

    let file = config_file();
    let config = load_validated(Some(file.path()), ConfigOverrides::default())?;

    assert_eq!(config.stack.account, "012345678901");
    assert_eq!(config.stack.stage_name, "2024");
    assert_eq!(config.stack.allowed_source_ips, vec!["10.0.0.0/8", "192.168.0.0/16"]);
    Ok(())
}

/// Command line overrides win over the environment
#[test]
fn test_cli_overrides_win() -> Result<()> {
    let _guard = ENV_MUTEX.lock().unwrap();
    let _env = EnvGuard::capture();
    env::set_var("GATELINK_STACK__STAGE_NAME", "QA");

    let file = config_file();
    let overrides = ConfigOverrides {
        stage_name: Some("PROD".to_string()),
        allowed_source_ips: vec!["172.16.0.0/12".to_string()],
        ..ConfigOverrides::default()
    };
    let config = load_validated(Some(file.path()), overrides)?;

    assert_eq!(config.stack.stage_name, "PROD");
    assert_eq!(config.stack.allowed_source_ips, vec!["172.16.0.0/12"]);

    let resolver = StaticEndpointResolver::from_catalog(&config.stack.endpoints)?;
    let topology = build_topology(config.stack, resolver)?;
    assert!(topology.endpoint_url.ends_with("/PROD/"));
    Ok(())
}

/// A bad value in the environment is reported as a validation error
#[test]
fn test_invalid_environment_value() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let _env = EnvGuard::capture();
    env::set_var("GATELINK_STACK__ALLOWED_SOURCE_IPS", "not-a-cidr");

    let file = config_file();
    let result = load_validated(Some(file.path()), ConfigOverrides::default());
    assert!(matches!(result, Err(GatelinkError::Validation { .. })));
}

/// Installing the subscriber twice leaves the first one in place
#[test]
fn test_init_logging_twice() {
    let config = gatelink::config::ObservabilityConfig::default();
    assert!(gatelink::observability::init_logging(&config).is_ok());
    assert!(gatelink::observability::init_logging(&config).is_ok());
}
