//! # Configuration Management
//!
//! Configuration is layered: built-in defaults, then an optional file (TOML
//! or YAML, picked by extension), then `GATELINK_`-prefixed environment
//! variables using `__` between sections, then command line overrides.

pub mod settings;

pub use settings::{
    AppConfig, EndpointCatalogEntry, ObservabilityConfig, StackConfig, DEFAULT_LOG_RETENTION_DAYS,
    DEFAULT_PERMISSIONS_BOUNDARY, DEFAULT_STAGE_NAME,
};

use crate::errors::{GatelinkError, Result};
use std::path::Path;
use tracing::debug;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "GATELINK";

/// Keys whose environment values are identifiers and must stay text even when
/// they look numeric (`012345678901` keeps its leading zero)
const TEXT_KEYS: &[&str] = &[
    "stack.account",
    "stack.region",
    "stack.application_name",
    "stack.stack_name",
    "stack.target_endpoint_handle",
    "stack.stage_name",
    "stack.permissions_boundary",
];

/// Environment variable carrying `key`, e.g. `GATELINK_STACK__ACCOUNT`
pub fn env_var_name(key: &str) -> String {
    format!("{}_{}", ENV_PREFIX, key.replace('.', "__").to_uppercase())
}

/// Values supplied on the command line, applied after every other layer
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub stage_name: Option<String>,
    pub target_endpoint_handle: Option<String>,
    pub allowed_source_ips: Vec<String>,
    pub log_level: Option<String>,
}

impl ConfigOverrides {
    pub fn apply(self, config: &mut AppConfig) {
        if let Some(stage) = self.stage_name {
            config.stack.stage_name = stage;
        }
        if let Some(handle) = self.target_endpoint_handle {
            config.stack.target_endpoint_handle = handle;
        }
        if !self.allowed_source_ips.is_empty() {
            config.stack.allowed_source_ips = self.allowed_source_ips;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
    }
}

/// Load configuration from an optional file plus the environment.
///
/// The result is not validated; call [`AppConfig::validate`] once overrides
/// have been applied.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        debug!(path = %path.display(), "Loading configuration file");
        builder = builder.add_source(config::File::from(path).required(true));
    }

    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("stack.allowed_source_ips")
            .with_list_parse_key("stack.methods")
            .try_parsing(true),
    );

    // List keys need `try_parsing`, which also turns digit-only strings into
    // integers. Identifier keys are re-read verbatim on top.
    for key in TEXT_KEYS {
        builder = builder.set_override_option(*key, std::env::var(env_var_name(key)).ok())?;
    }

    let config: AppConfig = builder.build()?.try_deserialize()?;
    Ok(config)
}

/// Load, override and validate in one step
pub fn load_validated(path: Option<&Path>, overrides: ConfigOverrides) -> Result<AppConfig> {
    let mut config = load_config(path)?;
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Load and override, validating only the observability section. For
/// commands that read published records and never build a stack.
pub fn load_observability(path: Option<&Path>, overrides: ConfigOverrides) -> Result<AppConfig> {
    let mut config = load_config(path)?;
    overrides.apply(&mut config);
    validator::Validate::validate(&config.observability).map_err(GatelinkError::from)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TOML: &str = r#"
[stack]
region = "us-east-1"
account = "123456789012"
application_name = "DocumentConverter"
target_endpoint_handle = "nlb-1"
allowed_source_ips = ["10.0.0.0/8", "172.16.0.0/12"]

[[stack.endpoints]]
handle = "nlb-1"
arn = "arn:aws:elasticloadbalancing:us-east-1:123456789012:loadbalancer/net/nlb-1/1"
dns_name = "nlb-1.elb.us-east-1.amazonaws.com"

[observability]
json_logging = true
"#;

    fn write_config(contents: &str, suffix: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_toml_file() {
        let file = write_config(TOML, ".toml");
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.stack.region, "us-east-1");
        assert_eq!(config.stack.allowed_source_ips.len(), 2);
        assert_eq!(config.stack.endpoints.len(), 1);
        assert_eq!(config.stack.stage_name, "DEV");
        assert_eq!(config.stack.log_retention_days, 7);
        assert!(config.observability.json_logging);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_yaml_file() {
        let yaml = r#"
stack:
  region: eu-west-1
  account: "210987654321"
  application_name: Billing
  target_endpoint_handle: nlb-2
  stage_name: PROD
  log_retention_days: 30
"#;
        let file = write_config(yaml, ".yaml");
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.stack.stage_name, "PROD");
        assert_eq!(config.stack.log_retention_days, 30);
        assert!(config.stack.allowed_source_ips.is_empty());
    }

    #[test]
    fn test_env_var_name() {
        assert_eq!(env_var_name("stack.account"), "GATELINK_STACK__ACCOUNT");
        assert_eq!(env_var_name("stack.stage_name"), "GATELINK_STACK__STAGE_NAME");
    }

    #[test]
    fn test_observability_only_skips_stack() {
        let file = write_config("[observability]\nlog_level = \"debug\"\n", ".toml");
        let config = load_observability(Some(file.path()), ConfigOverrides::default()).unwrap();
        assert_eq!(config.observability.log_level, "debug");
        assert!(config.validate().is_err());

        let overrides =
            ConfigOverrides { log_level: Some(String::new()), ..Default::default() };
        assert!(load_observability(Some(file.path()), overrides).is_err());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = load_config(Some(Path::new("/nonexistent/gatelink.toml")));
        assert!(matches!(result, Err(crate::errors::GatelinkError::Config { .. })));
    }

    #[test]
    fn test_overrides_apply_last() {
        let file = write_config(TOML, ".toml");
        let overrides = ConfigOverrides {
            stage_name: Some("QA".to_string()),
            allowed_source_ips: vec!["192.168.0.0/16".to_string()],
            ..Default::default()
        };
        let config = load_validated(Some(file.path()), overrides).unwrap();
        assert_eq!(config.stack.stage_name, "QA");
        assert_eq!(config.stack.allowed_source_ips, vec!["192.168.0.0/16"]);
    }

    #[test]
    fn test_invalid_override_fails_validation() {
        let file = write_config(TOML, ".toml");
        let overrides =
            ConfigOverrides { stage_name: Some(String::new()), ..Default::default() };
        assert!(load_validated(Some(file.path()), overrides).is_err());
    }
}
