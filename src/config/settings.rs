//! # Configuration Settings
//!
//! Defines the configuration structure for a gatelink build.

use crate::domain::{parse_cidr_list, parse_methods, stage::validate_stage_name, HttpMethod};
use crate::errors::{GatelinkError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

lazy_static! {
    static ref REGION_REGEX: Regex = Regex::new(r"^[a-z]{2}(-gov|-iso[a-z]*)?-[a-z]+-[0-9]$")
        .expect("REGION_REGEX should be a valid regex pattern");
    static ref ACCOUNT_REGEX: Regex =
        Regex::new(r"^[0-9]{12}$").expect("ACCOUNT_REGEX should be a valid regex pattern");
    static ref APPLICATION_NAME_REGEX: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9_-]{0,127}$")
        .expect("APPLICATION_NAME_REGEX should be a valid regex pattern");
}

/// Default stage name
pub const DEFAULT_STAGE_NAME: &str = "DEV";

/// Default access log retention in days
pub const DEFAULT_LOG_RETENTION_DAYS: u32 = 7;

/// Default managed permissions boundary applied to every role the stack creates
pub const DEFAULT_PERMISSIONS_BOUNDARY: &str = "Core-PermissionBoundaryPolicy";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Stack configuration
    #[validate(nested)]
    pub stack: StackConfig,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(GatelinkError::from)?;
        self.stack.validate_custom()
    }
}

/// Everything a single topology build needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct StackConfig {
    /// Provider region the stack is deployed to
    #[validate(custom(function = "validate_region"))]
    pub region: String,

    /// Provider account identifier
    #[validate(custom(function = "validate_account"))]
    pub account: String,

    /// Application name; namespaces the log sink and names the gateway
    #[validate(custom(function = "validate_application_name"))]
    pub application_name: String,

    /// Stack name override (defaults to `<application_name>ApiGWStack`)
    pub stack_name: Option<String>,

    /// Handle of the load balancer the private link targets
    #[validate(length(min = 1, message = "Target endpoint handle cannot be empty"))]
    pub target_endpoint_handle: String,

    /// CIDR blocks allowed to invoke the gateway. Empty denies everyone.
    #[validate(custom(function = "validate_cidrs"))]
    pub allowed_source_ips: Vec<String>,

    /// Methods proxied on the catch-all path
    #[validate(custom(function = "validate_methods"))]
    pub methods: Vec<String>,

    /// Deployment stage name
    #[validate(custom(function = "validate_stage"))]
    pub stage_name: String,

    /// Access log retention in days
    #[validate(range(min = 1, max = 3653, message = "Log retention must be between 1 and 3653 days"))]
    pub log_retention_days: u32,

    /// Managed policy used as permissions boundary (None = no boundary)
    pub permissions_boundary: Option<String>,

    /// Provision the account-level logging role
    pub cloud_watch_role: bool,

    /// Load balancers the static resolver can look up
    #[validate(nested)]
    pub endpoints: Vec<EndpointCatalogEntry>,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            region: String::new(),
            account: String::new(),
            application_name: String::new(),
            stack_name: None,
            target_endpoint_handle: String::new(),
            allowed_source_ips: vec![],
            methods: vec!["GET".to_string(), "POST".to_string()],
            stage_name: DEFAULT_STAGE_NAME.to_string(),
            log_retention_days: DEFAULT_LOG_RETENTION_DAYS,
            permissions_boundary: Some(DEFAULT_PERMISSIONS_BOUNDARY.to_string()),
            cloud_watch_role: true,
            endpoints: vec![],
        }
    }
}

impl StackConfig {
    /// Name of the stack submitted to the engine
    pub fn stack_name(&self) -> String {
        self.stack_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("{}ApiGWStack", self.application_name))
    }

    /// Parsed methods, duplicates collapsed in order of first appearance
    pub fn http_methods(&self) -> Result<Vec<HttpMethod>> {
        let mut methods = Vec::new();
        for method in parse_methods(&self.methods)? {
            if !methods.contains(&method) {
                methods.push(method);
            }
        }
        Ok(methods)
    }

    /// Checks that go beyond what the validator derives express
    fn validate_custom(&self) -> Result<()> {
        let stack_name = self.stack_name();
        if !is_valid_stack_name(&stack_name) {
            return Err(GatelinkError::validation_field(
                format!(
                    "Stack name '{}' must start with a letter and contain only letters, digits and hyphens",
                    stack_name
                ),
                "stack_name",
            ));
        }

        let mut handles = std::collections::HashSet::new();
        for entry in &self.endpoints {
            if !handles.insert(entry.handle.as_str()) {
                return Err(GatelinkError::validation_field(
                    format!("Endpoint handle '{}' is listed twice", entry.handle),
                    "endpoints",
                ));
            }
        }

        Ok(())
    }

    /// Validate this section on its own
    pub fn validate_all(&self) -> Result<()> {
        Validate::validate(self).map_err(GatelinkError::from)?;
        self.validate_custom()
    }
}

fn is_valid_stack_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && name.len() <= 128
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// A load balancer entry the static resolver knows about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct EndpointCatalogEntry {
    #[validate(length(min = 1, message = "Endpoint handle cannot be empty"))]
    pub handle: String,

    #[validate(length(min = 1, message = "Endpoint ARN cannot be empty"))]
    pub arn: String,

    #[validate(length(min = 1, message = "Endpoint DNS name cannot be empty"))]
    pub dns_name: String,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_logging: false }
    }
}

fn validate_region(region: &str) -> std::result::Result<(), ValidationError> {
    if REGION_REGEX.is_match(region) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_region").with_message("Region must look like 'us-east-1'".into()))
    }
}

fn validate_account(account: &str) -> std::result::Result<(), ValidationError> {
    if ACCOUNT_REGEX.is_match(account) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_account").with_message("Account must be 12 digits".into()))
    }
}

fn validate_application_name(name: &str) -> std::result::Result<(), ValidationError> {
    if APPLICATION_NAME_REGEX.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_application_name")
            .with_message("Application name must start with a letter".into()))
    }
}

fn validate_stage(name: &str) -> std::result::Result<(), ValidationError> {
    validate_stage_name(name).map_err(|e| {
        ValidationError::new("invalid_stage_name").with_message(e.to_string().into())
    })
}

fn validate_cidrs(values: &Vec<String>) -> std::result::Result<(), ValidationError> {
    parse_cidr_list(values)
        .map(|_| ())
        .map_err(|e| ValidationError::new("invalid_cidr").with_message(e.to_string().into()))
}

fn validate_methods(values: &Vec<String>) -> std::result::Result<(), ValidationError> {
    parse_methods(values)
        .map(|_| ())
        .map_err(|e| ValidationError::new("unsupported_method").with_message(e.to_string().into()))
}
