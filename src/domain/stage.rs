//! Deployment stage domain types

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::gateway::GatewayDefinition;
use super::id::{LogSinkId, StageId};
use crate::errors::{GatelinkError, Result};

lazy_static! {
    /// Stage names: alphanumeric and underscore, 1-128 chars
    static ref STAGE_NAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_]{1,128}$")
        .expect("STAGE_NAME_REGEX should be a valid regex pattern");
}

/// Prefix of the access log sink name
pub const LOG_SINK_PREFIX: &str = "/api-gw/";

/// Default access log line format
pub const DEFAULT_ACCESS_LOG_FORMAT: &str = "$context.identity.sourceIp $context.identity.caller \
$context.identity.user [$context.requestTime] \"$context.httpMethod $context.resourcePath \
$context.protocol\" $context.status $context.responseLength $context.requestId";

/// Check a stage name
pub fn validate_stage_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(GatelinkError::validation_field("Stage name cannot be empty", "stage_name"));
    }
    if !STAGE_NAME_REGEX.is_match(name) {
        return Err(GatelinkError::validation_field(
            format!("Stage name '{}' may only contain letters, digits and underscores", name),
            "stage_name",
        ));
    }
    Ok(())
}

/// Execution log verbosity for every method of the stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MethodLoggingLevel {
    Off,
    Error,
    Info,
}

impl MethodLoggingLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodLoggingLevel::Off => "OFF",
            MethodLoggingLevel::Error => "ERROR",
            MethodLoggingLevel::Info => "INFO",
        }
    }
}

/// Log group receiving access logs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSink {
    pub id: LogSinkId,
    pub name: String,
    pub retention_days: u32,
}

impl LogSink {
    /// `/api-gw/<application>` with the given retention
    pub fn for_application(application: &str, retention_days: u32) -> Result<Self> {
        if application.trim().is_empty() {
            return Err(GatelinkError::validation_field(
                "Application name cannot be empty",
                "application_name",
            ));
        }
        if retention_days == 0 {
            return Err(GatelinkError::validation_field(
                "Log retention must be at least one day",
                "log_retention_days",
            ));
        }
        Ok(Self {
            id: LogSinkId::default(),
            name: format!("{}{}", LOG_SINK_PREFIX, application),
            retention_days,
        })
    }
}

/// Logging attached to a stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageLogging {
    pub sink: LogSink,
    pub level: MethodLoggingLevel,
    pub data_trace: bool,
    pub access_log_format: String,
}

impl StageLogging {
    /// INFO execution logs with data trace, access logs to `sink`
    pub fn info(sink: LogSink) -> Self {
        Self {
            sink,
            level: MethodLoggingLevel::Info,
            data_trace: true,
            access_log_format: DEFAULT_ACCESS_LOG_FORMAT.to_string(),
        }
    }
}

/// Named, immutable snapshot of a gateway plus its logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStage {
    id: StageId,
    name: String,
    gateway: GatewayDefinition,
    logging: StageLogging,
}

impl DeploymentStage {
    pub(crate) fn new(name: String, gateway: GatewayDefinition, logging: StageLogging) -> Self {
        Self { id: StageId::default(), name, gateway, logging }
    }

    pub fn id(&self) -> &StageId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gateway(&self) -> &GatewayDefinition {
        &self.gateway
    }

    pub fn logging(&self) -> &StageLogging {
        &self.logging
    }
}
