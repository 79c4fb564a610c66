//! Named stack outputs
//!
//! Output values may embed `${LogicalId}` placeholders for identifiers the
//! provider only assigns at deployment time. The same string is a valid
//! substitution expression in the synthesized template, and engines resolve
//! it when they report the deployed value.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref PLACEHOLDER_REGEX: Regex =
        Regex::new(r"\$\{([^}]*)\}").expect("PLACEHOLDER_REGEX should be a valid regex pattern");
}

/// Name (and export name) of the invocation URL output
pub const ENDPOINT_URL_OUTPUT: &str = "ApiGatewayURL";

/// A value published by the build for downstream consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackOutput {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl StackOutput {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into(), export_name: None, description: None }
    }

    /// Make the output readable by other stacks under `export_name`
    pub fn exported_as(mut self, export_name: impl Into<String>) -> Self {
        self.export_name = Some(export_name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Logical ids referenced through `${...}` placeholders
    pub fn placeholders(&self) -> Vec<String> {
        placeholders(&self.value)
    }
}

/// Extract `${Name}` placeholders, skipping pseudo parameters such as `${AWS::Region}`
pub fn placeholders(value: &str) -> Vec<String> {
    PLACEHOLDER_REGEX
        .captures_iter(value)
        .filter_map(|caps| {
            let base = caps[1].split('.').next().unwrap_or_default();
            (!base.is_empty() && !base.contains("::")).then(|| base.to_string())
        })
        .collect()
}

/// Replace every `${Name}` placeholder using `lookup`; unknown names are left as-is
pub fn substitute(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    PLACEHOLDER_REGEX
        .replace_all(value, |caps: &Captures<'_>| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
