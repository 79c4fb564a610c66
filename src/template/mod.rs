//! # Stack Templates
//!
//! Declarative description of the stack as submitted to the provider.
//! Resources are keyed by logical id; cross-resource links are expressed with
//! `Ref`, `Fn::GetAtt` and `Fn::Sub` so the provider can resolve them once
//! physical ids exist.

pub mod intrinsics;
pub mod synth;

pub use synth::synthesize;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::errors::{GatelinkError, Result};

/// Template format version header
pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// Full stack template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,

    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "Resources", default)]
    pub resources: BTreeMap<String, Resource>,

    #[serde(rename = "Outputs", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Output>,
}

/// One resource declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub properties: Value,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, properties: Value) -> Self {
        Self { resource_type: resource_type.into(), properties, depends_on: Vec::new() }
    }

    pub fn depends_on(mut self, logical_ids: impl IntoIterator<Item = String>) -> Self {
        self.depends_on.extend(logical_ids);
        self
    }

    /// Property lookup by top-level key
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// Stack output declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    pub value: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export: Option<Export>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Export {
    pub name: String,
}

impl Template {
    pub fn new(description: Option<String>) -> Self {
        Self {
            format_version: TEMPLATE_FORMAT_VERSION.to_string(),
            description,
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Add a resource; logical ids must be unique within the template
    pub fn add_resource(&mut self, logical_id: impl Into<String>, resource: Resource) -> Result<()> {
        let logical_id = logical_id.into();
        if self.resources.contains_key(&logical_id) {
            return Err(GatelinkError::deployment(format!(
                "Logical id '{}' is declared twice",
                logical_id
            )));
        }
        self.resources.insert(logical_id, resource);
        Ok(())
    }

    pub fn add_output(&mut self, name: impl Into<String>, output: Output) -> Result<()> {
        let name = name.into();
        if self.outputs.contains_key(&name) {
            return Err(GatelinkError::deployment(format!("Output '{}' is declared twice", name)));
        }
        self.outputs.insert(name, output);
        Ok(())
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id)
    }

    /// Resources of one type, in logical id order
    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a Resource)> + 'a {
        self.resources.iter().filter(move |(_, r)| r.resource_type == resource_type)
    }

    /// Export names declared by this template
    pub fn export_names(&self) -> Vec<&str> {
        self.outputs.values().filter_map(|o| o.export.as_ref().map(|e| e.name.as_str())).collect()
    }

    /// Every `Ref`, `Fn::GetAtt`, `Fn::Sub` placeholder and `DependsOn`
    /// entry must name a declared resource.
    pub fn check_references(&self) -> Result<()> {
        let declared: BTreeSet<&str> = self.resources.keys().map(String::as_str).collect();
        let mut dangling = Vec::new();

        for (logical_id, resource) in &self.resources {
            for target in intrinsics::referenced_ids(&resource.properties)
                .into_iter()
                .chain(resource.depends_on.iter().cloned())
            {
                if !declared.contains(target.as_str()) {
                    dangling.push(format!("{} -> {}", logical_id, target));
                }
            }
        }

        for (name, output) in &self.outputs {
            for target in intrinsics::referenced_ids(&output.value) {
                if !declared.contains(target.as_str()) {
                    dangling.push(format!("output {} -> {}", name, target));
                }
            }
        }

        if dangling.is_empty() {
            Ok(())
        } else {
            Err(GatelinkError::deployment(format!(
                "Template references undeclared resources: {}",
                dangling.join(", ")
            )))
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}
