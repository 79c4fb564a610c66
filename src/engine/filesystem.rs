//! Filesystem deployment engine
//!
//! Plays the provider locally: applies the provider-side checks the gateway
//! stack can trip, writes the template to `<out>/<stack>.template.json`,
//! assigns deterministic physical ids and records the resolved outputs.

use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Instrument};

use super::outputs::{write_atomic, DeployedOutput, OutputRegistry, StackOutputsRecord};
use super::{DeploymentEngine, DeploymentReceipt};
use crate::build_span;
use crate::domain::output::substitute;
use crate::errors::{GatelinkError, Result};
use crate::template::synth::LOG_GROUP_TYPE;
use crate::template::Template;
use crate::topology::StackIdentity;

/// Retention periods (days) the log service accepts
pub const ALLOWED_RETENTION_DAYS: &[u64] = &[
    1, 3, 5, 7, 14, 30, 60, 90, 120, 150, 180, 365, 400, 545, 731, 1096, 1827, 2192, 2557, 2922,
    3288, 3653,
];

const TEMPLATE_SUFFIX: &str = ".template.json";
const PHYSICAL_ID_LEN: usize = 10;

/// Engine writing deployments under one output directory
#[derive(Debug, Clone)]
pub struct FileSystemEngine {
    out_dir: PathBuf,
    registry: OutputRegistry,
}

impl FileSystemEngine {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        let out_dir = out_dir.into();
        Self { registry: OutputRegistry::new(out_dir.clone()), out_dir }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn registry(&self) -> &OutputRegistry {
        &self.registry
    }

    pub fn template_path(&self, stack_name: &str) -> PathBuf {
        self.out_dir.join(format!("{}{}", stack_name, TEMPLATE_SUFFIX))
    }

    /// First ten hex characters of SHA-256 over `<stack>/<logical id>`
    pub fn physical_id(stack_name: &str, logical_id: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(stack_name.as_bytes());
        hasher.update(b"/");
        hasher.update(logical_id.as_bytes());
        let mut id = hex::encode(hasher.finalize());
        id.truncate(PHYSICAL_ID_LEN);
        id
    }

    fn check_log_retention(stack: &StackIdentity, template: &Template) -> Result<()> {
        for (logical_id, resource) in template.resources_of_type(LOG_GROUP_TYPE) {
            let Some(days) = resource.property("RetentionInDays") else {
                continue;
            };
            let accepted = days.as_u64().is_some_and(|d| ALLOWED_RETENTION_DAYS.contains(&d));
            if !accepted {
                return Err(GatelinkError::provider_rejected(
                    &stack.name,
                    format!(
                        "Invalid value for RetentionInDays on {}: {}. Allowed values are {:?}",
                        logical_id, days, ALLOWED_RETENTION_DAYS
                    ),
                ));
            }
        }
        Ok(())
    }

    async fn check_exports(&self, stack: &StackIdentity, template: &Template) -> Result<()> {
        let records = self.registry.list().await?;
        for export in template.export_names() {
            let owner = records
                .iter()
                .filter(|r| r.stack.name != stack.name)
                .find(|r| r.exports().any(|(name, _)| name == export));
            if let Some(owner) = owner {
                return Err(GatelinkError::provider_rejected(
                    &stack.name,
                    format!("Export with name {} is already exported by stack {}", export, owner.stack.name),
                ));
            }
        }
        Ok(())
    }

    fn resolve_value(
        value: &Value,
        stack: &StackIdentity,
        physical_ids: &BTreeMap<String, String>,
    ) -> Result<String> {
        let lookup = |name: &str| -> Option<String> {
            match name {
                "AWS::Region" => Some(stack.region.clone()),
                "AWS::AccountId" => Some(stack.account.clone()),
                "AWS::StackName" => Some(stack.name.clone()),
                "AWS::Partition" => Some(stack.partition().to_string()),
                "AWS::URLSuffix" => Some(stack.url_suffix().to_string()),
                other => physical_ids.get(other).cloned(),
            }
        };

        match value {
            Value::String(literal) => Ok(literal.clone()),
            Value::Object(map) => {
                if let Some(Value::String(expression)) = map.get("Fn::Sub") {
                    Ok(substitute(expression, lookup))
                } else if let Some(Value::String(target)) = map.get("Ref") {
                    lookup(target).ok_or_else(|| {
                        GatelinkError::deployment(format!("Unresolvable reference to {}", target))
                    })
                } else {
                    Err(GatelinkError::deployment(format!(
                        "Unsupported output expression: {}",
                        value
                    )))
                }
            }
            other => Ok(other.to_string()),
        }
    }

    async fn apply(&self, stack: &StackIdentity, template: &Template) -> Result<DeploymentReceipt> {
        template.check_references()?;
        Self::check_log_retention(stack, template)?;
        self.check_exports(stack, template).await?;

        let template_path = self.template_path(&stack.name);
        write_atomic(&template_path, template.to_json()?.as_bytes()).await?;

        let physical_ids: BTreeMap<String, String> = template
            .resources
            .keys()
            .map(|logical_id| (logical_id.clone(), Self::physical_id(&stack.name, logical_id)))
            .collect();

        let mut deployed = BTreeMap::new();
        for (name, output) in &template.outputs {
            let value = Self::resolve_value(&output.value, stack, &physical_ids)?;
            if value.contains("${") {
                warn!(output = %name, value = %value, "Output still carries unresolved placeholders");
            }
            deployed.insert(
                name.clone(),
                DeployedOutput {
                    value,
                    export_name: output.export.as_ref().map(|e| e.name.clone()),
                },
            );
        }

        let record = StackOutputsRecord { stack: stack.clone(), outputs: deployed };
        self.registry.write(&record).await?;

        info!(
            template = %template_path.display(),
            resources = physical_ids.len(),
            outputs = record.outputs.len(),
            "Stack deployed"
        );

        Ok(DeploymentReceipt {
            stack_name: stack.name.clone(),
            outputs: record.outputs.into_iter().map(|(name, o)| (name, o.value)).collect(),
            physical_ids,
            template_path: Some(template_path),
        })
    }
}

#[async_trait]
impl DeploymentEngine for FileSystemEngine {
    async fn submit(&self, stack: &StackIdentity, template: &Template) -> Result<DeploymentReceipt> {
        let span = build_span!("submit", stack.name, engine = "filesystem");
        self.apply(stack, template).instrument(span).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::intrinsics::sub;
    use crate::template::{Export, Output, Resource};
    use serde_json::json;
    use tempfile::TempDir;

    fn stack(name: &str) -> StackIdentity {
        StackIdentity::new(name, "us-east-1", "123456789012")
    }

    fn template(retention: u64, export: &str) -> Template {
        let mut template = Template::new(None);
        template
            .add_resource("RestApiGw", Resource::new("AWS::ApiGateway::RestApi", json!({})))
            .unwrap();
        template
            .add_resource(
                "ApiGwLogGroup",
                Resource::new(LOG_GROUP_TYPE, json!({ "RetentionInDays": retention })),
            )
            .unwrap();
        template
            .add_output(
                "ApiGatewayURL",
                Output {
                    value: sub("https://${RestApiGw}.execute-api.${AWS::Region}.amazonaws.com/DEV/"),
                    description: None,
                    export: Some(Export { name: export.to_string() }),
                },
            )
            .unwrap();
        template
    }

    #[test]
    fn physical_ids_are_deterministic() {
        let a = FileSystemEngine::physical_id("StackA", "RestApiGw");
        assert_eq!(a.len(), 10);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(a, FileSystemEngine::physical_id("StackA", "RestApiGw"));
        assert_ne!(a, FileSystemEngine::physical_id("StackB", "RestApiGw"));
    }

    #[tokio::test]
    async fn submit_writes_template_and_outputs() {
        let dir = TempDir::new().unwrap();
        let engine = FileSystemEngine::new(dir.path());
        let receipt = engine.submit(&stack("StackA"), &template(7, "ApiGatewayURL")).await.unwrap();

        let id = FileSystemEngine::physical_id("StackA", "RestApiGw");
        assert_eq!(
            receipt.output("ApiGatewayURL"),
            Some(format!("https://{}.execute-api.us-east-1.amazonaws.com/DEV/", id).as_str())
        );
        let written = tokio::fs::read_to_string(engine.template_path("StackA")).await.unwrap();
        assert_eq!(Template::from_json(&written).unwrap(), template(7, "ApiGatewayURL"));
        assert!(engine.registry().read("StackA").await.is_ok());
    }

    #[tokio::test]
    async fn unsupported_retention_is_rejected_by_provider() {
        let dir = TempDir::new().unwrap();
        let engine = FileSystemEngine::new(dir.path());
        let err = engine.submit(&stack("StackA"), &template(8, "ApiGatewayURL")).await.unwrap_err();
        assert!(matches!(err, GatelinkError::ProviderRejected { .. }));
        assert!(!err.is_local());
        assert!(!engine.template_path("StackA").exists());
    }

    #[tokio::test]
    async fn export_names_are_unique_across_stacks() {
        let dir = TempDir::new().unwrap();
        let engine = FileSystemEngine::new(dir.path());
        engine.submit(&stack("StackA"), &template(7, "ApiGatewayURL")).await.unwrap();

        // Redeploying the owner is fine
        engine.submit(&stack("StackA"), &template(14, "ApiGatewayURL")).await.unwrap();

        let err = engine.submit(&stack("StackB"), &template(7, "ApiGatewayURL")).await.unwrap_err();
        assert!(
            matches!(err, GatelinkError::ProviderRejected { ref reason, .. } if reason.contains("StackA"))
        );
    }

    #[tokio::test]
    async fn dangling_reference_never_reaches_disk() {
        let dir = TempDir::new().unwrap();
        let engine = FileSystemEngine::new(dir.path());
        let mut template = template(7, "ApiGatewayURL");
        template.resources.remove("RestApiGw");

        let err = engine.submit(&stack("StackA"), &template).await.unwrap_err();
        assert!(matches!(err, GatelinkError::Deployment { .. }));
        assert!(!engine.template_path("StackA").exists());
    }
}
