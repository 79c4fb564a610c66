//! # Deployment Engines
//!
//! A template is handed to an engine exactly once per deployment. The engine
//! owns everything that happens after that point: provider-side checks,
//! assigning physical ids and reporting the resolved stack outputs.

pub mod filesystem;
pub mod outputs;

pub use filesystem::FileSystemEngine;
pub use outputs::{DeployedOutput, OutputRegistry, StackOutputsRecord};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::errors::Result;
use crate::template::Template;
use crate::topology::StackIdentity;

/// Accepts synthesized templates for deployment
#[async_trait]
pub trait DeploymentEngine: Send + Sync {
    /// Submit one stack. Errors raised by the provider surface as
    /// `ProviderRejected` with the provider's reason unchanged.
    async fn submit(&self, stack: &StackIdentity, template: &Template) -> Result<DeploymentReceipt>;
}

/// What a successful submission reports back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentReceipt {
    pub stack_name: String,
    /// Output name -> resolved value
    pub outputs: BTreeMap<String, String>,
    /// Logical id -> physical id
    pub physical_ids: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_path: Option<PathBuf>,
}

impl DeploymentReceipt {
    pub fn output(&self, name: &str) -> Option<&str> {
        self.outputs.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GatelinkError;

    struct RejectingEngine {
        reason: String,
    }

    #[async_trait]
    impl DeploymentEngine for RejectingEngine {
        async fn submit(&self, stack: &StackIdentity, _template: &Template) -> Result<DeploymentReceipt> {
            Err(GatelinkError::provider_rejected(&stack.name, &self.reason))
        }
    }

    #[test]
    fn rejection_reason_passes_through() {
        let engine: Box<dyn DeploymentEngine> =
            Box::new(RejectingEngine { reason: "Rate exceeded (Service: CloudFormation)".to_string() });
        let stack = StackIdentity::new("StackA", "us-east-1", "123456789012");

        let err = tokio_test::block_on(engine.submit(&stack, &Template::new(None))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Provider rejected stack 'StackA': Rate exceeded (Service: CloudFormation)"
        );
    }

    #[test]
    fn receipt_output_lookup() {
        let mut outputs = BTreeMap::new();
        outputs.insert("ApiGatewayURL".to_string(), "https://abc/DEV/".to_string());
        let receipt = DeploymentReceipt {
            stack_name: "StackA".to_string(),
            outputs,
            physical_ids: BTreeMap::new(),
            template_path: None,
        };
        assert_eq!(receipt.output("ApiGatewayURL"), Some("https://abc/DEV/"));
        assert!(receipt.output("Missing").is_none());
    }
}
