//! # Topology
//!
//! Turns a [`StackConfig`] into the full object graph in one linear pass:
//! resolve the load balancer, build the link, the policy and the
//! integrations, assemble the gateway, deploy it to a stage and publish the
//! invocation URL. Nothing is submitted here; a failure anywhere leaves no
//! trace outside the returned error.

pub mod builder;

pub use builder::TopologyBuilder;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::build_span;
use crate::config::StackConfig;
use crate::domain::{
    parse_cidr_list, DeploymentStage, GatewayDefinition, PrivateLink, StackOutput,
};
use crate::errors::Result;
use crate::resolver::EndpointResolver;

/// Which stack, where
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackIdentity {
    pub name: String,
    pub region: String,
    pub account: String,
}

impl StackIdentity {
    pub fn new(
        name: impl Into<String>,
        region: impl Into<String>,
        account: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), region: region.into(), account: account.into() }
    }

    /// Domain suffix of provider endpoints in this region
    pub fn url_suffix(&self) -> &'static str {
        if self.region.starts_with("cn-") {
            "amazonaws.com.cn"
        } else {
            "amazonaws.com"
        }
    }

    /// Partition used in resource names
    pub fn partition(&self) -> &'static str {
        if self.region.starts_with("cn-") {
            "aws-cn"
        } else if self.region.starts_with("us-gov-") {
            "aws-us-gov"
        } else {
            "aws"
        }
    }
}

/// Everything one build produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topology {
    pub identity: StackIdentity,
    pub link: PrivateLink,
    pub stage: DeploymentStage,
    pub outputs: Vec<StackOutput>,
    pub permissions_boundary: Option<String>,
    pub endpoint_url: String,
}

impl Topology {
    pub fn gateway(&self) -> &GatewayDefinition {
        self.stage.gateway()
    }
}

/// Build the whole topology from configuration.
///
/// The configuration is validated first so malformed input fails before the
/// resolver is consulted.
pub fn build_topology<R: EndpointResolver>(config: StackConfig, resolver: R) -> Result<Topology> {
    config.validate_all()?;

    let identity = StackIdentity::new(config.stack_name(), &config.region, &config.account);
    let span = build_span!("build", identity.name);
    let _guard = span.enter();

    let allowed = parse_cidr_list(&config.allowed_source_ips)?;
    let methods = config.http_methods()?;

    let mut builder = TopologyBuilder::new(identity.clone(), &config.application_name, resolver);

    let endpoint = builder.resolve_endpoint(&config.target_endpoint_handle)?;
    let link = builder.build_link(endpoint)?;
    let policy = builder.build_policy(&allowed);
    let integrations = builder.build_integrations(&link, &methods);
    let gateway = builder
        .build_gateway(policy, integrations)?
        .with_cloud_watch_role(config.cloud_watch_role);
    let stage = builder.deploy(gateway, &config.stage_name, config.log_retention_days)?;
    let endpoint_url = builder.emit_endpoint_url(&stage);

    info!(
        stack = %identity.name,
        stage = %stage.name(),
        methods = stage.gateway().integrations().len(),
        policy_statements = stage.gateway().policy().len(),
        "Topology built"
    );

    Ok(Topology {
        identity,
        link,
        stage,
        outputs: builder.into_outputs(),
        permissions_boundary: config.permissions_boundary.filter(|b| !b.trim().is_empty()),
        endpoint_url,
    })
}
