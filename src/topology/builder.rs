//! Topology builder operations
//!
//! Each operation consumes what the previous one produced, so the dependency
//! order (network and policy before the gateway, gateway before its stage) is
//! enforced by the types rather than checked at runtime.

use tracing::{debug, info, warn};

use super::StackIdentity;
use crate::domain::{
    AccessPolicy, CidrBlock, DeploymentStage, GatewayDefinition, GatewayId, HttpMethod, LinkId,
    LogSink, NetworkEndpoint, PrivateLink, RouteIntegration, StackOutput, StageLogging,
    ENDPOINT_URL_OUTPUT,
};
use crate::domain::stage::validate_stage_name;
use crate::errors::{GatelinkError, Result};
use crate::resolver::EndpointResolver;

/// Assembles the gateway topology for one stack
pub struct TopologyBuilder<R> {
    identity: StackIdentity,
    application_name: String,
    resolver: R,
    outputs: Vec<StackOutput>,
}

impl<R: EndpointResolver> TopologyBuilder<R> {
    pub fn new(identity: StackIdentity, application_name: impl Into<String>, resolver: R) -> Self {
        Self { identity, application_name: application_name.into(), resolver, outputs: Vec::new() }
    }

    pub fn identity(&self) -> &StackIdentity {
        &self.identity
    }

    /// Look up the existing load balancer. Fails with `NotFound`.
    pub fn resolve_endpoint(&self, handle: &str) -> Result<NetworkEndpoint> {
        let endpoint = self.resolver.resolve(handle)?;
        debug!(
            handle = %handle,
            arn = %endpoint.arn(),
            dns_name = %endpoint.dns_name(),
            "Network endpoint resolved"
        );
        Ok(endpoint)
    }

    /// Private link towards the resolved endpoint
    pub fn build_link(&self, endpoint: NetworkEndpoint) -> Result<PrivateLink> {
        PrivateLink::new(LinkId::default(), vec![endpoint])
    }

    /// Allow invoke for everyone, deny everyone outside `allowed_ips`.
    /// An empty list denies all traffic.
    pub fn build_policy(&self, allowed_ips: &[CidrBlock]) -> AccessPolicy {
        if allowed_ips.is_empty() {
            warn!(
                stack = %self.identity.name,
                "Source allow-list is empty; the gateway policy denies all traffic"
            );
        }
        AccessPolicy::invoke_restricted_to(allowed_ips.to_vec())
    }

    /// One proxy integration per distinct method, in order of first appearance
    pub fn build_integrations(
        &self,
        link: &PrivateLink,
        methods: &[HttpMethod],
    ) -> Vec<RouteIntegration> {
        let mut integrations: Vec<RouteIntegration> = Vec::with_capacity(methods.len());
        for method in methods {
            if integrations.iter().any(|i| i.method == *method) {
                continue;
            }
            integrations.push(RouteIntegration::proxy(*method, link));
        }
        integrations
    }

    /// Private gateway carrying the policy and integrations
    pub fn build_gateway(
        &self,
        policy: AccessPolicy,
        integrations: Vec<RouteIntegration>,
    ) -> Result<GatewayDefinition> {
        GatewayDefinition::private(GatewayId::default(), &self.application_name, policy, integrations)
    }

    /// Snapshot the gateway into a named stage with access logging.
    /// Fails with `Deployment` when the gateway has no integrations.
    pub fn deploy(
        &self,
        gateway: GatewayDefinition,
        stage_name: &str,
        log_retention_days: u32,
    ) -> Result<DeploymentStage> {
        if gateway.integrations().is_empty() {
            return Err(GatelinkError::deployment(format!(
                "Gateway '{}' has no methods on '{}'; a deployment needs at least one",
                gateway.name(),
                gateway.proxy_path()
            )));
        }
        validate_stage_name(stage_name)?;

        let sink = LogSink::for_application(&self.application_name, log_retention_days)?;
        info!(
            stack = %self.identity.name,
            stage = %stage_name,
            methods = gateway.integrations().len(),
            log_sink = %sink.name,
            "Deployment stage assembled"
        );
        Ok(DeploymentStage::new(stage_name.to_string(), gateway, StageLogging::info(sink)))
    }

    /// Invocation URL of the stage, published as the `ApiGatewayURL` output.
    ///
    /// The gateway id is only known once the provider creates it, so the URL
    /// carries a `${<gateway logical id>}` placeholder for it.
    pub fn emit_endpoint_url(&mut self, stage: &DeploymentStage) -> String {
        let url = format!(
            "https://${{{}}}.execute-api.{}.{}/{}/",
            stage.gateway().id(),
            self.identity.region,
            self.identity.url_suffix(),
            stage.name()
        );

        self.outputs.retain(|o| o.name != ENDPOINT_URL_OUTPUT);
        self.outputs.push(
            StackOutput::new(ENDPOINT_URL_OUTPUT, url.clone())
                .exported_as(ENDPOINT_URL_OUTPUT)
                .with_description(format!("Invocation URL of stage {}", stage.name())),
        );
        url
    }

    pub fn outputs(&self) -> &[StackOutput] {
        &self.outputs
    }

    pub fn into_outputs(self) -> Vec<StackOutput> {
        self.outputs
    }
}
