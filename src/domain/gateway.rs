//! Gateway domain types
//!
//! The gateway definition is the aggregate root of a topology: it owns the
//! access policy and every route integration on the catch-all path.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::id::GatewayId;
use super::integration::{HttpMethod, RouteIntegration, PROXY_PATH_PART};
use super::policy::AccessPolicy;
use crate::errors::{GatelinkError, Result};

/// Who can reach the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    /// Reachable only from inside the private network
    Private,

    /// Reachable from the public internet
    Public,
}

/// The gateway and everything attached to it.
///
/// Deserialized definitions go through the same checks as [`GatewayDefinition::private`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "GatewayDefinitionRepr")]
pub struct GatewayDefinition {
    id: GatewayId,
    name: String,
    description: String,
    visibility: Visibility,
    policy: AccessPolicy,
    proxy_path: String,
    integrations: Vec<RouteIntegration>,
    cloud_watch_role: bool,
}

impl GatewayDefinition {
    /// Create a private gateway. Integrations must be for distinct methods on
    /// the catch-all path. An empty integration list is accepted here and
    /// rejected when the gateway is deployed.
    pub fn private(
        id: GatewayId,
        name: impl Into<String>,
        policy: AccessPolicy,
        integrations: Vec<RouteIntegration>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(GatelinkError::validation_field("Gateway name cannot be empty", "name"));
        }

        check_integrations(&integrations)?;

        Ok(Self {
            id,
            description: format!("Api Gateway for {}", name),
            name,
            visibility: Visibility::Private,
            policy,
            proxy_path: PROXY_PATH_PART.to_string(),
            integrations,
            cloud_watch_role: true,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Provision the account-level role the provider writes execution logs with
    pub fn with_cloud_watch_role(mut self, enabled: bool) -> Self {
        self.cloud_watch_role = enabled;
        self
    }

    pub fn id(&self) -> &GatewayId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn proxy_path(&self) -> &str {
        &self.proxy_path
    }

    pub fn integrations(&self) -> &[RouteIntegration] {
        &self.integrations
    }

    pub fn cloud_watch_role(&self) -> bool {
        self.cloud_watch_role
    }

    pub fn methods(&self) -> Vec<HttpMethod> {
        self.integrations.iter().map(|i| i.method).collect()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(GatelinkError::from)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(GatelinkError::from)
    }
}

fn check_integrations(integrations: &[RouteIntegration]) -> Result<()> {
    let mut seen = HashSet::new();
    for integration in integrations {
        if integration.path_part != PROXY_PATH_PART {
            return Err(GatelinkError::validation(format!(
                "Integration for {} is attached to '{}' instead of '{}'",
                integration.method, integration.path_part, PROXY_PATH_PART
            )));
        }
        if !seen.insert(integration.method) {
            return Err(GatelinkError::validation_field(
                format!("Duplicate integration for method {}", integration.method),
                "methods",
            ));
        }
    }
    Ok(())
}

/// Wire shape of [`GatewayDefinition`] before validation
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GatewayDefinitionRepr {
    id: GatewayId,
    name: String,
    description: String,
    visibility: Visibility,
    policy: AccessPolicy,
    proxy_path: String,
    integrations: Vec<RouteIntegration>,
    cloud_watch_role: bool,
}

impl TryFrom<GatewayDefinitionRepr> for GatewayDefinition {
    type Error = GatelinkError;

    fn try_from(repr: GatewayDefinitionRepr) -> Result<Self> {
        if repr.visibility != Visibility::Private {
            return Err(GatelinkError::validation_field(
                "Gateway visibility must be private",
                "visibility",
            ));
        }
        if repr.proxy_path != PROXY_PATH_PART {
            return Err(GatelinkError::validation_field(
                format!("Gateway proxy path must be '{}', got '{}'", PROXY_PATH_PART, repr.proxy_path),
                "proxyPath",
            ));
        }

        Ok(GatewayDefinition::private(repr.id, repr.name, repr.policy, repr.integrations)?
            .with_description(repr.description)
            .with_cloud_watch_role(repr.cloud_watch_role))
    }
}
