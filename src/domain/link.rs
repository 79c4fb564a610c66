//! Private link domain types

use serde::{Deserialize, Serialize};

use super::endpoint::NetworkEndpoint;
use super::id::LinkId;
use crate::errors::{GatelinkError, Result};

/// Default description attached to the link resource
pub const DEFAULT_LINK_DESCRIPTION: &str = "VpcLink towards NLB";

/// A tunnel binding the gateway's private network to one or more load balancers.
///
/// Created once per build and referenced by every route integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "PrivateLinkRepr")]
pub struct PrivateLink {
    id: LinkId,
    description: String,
    targets: Vec<NetworkEndpoint>,
}

impl PrivateLink {
    /// Create a link towards the given targets. At least one target is required.
    pub fn new(id: LinkId, targets: Vec<NetworkEndpoint>) -> Result<Self> {
        if targets.is_empty() {
            return Err(GatelinkError::validation_field(
                "A private link needs at least one target",
                "targets",
            ));
        }
        Ok(Self { id, description: DEFAULT_LINK_DESCRIPTION.to_string(), targets })
    }

    /// Set the link description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn id(&self) -> &LinkId {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn targets(&self) -> &[NetworkEndpoint] {
        &self.targets
    }

    /// The load balancer whose DNS name integrations forward to
    pub fn primary_target(&self) -> &NetworkEndpoint {
        // every construction path, parsing included, goes through `new`
        &self.targets[0]
    }

    pub fn target_arns(&self) -> Vec<&str> {
        self.targets.iter().map(NetworkEndpoint::arn).collect()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrivateLinkRepr {
    id: LinkId,
    description: String,
    targets: Vec<NetworkEndpoint>,
}

impl TryFrom<PrivateLinkRepr> for PrivateLink {
    type Error = GatelinkError;

    fn try_from(repr: PrivateLinkRepr) -> Result<Self> {
        Ok(PrivateLink::new(repr.id, repr.targets)?.with_description(repr.description))
    }
}
