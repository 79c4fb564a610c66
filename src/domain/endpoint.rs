//! Network endpoint domain types
//!
//! A network endpoint is an existing load balancer owned by the provider. It
//! is looked up once at build time and never created or modified here.

use serde::{Deserialize, Serialize};

use crate::errors::{GatelinkError, Result};

/// An existing network load balancer resolved at build time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkEndpoint {
    /// Handle the endpoint was looked up by
    handle: String,

    /// Provider resource name (ARN)
    arn: String,

    /// DNS name integrations forward to
    dns_name: String,
}

impl NetworkEndpoint {
    pub fn new(
        handle: impl Into<String>,
        arn: impl Into<String>,
        dns_name: impl Into<String>,
    ) -> Result<Self> {
        let endpoint = Self { handle: handle.into(), arn: arn.into(), dns_name: dns_name.into() };
        endpoint.validate()?;
        Ok(endpoint)
    }

    fn validate(&self) -> Result<()> {
        if self.handle.trim().is_empty() {
            return Err(GatelinkError::validation_field(
                "Endpoint handle cannot be empty",
                "target_endpoint_handle",
            ));
        }

        if !self.arn.starts_with("arn:") {
            return Err(GatelinkError::validation_field(
                format!("Endpoint '{}' has an invalid ARN '{}'", self.handle, self.arn),
                "arn",
            ));
        }

        if self.dns_name.is_empty() || self.dns_name.contains('/') || self.dns_name.contains(' ') {
            return Err(GatelinkError::validation_field(
                format!("Endpoint '{}' has an invalid DNS name '{}'", self.handle, self.dns_name),
                "dns_name",
            ));
        }

        Ok(())
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    pub fn arn(&self) -> &str {
        &self.arn
    }

    pub fn dns_name(&self) -> &str {
        &self.dns_name
    }
}
