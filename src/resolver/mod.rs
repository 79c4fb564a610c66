//! # Endpoint Resolution
//!
//! Looking up the existing load balancer is the only place a build touches
//! resources it does not own. The lookup is an injected capability so builds
//! can run against a fixed catalog or a fake in tests.

use std::collections::HashMap;

use tracing::debug;

use crate::config::EndpointCatalogEntry;
use crate::domain::NetworkEndpoint;
use crate::errors::{GatelinkError, Result};

/// Resource type reported in `NotFound` errors
pub const NETWORK_LOAD_BALANCER: &str = "network load balancer";

/// Resolves a load balancer handle to the resource it names
pub trait EndpointResolver: Send + Sync {
    /// Fails with `NotFound` when nothing answers to `handle`
    fn resolve(&self, handle: &str) -> Result<NetworkEndpoint>;
}

impl<T: EndpointResolver + ?Sized> EndpointResolver for &T {
    fn resolve(&self, handle: &str) -> Result<NetworkEndpoint> {
        (**self).resolve(handle)
    }
}

impl<T: EndpointResolver + ?Sized> EndpointResolver for Box<T> {
    fn resolve(&self, handle: &str) -> Result<NetworkEndpoint> {
        (**self).resolve(handle)
    }
}

/// Resolver backed by a fixed catalog. Handles match either the catalog
/// handle or the full ARN.
#[derive(Debug, Clone, Default)]
pub struct StaticEndpointResolver {
    by_handle: HashMap<String, NetworkEndpoint>,
}

impl StaticEndpointResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configuration catalog entries
    pub fn from_catalog(entries: &[EndpointCatalogEntry]) -> Result<Self> {
        let mut resolver = Self::new();
        for entry in entries {
            resolver = resolver.with_endpoint(NetworkEndpoint::new(
                entry.handle.clone(),
                entry.arn.clone(),
                entry.dns_name.clone(),
            )?);
        }
        Ok(resolver)
    }

    pub fn with_endpoint(mut self, endpoint: NetworkEndpoint) -> Self {
        self.by_handle.insert(endpoint.handle().to_string(), endpoint);
        self
    }

    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }
}

impl EndpointResolver for StaticEndpointResolver {
    fn resolve(&self, handle: &str) -> Result<NetworkEndpoint> {
        let found = self
            .by_handle
            .get(handle)
            .or_else(|| self.by_handle.values().find(|e| e.arn() == handle));

        match found {
            Some(endpoint) => {
                debug!(handle = %handle, arn = %endpoint.arn(), "Resolved network endpoint");
                Ok(endpoint.clone())
            }
            None => Err(GatelinkError::not_found(NETWORK_LOAD_BALANCER, handle)),
        }
    }
}
