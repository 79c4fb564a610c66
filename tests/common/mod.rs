//! Common test utilities for all integration tests.
//!
//! Provides the reference stack configuration and a resolver that knows the
//! reference load balancer.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

use gatelink::config::{EndpointCatalogEntry, StackConfig};
use gatelink::domain::NetworkEndpoint;
use gatelink::resolver::StaticEndpointResolver;

pub const NLB_HANDLE: &str = "nlb-1";
pub const NLB_ARN: &str =
    "arn:aws:elasticloadbalancing:us-east-1:123456789012:loadbalancer/net/nlb-1/50dc6c495c0c9188";
pub const NLB_DNS: &str = "nlb-1-50dc6c495c0c9188.elb.us-east-1.amazonaws.com";

pub fn nlb_entry() -> EndpointCatalogEntry {
    EndpointCatalogEntry {
        handle: NLB_HANDLE.to_string(),
        arn: NLB_ARN.to_string(),
        dns_name: NLB_DNS.to_string(),
    }
}

/// DocumentConverter in us-east-1, GET/POST from 10.0.0.0/8 on stage DEV
pub fn stack_config() -> StackConfig {
    StackConfig {
        region: "us-east-1".to_string(),
        account: "123456789012".to_string(),
        application_name: "DocumentConverter".to_string(),
        target_endpoint_handle: NLB_HANDLE.to_string(),
        allowed_source_ips: vec!["10.0.0.0/8".to_string()],
        methods: vec!["GET".to_string(), "POST".to_string()],
        stage_name: "DEV".to_string(),
        log_retention_days: 7,
        endpoints: vec![nlb_entry()],
        ..StackConfig::default()
    }
}

pub fn resolver() -> StaticEndpointResolver {
    StaticEndpointResolver::new().with_endpoint(
        NetworkEndpoint::new(NLB_HANDLE, NLB_ARN, NLB_DNS).expect("valid reference endpoint"),
    )
}
