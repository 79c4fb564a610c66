//! # Gatelink
//!
//! Declarative generator for a private API gateway that fronts an existing
//! network load balancer through a private (VPC) link.
//!
//! ## Architecture
//!
//! ```text
//! Config → Resolver → TopologyBuilder → Template → DeploymentEngine
//!   ↓                       ↓                           ↓
//! Validation          Access policy              Stack outputs
//! ```
//!
//! ## Core Components
//!
//! - **Topology**: builds link, policy, integrations, gateway, stage and the
//!   endpoint URL output in one pass
//! - **Template**: renders the topology as provider resource declarations
//! - **Engine**: submits a template; the bundled engine deploys to a directory
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use gatelink::{build_topology, config::load_validated, config::ConfigOverrides};
//! use gatelink::resolver::StaticEndpointResolver;
//!
//! fn main() -> gatelink::Result<()> {
//!     let config = load_validated(None, ConfigOverrides::default())?;
//!     let resolver = StaticEndpointResolver::from_catalog(&config.stack.endpoints)?;
//!     let topology = build_topology(config.stack, resolver)?;
//!     println!("{}", topology.endpoint_url);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod observability;
pub mod resolver;
pub mod template;
pub mod topology;

// Re-export commonly used types and traits
pub use config::{AppConfig, StackConfig};
pub use engine::{DeploymentEngine, DeploymentReceipt, FileSystemEngine};
pub use errors::{Error, GatelinkError, Result};
pub use resolver::{EndpointResolver, StaticEndpointResolver};
pub use template::{synthesize, Template};
pub use topology::{build_topology, StackIdentity, Topology, TopologyBuilder};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
