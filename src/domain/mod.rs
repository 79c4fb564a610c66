//! Domain layer
//!
//! Pure entities of the gateway topology with zero infrastructure
//! dependencies. Each entity validates its own invariants in its constructor
//! and is never mutated once the build pass hands it on.
//!
//! ## Module Organization
//!
//! - `id`: type-safe logical ids with the NewType pattern
//! - `cidr`: CIDR blocks for source-address conditions
//! - `endpoint`: the existing load balancer the link targets
//! - `link`: the private link
//! - `policy`: access policy statements and the offline evaluator
//! - `integration`: proxy route integrations
//! - `gateway`: the gateway aggregate root
//! - `stage`: deployment stage and its logging
//! - `output`: named stack outputs

pub mod cidr;
pub mod endpoint;
pub mod gateway;
pub mod id;
pub mod integration;
pub mod link;
pub mod output;
pub mod policy;
pub mod stage;

pub use cidr::{parse_cidr_list, CidrBlock};
pub use endpoint::NetworkEndpoint;
pub use gateway::{GatewayDefinition, Visibility};
pub use id::{GatewayId, LinkId, LogSinkId, StageId};
pub use integration::{
    parse_methods, BackendTarget, HttpMethod, PassthroughBehavior, RouteIntegration,
    PROXY_PATH_PART,
};
pub use link::PrivateLink;
pub use output::{StackOutput, ENDPOINT_URL_OUTPUT};
pub use policy::{
    AccessPolicy, AccessRequest, ConditionOperator, Decision, Effect, PolicyCondition,
    PolicyStatement, Principal,
};
pub use stage::{DeploymentStage, LogSink, MethodLoggingLevel, StageLogging};
