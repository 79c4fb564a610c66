//! Access policy domain types
//!
//! The policy is attached to the gateway and enforced by the provider. The
//! evaluator in this module mirrors the provider's documented decision order
//! (any matching deny wins, then any matching allow, otherwise implicit deny)
//! so properties of a generated policy can be checked offline.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use super::cidr::CidrBlock;

/// Action that invokes a gateway method
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

/// Resource pattern covering every method of every stage
pub const ALL_METHODS_RESOURCE: &str = "execute-api:/*";

/// Condition key carrying the caller's address inside the private network
pub const SOURCE_IP_CONDITION_KEY: &str = "aws:VpcSourceIp";

/// Statement effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// Who a statement applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Principal {
    /// Any caller, authenticated or not
    Any,

    /// Callers from a specific account
    Account(String),
}

impl Principal {
    fn matches(&self, caller_account: Option<&str>) -> bool {
        match self {
            Principal::Any => true,
            Principal::Account(account) => caller_account == Some(account.as_str()),
        }
    }
}

/// Condition operators understood by the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionOperator {
    IpAddress,
    NotIpAddress,
}

impl ConditionOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionOperator::IpAddress => "IpAddress",
            ConditionOperator::NotIpAddress => "NotIpAddress",
        }
    }
}

/// A source-address condition on a statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyCondition {
    pub operator: ConditionOperator,
    pub key: String,
    pub values: Vec<CidrBlock>,
}

impl PolicyCondition {
    /// Condition that holds when the caller's address is outside every block.
    /// With no blocks it holds for every caller.
    pub fn source_ip_not_in(values: Vec<CidrBlock>) -> Self {
        Self {
            operator: ConditionOperator::NotIpAddress,
            key: SOURCE_IP_CONDITION_KEY.to_string(),
            values,
        }
    }

    pub fn source_ip_in(values: Vec<CidrBlock>) -> Self {
        Self {
            operator: ConditionOperator::IpAddress,
            key: SOURCE_IP_CONDITION_KEY.to_string(),
            values,
        }
    }

    fn holds(&self, request: &AccessRequest) -> bool {
        if self.key != SOURCE_IP_CONDITION_KEY {
            // Unknown keys are absent from the request context and never match
            return false;
        }

        let inside = self.values.iter().any(|block| block.contains(&request.source_ip));
        match self.operator {
            ConditionOperator::IpAddress => inside,
            ConditionOperator::NotIpAddress => !inside,
        }
    }
}

/// One allow or deny rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyStatement {
    pub effect: Effect,
    pub principals: Vec<Principal>,
    pub actions: Vec<String>,
    pub resources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<PolicyCondition>,
}

impl PolicyStatement {
    /// Statement letting anyone invoke any method
    pub fn allow_invoke_all() -> Self {
        Self {
            effect: Effect::Allow,
            principals: vec![Principal::Any],
            actions: vec![INVOKE_ACTION.to_string()],
            resources: vec![ALL_METHODS_RESOURCE.to_string()],
            conditions: vec![],
        }
    }

    /// Statement denying invocation to callers outside `allowed`
    pub fn deny_invoke_unless_from(allowed: Vec<CidrBlock>) -> Self {
        Self {
            effect: Effect::Deny,
            principals: vec![Principal::Any],
            actions: vec![INVOKE_ACTION.to_string()],
            resources: vec![ALL_METHODS_RESOURCE.to_string()],
            conditions: vec![PolicyCondition::source_ip_not_in(allowed)],
        }
    }

    /// Whether this statement applies to the request. Evaluated on its own,
    /// without looking at any other statement.
    pub fn applies_to(&self, request: &AccessRequest) -> bool {
        self.principals.iter().any(|p| p.matches(request.caller_account.as_deref()))
            && self.actions.iter().any(|a| wildcard_match(a, &request.action))
            && self.resources.iter().any(|r| wildcard_match(r, &request.resource))
            && self.conditions.iter().all(|c| c.holds(request))
    }
}

/// Ordered list of statements attached to the gateway
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPolicy {
    pub statements: Vec<PolicyStatement>,
}

impl AccessPolicy {
    pub fn new(statements: Vec<PolicyStatement>) -> Self {
        Self { statements }
    }

    /// Allow invoke for everyone, then deny everyone outside `allowed`.
    ///
    /// An empty `allowed` list makes the deny unconditional in effect: no
    /// caller is inside an empty set, so every request is denied.
    pub fn invoke_restricted_to(allowed: Vec<CidrBlock>) -> Self {
        Self::new(vec![
            PolicyStatement::allow_invoke_all(),
            PolicyStatement::deny_invoke_unless_from(allowed),
        ])
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Decide a request the way the provider does
    pub fn evaluate(&self, request: &AccessRequest) -> Decision {
        let applicable = |effect: Effect| {
            self.statements.iter().filter(move |s| s.effect == effect).any(|s| s.applies_to(request))
        };

        if applicable(Effect::Deny) {
            Decision::ExplicitDeny
        } else if applicable(Effect::Allow) {
            Decision::Allow
        } else {
            Decision::ImplicitDeny
        }
    }
}

/// Evaluation outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    ExplicitDeny,
    ImplicitDeny,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Request context handed to the evaluator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequest {
    pub caller_account: Option<String>,
    pub action: String,
    pub resource: String,
    pub source_ip: IpAddr,
}

impl AccessRequest {
    /// An anonymous invoke of `method path` on `stage`
    pub fn invoke(source_ip: IpAddr, stage: &str, method: &str, path: &str) -> Self {
        Self {
            caller_account: None,
            action: INVOKE_ACTION.to_string(),
            resource: format!("execute-api:/{}/{}/{}", stage, method, path.trim_start_matches('/')),
            source_ip,
        }
    }

    pub fn with_caller_account(mut self, account: impl Into<String>) -> Self {
        self.caller_account = Some(account.into());
        self
    }
}

/// Glob match where `*` spans any run of characters and `?` exactly one
pub(crate) fn wildcard_match(pattern: &str, value: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let v: Vec<char> = value.chars().collect();

    let (mut pi, mut vi) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut mark = 0usize;

    while vi < v.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == v[vi]) {
            pi += 1;
            vi += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            mark = vi;
            pi += 1;
        } else if let Some(s) = star {
            pi = s + 1;
            mark += 1;
            vi = mark;
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}
