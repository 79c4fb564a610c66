//! Route integration domain types
//!
//! Every integration proxies one HTTP method on the catch-all path to the
//! load balancer behind the private link, forwarding the wildcard path
//! segment unchanged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::id::LinkId;
use super::link::PrivateLink;
use crate::errors::{GatelinkError, Result};

/// Catch-all path pattern the integrations are attached to
pub const PROXY_PATH_PART: &str = "{proxy+}";

/// Backend path the wildcard segment is substituted into
pub const BACKEND_PROXY_PATH: &str = "/{proxy}";

/// Method-side request parameter carrying the wildcard segment
pub const METHOD_PROXY_PARAMETER: &str = "method.request.path.proxy";

/// Integration-side request parameter receiving the wildcard segment
pub const INTEGRATION_PROXY_PARAMETER: &str = "integration.request.path.proxy";

/// HTTP methods a proxy route can be declared for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = GatelinkError;

    fn from_str(s: &str) -> Result<Self> {
        HttpMethod::ALL
            .iter()
            .copied()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                GatelinkError::validation_field(format!("Unsupported HTTP method '{}'", s), "methods")
            })
    }
}

/// Parse method names, rejecting unsupported ones
pub fn parse_methods<S: AsRef<str>>(values: &[S]) -> Result<Vec<HttpMethod>> {
    values.iter().map(|v| v.as_ref().parse()).collect()
}

/// How unmapped content types are passed to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassthroughBehavior {
    WhenNoMatch,
    WhenNoTemplates,
    Never,
}

impl PassthroughBehavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassthroughBehavior::WhenNoMatch => "WHEN_NO_MATCH",
            PassthroughBehavior::WhenNoTemplates => "WHEN_NO_TEMPLATES",
            PassthroughBehavior::Never => "NEVER",
        }
    }
}

/// Where an integration forwards requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendTarget {
    pub protocol: String,
    pub host: String,
    pub path: String,
}

impl BackendTarget {
    /// `http://<host>/{proxy}`
    pub fn proxy_to(host: impl Into<String>) -> Self {
        Self {
            protocol: "http".to_string(),
            host: host.into(),
            path: BACKEND_PROXY_PATH.to_string(),
        }
    }

    pub fn uri(&self) -> String {
        format!("{}://{}{}", self.protocol, self.host, self.path)
    }
}

/// One method on the catch-all path proxied through the private link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteIntegration {
    pub method: HttpMethod,
    pub path_part: String,
    pub backend: BackendTarget,
    pub link: LinkId,
    pub passthrough: PassthroughBehavior,
    /// integration parameter -> method parameter
    pub request_parameters: BTreeMap<String, String>,
}

impl RouteIntegration {
    /// Proxy `{method} /{proxy+}` to the link's primary target
    pub fn proxy(method: HttpMethod, link: &PrivateLink) -> Self {
        let mut request_parameters = BTreeMap::new();
        request_parameters
            .insert(INTEGRATION_PROXY_PARAMETER.to_string(), METHOD_PROXY_PARAMETER.to_string());

        Self {
            method,
            path_part: PROXY_PATH_PART.to_string(),
            backend: BackendTarget::proxy_to(link.primary_target().dns_name()),
            link: link.id().clone(),
            passthrough: PassthroughBehavior::WhenNoMatch,
            request_parameters,
        }
    }

    pub fn uri(&self) -> String {
        self.backend.uri()
    }

    /// Method-side parameters that must be present on the request
    pub fn required_method_parameters(&self) -> Vec<&str> {
        self.request_parameters.values().map(String::as_str).collect()
    }
}
