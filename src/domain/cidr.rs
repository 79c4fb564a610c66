//! CIDR blocks used by source-IP conditions

use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::errors::{GatelinkError, Result};

/// An IPv4 or IPv6 network in CIDR notation.
///
/// A bare address is accepted and treated as a host route (`/32` or `/128`).
/// Host bits beyond the prefix are kept as written so the block renders back
/// exactly as configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CidrBlock(IpNet);

impl CidrBlock {
    pub fn new(address: IpAddr, prefix_len: u8) -> Result<Self> {
        IpNet::new(address, prefix_len).map(Self).map_err(|_| {
            GatelinkError::validation_field(
                format!("Prefix length /{} is too long for {}", prefix_len, address),
                "allowed_source_ips",
            )
        })
    }

    /// Host route covering exactly `address`
    pub fn host(address: IpAddr) -> Self {
        Self(IpNet::from(address))
    }

    pub fn address(&self) -> IpAddr {
        self.0.addr()
    }

    pub fn prefix_len(&self) -> u8 {
        self.0.prefix_len()
    }

    /// Whether `ip` falls inside this network. Families never match each other.
    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.0.contains(ip)
    }
}

impl From<IpNet> for CidrBlock {
    fn from(net: IpNet) -> Self {
        Self(net)
    }
}

impl FromStr for CidrBlock {
    type Err = GatelinkError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid =
            || GatelinkError::validation_field(format!("Invalid CIDR block '{}'", s), "allowed_source_ips");

        if s.contains('/') {
            s.parse::<IpNet>().map(Self).map_err(|_| invalid())
        } else {
            s.parse::<IpAddr>().map(Self::host).map_err(|_| invalid())
        }
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<String> for CidrBlock {
    type Error = GatelinkError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<CidrBlock> for String {
    fn from(block: CidrBlock) -> Self {
        block.to_string()
    }
}

/// Parse an ordered list of CIDR strings, keeping the configured order
pub fn parse_cidr_list<S: AsRef<str>>(values: &[S]) -> Result<Vec<CidrBlock>> {
    values.iter().map(|v| v.as_ref().parse()).collect()
}
