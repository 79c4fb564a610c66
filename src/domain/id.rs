//! Logical resource identifiers with the NewType pattern
//!
//! Every resource in a synthesized template is keyed by a logical id. Each
//! entity gets its own wrapper type so a link id can never be handed to
//! something that expects a gateway id.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{GatelinkError, Result};

lazy_static! {
    /// Template logical ids: alphanumeric, starting with a letter, at most 255 chars
    static ref LOGICAL_ID_REGEX: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9]{0,254}$")
        .expect("LOGICAL_ID_REGEX should be a valid regex pattern");
}

/// Check that a string is usable as a template logical id
pub fn is_valid_logical_id(s: &str) -> bool {
    LOGICAL_ID_REGEX.is_match(s)
}

/// Macro to generate NewType logical id wrappers with all required traits
macro_rules! logical_id {
    ($(#[$meta:meta])* $name:ident, $default:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse and validate a logical id
            pub fn new(s: impl Into<String>) -> Result<Self> {
                let s = s.into();
                if is_valid_logical_id(&s) {
                    Ok(Self(s))
                } else {
                    Err(GatelinkError::validation_field(
                        format!("'{}' is not a valid logical id", s),
                        stringify!($name),
                    ))
                }
            }

            /// Get the inner string value
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self($default.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = GatelinkError;

            fn from_str(s: &str) -> Result<Self> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = GatelinkError;

            fn try_from(s: String) -> Result<Self> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

logical_id!(
    /// Logical id of the private link
    LinkId,
    "VpcLink"
);

logical_id!(
    /// Logical id of the gateway (REST API)
    GatewayId,
    "RestApiGw"
);

logical_id!(
    /// Logical id of a deployment stage
    StageId,
    "Stage"
);

logical_id!(
    /// Logical id of the access log sink
    LogSinkId,
    "ApiGwLogGroup"
);
