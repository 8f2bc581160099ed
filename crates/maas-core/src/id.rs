//! Strongly-typed identifiers for MAAS resources.
//!
//! MAAS hands out short opaque strings for nodes and integer keys for most
//! other objects. Wrapping them keeps a machine's system ID from being passed
//! where a DNS resource id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

const fn is_id_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_'
}

/// Macro to generate opaque string identifier types.
macro_rules! string_id_type {
    ($(#[$meta:meta])* $name:ident, $doc:expr) => {
        $(#[$meta])*
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parses an identifier.
            ///
            /// Only ASCII letters, digits, `-` and `_` are accepted, so the
            /// value is always safe to use as a single URL path segment.
            ///
            /// # Errors
            ///
            /// Returns [`Error::ValidationError`] if the identifier is malformed.
            pub fn parse_str(input: &str) -> Result<Self> {
                if input.is_empty() || !input.bytes().all(is_id_byte) {
                    return Err(Error::ValidationError(format!(
                        "invalid {}: `{input}`",
                        stringify!($name)
                    )));
                }
                Ok(Self(input.to_string()))
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Converts into the inner string.
            #[must_use]
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = Error;

            fn try_from(value: String) -> Result<Self> {
                Self::parse_str(&value)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::parse_str(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

string_id_type!(SystemId, "Machine system ID, assigned by MAAS and immutable");

/// DNS resource primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DnsResourceId(u64);

impl DnsResourceId {
    /// Wraps a raw id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for DnsResourceId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for DnsResourceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| Error::ValidationError(format!("invalid DnsResourceId: `{s}`")))
    }
}

impl fmt::Display for DnsResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
