//! Holder address type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque holder identity — a depositor, the beneficiary, or a role
/// address (management, keeper).
///
/// The engine never interprets the contents; the host environment decides
/// what an address looks like (hex account, bech32, test label).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HolderAddress(String);

impl HolderAddress {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An address is well-formed if it is non-empty.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
    }
}

impl fmt::Display for HolderAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HolderAddress {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
