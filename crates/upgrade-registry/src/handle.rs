//! Resource handles

use crate::address::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a tracked resource
///
/// Mirrors the address-book categories used when describing the target system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Core permission contract
    Core,
    /// Governance contracts (timelocks, governors)
    Governance,
    /// Peg stability modules and related
    Peg,
    /// Protocol-controlled value deposits
    Pcv,
    /// Collateralization oracle and wrappers
    Collateralization,
    /// Price oracles
    Oracle,
    /// Keeper-driven contracts
    Keeper,
    /// Reward distributors
    Rewards,
    /// Tokens
    Token,
    /// Third-party contracts the system depends on
    #[default]
    External,
    /// Externally owned accounts (no code)
    Account,
}

impl ResourceKind {
    /// Whether resources of this kind are expected to carry code
    #[inline]
    #[must_use]
    pub fn is_contract(&self) -> bool {
        !matches!(self, Self::Account)
    }
}

/// A named, addressable resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceHandle {
    /// Symbolic name, unique within a registry
    pub name: String,
    /// On-chain address
    pub address: Address,
    /// Resource classification
    #[serde(default)]
    pub kind: ResourceKind,
    /// Contract artifact the resource was built from, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
}

impl ResourceHandle {
    /// Create new handle
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, address: Address, kind: ResourceKind) -> Self {
        Self {
            name: name.into(),
            address,
            kind,
            artifact: None,
        }
    }

    /// With artifact name
    #[inline]
    #[must_use]
    pub fn with_artifact(mut self, artifact: impl Into<String>) -> Self {
        self.artifact = Some(artifact.into());
        self
    }

    /// Same handle under another name
    #[inline]
    #[must_use]
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.address)
    }
}
