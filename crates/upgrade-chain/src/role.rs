//! Access-control roles

use serde::{Deserialize, Serialize};
use std::fmt;

/// Access-control role identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Governor role
    pub const GOVERN: &'static str = "GOVERN_ROLE";
    /// Guardian role (may pause)
    pub const GUARDIAN: &'static str = "GUARDIAN_ROLE";
    /// Minter role
    pub const MINTER: &'static str = "MINTER_ROLE";
    /// Burner role
    pub const BURNER: &'static str = "BURNER_ROLE";
    /// PCV controller role
    pub const PCV_CONTROLLER: &'static str = "PCV_CONTROLLER_ROLE";

    /// Create role by name
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Governor role
    #[inline]
    #[must_use]
    pub fn governor() -> Self {
        Self::new(Self::GOVERN)
    }

    /// Guardian role
    #[inline]
    #[must_use]
    pub fn guardian() -> Self {
        Self::new(Self::GUARDIAN)
    }

    /// Minter role
    #[inline]
    #[must_use]
    pub fn minter() -> Self {
        Self::new(Self::MINTER)
    }

    /// Role name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
