//! Errors surfaced by the chain boundary

use upgrade_registry::Address;

/// Chain interaction errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// Call or transaction reverted
    #[error("reverted: {reason}")]
    Reverted { reason: String },

    /// Target address has no code
    #[error("no code at {0}")]
    NoCode(Address),

    /// Call arguments could not be decoded
    #[error("invalid argument for {method}: {reason}")]
    InvalidArgument { method: String, reason: String },

    /// Transport or node failure
    #[error("rpc failure: {0}")]
    Rpc(String),
}

impl ChainError {
    /// Create a revert error
    #[inline]
    pub fn reverted(reason: impl Into<String>) -> Self {
        Self::Reverted {
            reason: reason.into(),
        }
    }

    /// Create an argument error
    #[inline]
    pub fn invalid_argument(method: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            method: method.into(),
            reason: reason.into(),
        }
    }

    /// Check if the error is a revert
    #[inline]
    #[must_use]
    pub fn is_revert(&self) -> bool {
        matches!(self, Self::Reverted { .. })
    }
}
