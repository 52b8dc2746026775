//! Errors raised by proposal hooks and catalogue construction

use upgrade_chain::ChainError;
use upgrade_registry::RegistryError;

/// Error returned by a lifecycle hook
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PhaseError {
    /// Registry lookup failed
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Chain call failed
    #[error("chain: {0}")]
    Chain(#[from] ChainError),

    /// A deploy output the hook relies on was not produced
    #[error("missing deploy output: {key}")]
    MissingOutput { key: String },

    /// A deploy output had the wrong shape
    #[error("deploy output {key} is malformed: {reason}")]
    MalformedOutput { key: String, reason: String },

    /// Free-form hook failure
    #[error("{0}")]
    Failed(String),
}

impl PhaseError {
    /// Create a free-form failure
    #[inline]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Registry error, if that is the cause
    #[must_use]
    pub fn as_registry(&self) -> Option<&RegistryError> {
        match self {
            Self::Registry(e) => Some(e),
            _ => None,
        }
    }
}

/// Catalogue construction errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogueError {
    /// Two entries share an id
    #[error("duplicate proposal id: {id}")]
    DuplicateId { id: String },

    /// Proposal must deploy but has neither hooks nor declared deployments
    #[error("proposal {id} deploys but has no lifecycle hooks or declared deployments")]
    MissingLifecycle { id: String },

    /// Persisted catalogue could not be parsed
    #[error("catalogue parse error: {0}")]
    Parse(String),
}
