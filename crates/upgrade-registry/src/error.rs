//! Registry errors

/// Errors raised by registry lookups and bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No entry under this name
    #[error("unknown resource: {name}")]
    UnknownResource { name: String },

    /// Entry exists but was deprecated by an earlier proposal
    #[error("resource {name} is deprecated")]
    Deprecated { name: String },
}

impl RegistryError {
    /// Name the failed lookup was for
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::UnknownResource { name } | Self::Deprecated { name } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = RegistryError::UnknownResource {
            name: "fei".to_string(),
        };
        assert_eq!(err.to_string(), "unknown resource: fei");
        assert_eq!(err.name(), "fei");
    }
}
