//! Values produced by the deploy phase

use crate::error::PhaseError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use upgrade_registry::ResourceHandle;

/// Named values the deploy phase hands to later phases
///
/// Replaces state shared between hooks through captured variables: a pool
/// id created in `deploy` travels here to `validate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeployOutputs(BTreeMap<String, Value>);

impl DeployOutputs {
    /// Create empty outputs
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Raw value
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Typed value
    ///
    /// # Errors
    /// - `PhaseError::MissingOutput` if the key is absent
    /// - `PhaseError::MalformedOutput` if it does not decode as `T`
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, PhaseError> {
        let value = self.0.get(key).ok_or_else(|| PhaseError::MissingOutput {
            key: key.to_string(),
        })?;
        serde_json::from_value(value.clone()).map_err(|e| PhaseError::MalformedOutput {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Number of values
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Everything a deploy phase produces
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deployment {
    /// Resources the proposal introduces
    pub resources: Vec<ResourceHandle>,
    /// Values for later phases
    pub outputs: DeployOutputs,
}

impl Deployment {
    /// Create empty deployment
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource
    #[inline]
    #[must_use]
    pub fn with_resource(mut self, handle: ResourceHandle) -> Self {
        self.resources.push(handle);
        self
    }

    /// Add an output value
    #[must_use]
    pub fn with_output(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.outputs.insert(key, value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_output_access() {
        let deployment = Deployment::new()
            .with_output("poolId", "0xabc")
            .with_output("weight", 50u64);

        let outputs = &deployment.outputs;
        assert_eq!(outputs.get::<String>("poolId").unwrap(), "0xabc");
        assert_eq!(outputs.get::<u64>("weight").unwrap(), 50);
        assert!(matches!(
            outputs.get::<u64>("poolId"),
            Err(PhaseError::MalformedOutput { .. })
        ));
        assert_eq!(
            outputs.get::<u64>("missing"),
            Err(PhaseError::MissingOutput {
                key: "missing".to_string()
            })
        );
    }
}
