//! Environment configuration

use serde::{Deserialize, Serialize};
use upgrade_registry::Address;

/// State versions this loader understands
pub const SUPPORTED_STATE_VERSIONS: &[u32] = &[1];

/// How to bootstrap the environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EnvironmentConfig {
    /// Emit diagnostics; never changes behaviour
    pub logging: bool,
    /// Identity that signs deployments
    pub deployer: Address,
    /// Version of the persisted state layout
    pub state_version: u32,
    /// Names that must be present in the address book
    pub required_addresses: Vec<String>,
    /// Check that every contract-kind entry has code
    pub verify_code: bool,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            logging: false,
            deployer: Address::ZERO,
            state_version: 1,
            required_addresses: vec!["core".to_string()],
            verify_code: false,
        }
    }
}

impl EnvironmentConfig {
    /// Create config for a deployer
    #[inline]
    #[must_use]
    pub fn new(deployer: Address) -> Self {
        Self {
            deployer,
            ..Self::default()
        }
    }

    /// With logging flag
    #[inline]
    #[must_use]
    pub fn with_logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }

    /// With state version
    #[inline]
    #[must_use]
    pub fn with_state_version(mut self, version: u32) -> Self {
        self.state_version = version;
        self
    }

    /// With required names
    #[must_use]
    pub fn with_required_addresses<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_addresses = names.into_iter().map(Into::into).collect();
        self
    }

    /// With code verification
    #[inline]
    #[must_use]
    pub fn with_verify_code(mut self, verify: bool) -> Self {
        self.verify_code = verify;
        self
    }
}
