//! Environment loading

use crate::book::AddressBook;
use crate::config::{EnvironmentConfig, SUPPORTED_STATE_VERSIONS};
use crate::error::EnvError;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use upgrade_chain::sim::Genesis;
use upgrade_chain::{ChainClient, GovernanceExecutor};
use upgrade_registry::{Registry, RegistrySnapshot};

/// Loaded environment: baseline registry plus the live-state collaborators
#[derive(Clone)]
pub struct Environment {
    config: EnvironmentConfig,
    baseline: RegistrySnapshot,
    chain: Arc<dyn ChainClient>,
    governance: Arc<dyn GovernanceExecutor>,
}

impl Environment {
    /// Configuration it was loaded with
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    /// Frozen baseline registry
    #[inline]
    #[must_use]
    pub fn baseline(&self) -> &RegistrySnapshot {
        &self.baseline
    }

    /// Fresh registry seeded from the baseline, one per run
    #[must_use]
    pub fn initial_registry(&self) -> Registry {
        Registry::from(self.baseline.clone())
    }

    /// Chain client
    #[inline]
    #[must_use]
    pub fn chain(&self) -> &Arc<dyn ChainClient> {
        &self.chain
    }

    /// Governance executor
    #[inline]
    #[must_use]
    pub fn governance(&self) -> &Arc<dyn GovernanceExecutor> {
        &self.governance
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("config", &self.config)
            .field("baseline", &self.baseline.len())
            .finish_non_exhaustive()
    }
}

/// Validates configuration and loads the environment once
///
/// The first successful [`load`](Self::load) is cached; later calls return
/// the same environment. A failed load is not cached.
pub struct EnvironmentLoader {
    config: EnvironmentConfig,
    book: AddressBook,
    chain: Arc<dyn ChainClient>,
    governance: Arc<dyn GovernanceExecutor>,
    loaded: OnceCell<Environment>,
}

impl EnvironmentLoader {
    /// Create loader over external collaborators
    #[must_use]
    pub fn new(
        config: EnvironmentConfig,
        book: AddressBook,
        chain: Arc<dyn ChainClient>,
        governance: Arc<dyn GovernanceExecutor>,
    ) -> Self {
        Self {
            config,
            book,
            chain,
            governance,
            loaded: OnceCell::new(),
        }
    }

    /// Create loader over a simulated chain seeded from `genesis`
    #[must_use]
    pub fn simulated(config: EnvironmentConfig, book: AddressBook, genesis: &Genesis) -> Self {
        let (chain, governance) = genesis.build();
        Self::new(config, book, chain, Arc::new(governance))
    }

    /// Whether a load has succeeded
    #[inline]
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }

    /// Validate and load
    ///
    /// # Errors
    /// - `EnvError::ZeroDeployer` if no deployer is configured
    /// - `EnvError::UnsupportedStateVersion` for unknown versions
    /// - `EnvError::MissingAddresses` if required names are absent
    /// - `EnvError::NoCode` if code verification is on and a contract is missing
    pub async fn load(&self) -> Result<&Environment, EnvError> {
        self.loaded.get_or_try_init(|| self.bootstrap()).await
    }

    async fn bootstrap(&self) -> Result<Environment, EnvError> {
        let config = &self.config;

        if config.deployer.is_zero() {
            return Err(EnvError::ZeroDeployer);
        }
        if !SUPPORTED_STATE_VERSIONS.contains(&config.state_version) {
            return Err(EnvError::UnsupportedStateVersion {
                version: config.state_version,
                supported: SUPPORTED_STATE_VERSIONS.to_vec(),
            });
        }

        let missing = self.book.missing(&config.required_addresses);
        if !missing.is_empty() {
            return Err(EnvError::MissingAddresses {
                names: missing.into_iter().map(str::to_string).collect(),
            });
        }

        if config.verify_code {
            for (name, entry) in self.book.iter() {
                if !entry.kind().is_contract() {
                    continue;
                }
                let address = entry.address();
                if !self.chain.has_code(address).await? {
                    return Err(EnvError::NoCode {
                        name: name.to_string(),
                        address,
                    });
                }
                debug!(resource = name, %address, "code verified");
            }
        }

        let baseline = self.book.to_registry().snapshot();
        if config.logging {
            info!(
                resources = baseline.len(),
                deployer = %config.deployer,
                state_version = config.state_version,
                "environment loaded"
            );
        }

        Ok(Environment {
            config: config.clone(),
            baseline,
            chain: Arc::clone(&self.chain),
            governance: Arc::clone(&self.governance),
        })
    }
}

impl fmt::Debug for EnvironmentLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentLoader")
            .field("config", &self.config)
            .field("book", &self.book.len())
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use upgrade_registry::{Address, ResourceKind};

    fn book() -> AddressBook {
        AddressBook::new()
            .with_entry("core", Address::from_low_u64(1), ResourceKind::Core)
            .with_entry("fei", Address::from_low_u64(2), ResourceKind::Token)
    }

    fn config() -> EnvironmentConfig {
        EnvironmentConfig::new(Address::from_low_u64(42))
    }

    #[tokio::test]
    async fn loads_baseline_from_book() {
        let loader = EnvironmentLoader::simulated(config(), book(), &Genesis::default());
        let env = loader.load().await.unwrap();
        assert_eq!(env.baseline().len(), 2);
        assert_eq!(
            env.initial_registry().get("fei").unwrap().address,
            Address::from_low_u64(2)
        );
    }

    #[tokio::test]
    async fn load_is_idempotent() {
        let loader = EnvironmentLoader::simulated(config(), book(), &Genesis::default());
        let first: *const Environment = loader.load().await.unwrap();
        let second: *const Environment = loader.load().await.unwrap();
        assert!(std::ptr::eq(first, second));
        assert!(loader.is_loaded());
    }

    #[tokio::test]
    async fn missing_required_address_fails_fast() {
        let loader = EnvironmentLoader::simulated(
            config().with_required_addresses(["core", "tribe", "fei", "rari"]),
            book(),
            &Genesis::default(),
        );
        let err = loader.load().await.unwrap_err();
        assert_eq!(
            err,
            EnvError::MissingAddresses {
                names: vec!["tribe".to_string(), "rari".to_string()]
            }
        );
        assert_eq!(err.to_string(), "contract address is not set: tribe, rari");
        assert!(!loader.is_loaded());
    }

    #[tokio::test]
    async fn rejects_zero_deployer_and_unknown_version() {
        let zero = EnvironmentLoader::simulated(
            EnvironmentConfig::default(),
            book(),
            &Genesis::default(),
        );
        assert_eq!(zero.load().await.unwrap_err(), EnvError::ZeroDeployer);

        let future = EnvironmentLoader::simulated(config().with_state_version(2), book(), &Genesis::default());
        assert!(matches!(
            future.load().await.unwrap_err(),
            EnvError::UnsupportedStateVersion { version: 2, .. }
        ));
    }

    #[tokio::test]
    async fn verify_code_checks_contract_entries() {
        let genesis = Genesis::default().with_contract(Address::from_low_u64(1), "Core");
        let book = book().with_entry("multisig", Address::from_low_u64(3), ResourceKind::Account);

        let loader = EnvironmentLoader::simulated(config().with_verify_code(true), book, &genesis);
        let err = loader.load().await.unwrap_err();
        assert_eq!(
            err,
            EnvError::NoCode {
                name: "fei".to_string(),
                address: Address::from_low_u64(2)
            }
        );
    }
}
