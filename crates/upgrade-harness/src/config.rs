//! Harness configuration file

use crate::files::{self, FileError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use upgrade_core::OrchestratorConfig;
use upgrade_env::EnvironmentConfig;
use upgrade_proposal::CatalogueMode;
use upgrade_registry::Address;

/// Everything a run needs, read from TOML
///
/// Relative paths are resolved against the directory of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Emit informational diagnostics
    pub logging: bool,
    /// Identity that signs deployments
    pub deployer: Address,
    /// Version of the persisted state layout
    pub state_version: u32,
    /// Names the address book must contain
    pub required_addresses: Vec<String>,
    /// Check contract entries for code before running
    pub verify_code: bool,
    /// Address book, JSON or YAML
    pub address_book: PathBuf,
    /// Proposal catalogue, JSON or YAML
    pub catalogue: PathBuf,
    /// Initial simulated state; empty when absent
    pub genesis: Option<PathBuf>,
    /// How deploy flags are interpreted
    pub mode: CatalogueMode,
    /// Treat dependency issues as configuration errors
    pub strict_dependencies: bool,
    /// Execute payloads through governance
    pub execute_governance: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let env = EnvironmentConfig::default();
        let orchestrator = OrchestratorConfig::default();
        Self {
            logging: env.logging,
            deployer: env.deployer,
            state_version: env.state_version,
            required_addresses: env.required_addresses,
            verify_code: env.verify_code,
            address_book: PathBuf::from("addresses.json"),
            catalogue: PathBuf::from("catalogue.json"),
            genesis: None,
            mode: CatalogueMode::default(),
            strict_dependencies: orchestrator.strict_dependencies,
            execute_governance: orchestrator.execute_governance,
        }
    }
}

impl HarnessConfig {
    /// Parse TOML
    ///
    /// # Errors
    /// Returns `FileError::Parse` on malformed input or unknown keys
    pub fn from_toml_str(text: &str) -> Result<Self, FileError> {
        toml::from_str(text).map_err(|e| FileError::Parse {
            path: PathBuf::from("<inline>"),
            reason: e.to_string(),
        })
    }

    /// Read a config file and resolve its relative paths
    ///
    /// # Errors
    /// Returns `FileError` if the file cannot be read or parsed
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, FileError> {
        let path = path.as_ref();
        let text = files::read_text(path).await?;
        let mut config: Self = toml::from_str(&text).map_err(|e| FileError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        Ok(config)
    }

    fn rebase(&mut self, base: &Path) {
        let join = |p: &Path| {
            if p.is_relative() {
                base.join(p)
            } else {
                p.to_path_buf()
            }
        };
        self.address_book = join(&self.address_book);
        self.catalogue = join(&self.catalogue);
        self.genesis = self.genesis.as_deref().map(join);
    }

    /// Environment part
    #[must_use]
    pub fn environment_config(&self) -> EnvironmentConfig {
        EnvironmentConfig::new(self.deployer)
            .with_logging(self.logging)
            .with_state_version(self.state_version)
            .with_required_addresses(self.required_addresses.iter().cloned())
            .with_verify_code(self.verify_code)
    }

    /// Orchestrator part
    #[must_use]
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig::new(self.deployer)
            .with_logging(self.logging)
            .with_strict_dependencies(self.strict_dependencies)
            .with_execute_governance(self.execute_governance)
    }
}
