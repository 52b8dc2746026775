//! Initial state for the simulated chain

use super::chain::SimulatedChain;
use super::governance::SimulatedGovernance;
use crate::amount::{self, Amount};
use crate::call::OracleReading;
use crate::governance::ProposalCategory;
use crate::role::Role;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use upgrade_registry::Address;

/// Contract present at genesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenesisContract {
    /// Fixed address
    pub address: Address,
    /// Artifact name
    pub artifact: String,
    /// Named storage
    #[serde(default)]
    pub storage: BTreeMap<String, Value>,
    /// Pause flag
    #[serde(default)]
    pub paused: bool,
    /// Oracle reading, for oracle contracts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oracle: Option<OracleReading>,
}

/// Token balance at genesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisBalance {
    /// Token contract
    pub token: Address,
    /// Holder
    pub holder: Address,
    /// Balance
    #[serde(with = "amount::serde_str")]
    pub amount: Amount,
}

/// Native balance at genesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisNative {
    /// Account
    pub account: Address,
    /// Balance
    #[serde(with = "amount::serde_str")]
    pub amount: Amount,
}

/// Seed for a [`SimulatedChain`] and its [`SimulatedGovernance`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Genesis {
    /// Installed contracts
    #[serde(default)]
    pub contracts: Vec<GenesisContract>,
    /// Role name to holders
    #[serde(default)]
    pub roles: BTreeMap<String, Vec<Address>>,
    /// Token balances
    #[serde(default)]
    pub balances: Vec<GenesisBalance>,
    /// Native balances
    #[serde(default)]
    pub native: Vec<GenesisNative>,
    /// Governance timelock per category
    #[serde(default)]
    pub timelocks: BTreeMap<ProposalCategory, Address>,
}

impl Genesis {
    /// Parse from JSON
    ///
    /// # Errors
    /// Returns the parser error on malformed input
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Parse from YAML
    ///
    /// # Errors
    /// Returns the parser error on malformed input
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Add a contract
    #[must_use]
    pub fn with_contract(mut self, address: Address, artifact: impl Into<String>) -> Self {
        self.contracts.push(GenesisContract {
            address,
            artifact: artifact.into(),
            storage: BTreeMap::new(),
            paused: false,
            oracle: None,
        });
        self
    }

    /// Grant a role
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>, holder: Address) -> Self {
        self.roles.entry(role.into()).or_default().push(holder);
        self
    }

    /// Register a governance timelock
    #[must_use]
    pub fn with_timelock(mut self, category: ProposalCategory, timelock: Address) -> Self {
        self.timelocks.insert(category, timelock);
        self
    }

    /// Build the chain and its governance executor
    #[must_use]
    pub fn build(&self) -> (Arc<SimulatedChain>, SimulatedGovernance) {
        let chain = Arc::new(SimulatedChain::new());

        for contract in &self.contracts {
            chain.install(contract.address, contract.artifact.clone());
            chain.set_paused(contract.address, contract.paused);
            for (key, value) in &contract.storage {
                chain.set_storage(contract.address, key.clone(), value.clone());
            }
            if let Some(reading) = contract.oracle {
                chain.set_oracle(contract.address, reading);
            }
        }
        for (role, holders) in &self.roles {
            for holder in holders {
                chain.grant_role(Role::new(role.clone()), *holder);
            }
        }
        for balance in &self.balances {
            chain.set_token_balance(balance.token, balance.holder, balance.amount);
        }
        for native in &self.native {
            chain.set_native_balance(native.account, native.amount);
        }

        let governance = self
            .timelocks
            .iter()
            .fold(SimulatedGovernance::new(Arc::clone(&chain)), |gov, (category, timelock)| {
                gov.with_timelock(*category, *timelock)
            });

        debug!(
            contracts = self.contracts.len(),
            roles = self.roles.len(),
            timelocks = self.timelocks.len(),
            "genesis built"
        );
        (chain, governance)
    }
}
