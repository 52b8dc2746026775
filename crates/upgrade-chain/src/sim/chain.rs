//! Simulated chain client

use super::state::SimState;
use crate::amount::Amount;
use crate::call::{ContractCall, Event, OracleReading, Receipt};
use crate::error::ChainError;
use crate::role::Role;
use crate::state::{ChainClient, ChainState};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;
use upgrade_registry::Address;

/// In-memory chain
#[derive(Debug, Default)]
pub struct SimulatedChain {
    state: RwLock<SimState>,
}

impl SimulatedChain {
    /// Create empty chain
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install code at a fixed address
    pub fn install(&self, address: Address, artifact: impl Into<String>) -> Address {
        self.state.write().account_mut(address).artifact = Some(artifact.into());
        address
    }

    /// Artifact installed at address
    #[must_use]
    pub fn artifact_of(&self, address: Address) -> Option<String> {
        self.state
            .read()
            .accounts
            .get(&address)
            .and_then(|account| account.artifact.clone())
    }

    /// Grant a role directly
    pub fn grant_role(&self, role: Role, account: Address) {
        self.state
            .write()
            .roles
            .entry(role)
            .or_default()
            .insert(account);
    }

    /// Set native balance
    pub fn set_native_balance(&self, account: Address, amount: Amount) {
        self.state.write().account_mut(account).native = amount;
    }

    /// Set token balance
    pub fn set_token_balance(&self, token: Address, holder: Address, amount: Amount) {
        self.state.write().tokens.insert((token, holder), amount);
    }

    /// Set oracle reading
    pub fn set_oracle(&self, oracle: Address, reading: OracleReading) {
        self.state.write().account_mut(oracle).oracle = Some(reading);
    }

    /// Set pause flag
    pub fn set_paused(&self, address: Address, paused: bool) {
        self.state.write().account_mut(address).paused = paused;
    }

    /// Set a named storage slot
    pub fn set_storage(&self, address: Address, key: impl Into<String>, value: Value) {
        self.state
            .write()
            .account_mut(address)
            .storage
            .insert(key.into(), value);
    }

    /// Run `f` against a draft of the state and commit only on success
    pub(crate) fn transact<R>(
        &self,
        f: impl FnOnce(&mut SimState) -> Result<R, ChainError>,
    ) -> Result<R, ChainError> {
        let mut guard = self.state.write();
        let mut draft = guard.clone();
        let out = f(&mut draft)?;
        *guard = draft;
        Ok(out)
    }
}

#[async_trait]
impl ChainState for SimulatedChain {
    async fn has_code(&self, address: Address) -> Result<bool, ChainError> {
        Ok(self.state.read().contract(address).is_ok())
    }

    async fn native_balance(&self, account: Address) -> Result<Amount, ChainError> {
        Ok(self
            .state
            .read()
            .accounts
            .get(&account)
            .map_or(0, |a| a.native))
    }

    async fn balance_of(&self, token: Address, holder: Address) -> Result<Amount, ChainError> {
        let state = self.state.read();
        state.contract(token)?;
        Ok(state.tokens.get(&(token, holder)).copied().unwrap_or(0))
    }

    async fn has_role(&self, role: &Role, account: Address) -> Result<bool, ChainError> {
        Ok(self.state.read().has_role(role.as_str(), account))
    }

    async fn role_holders(&self, role: &Role) -> Result<Vec<Address>, ChainError> {
        Ok(self
            .state
            .read()
            .roles
            .get(role)
            .map(|holders| holders.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn is_paused(&self, address: Address) -> Result<bool, ChainError> {
        Ok(self.state.read().contract(address)?.paused)
    }

    async fn read_oracle(&self, oracle: Address) -> Result<OracleReading, ChainError> {
        self.state
            .read()
            .contract(oracle)?
            .oracle
            .ok_or_else(|| ChainError::reverted(format!("{oracle} is not an oracle")))
    }

    async fn storage(&self, address: Address, key: &str) -> Result<Option<Value>, ChainError> {
        Ok(self.state.read().contract(address)?.storage.get(key).cloned())
    }
}

#[async_trait]
impl ChainClient for SimulatedChain {
    fn as_state(&self) -> &dyn ChainState {
        self
    }

    async fn deploy(
        &self,
        deployer: Address,
        artifact: &str,
        args: &[Value],
    ) -> Result<Address, ChainError> {
        let address = self.state.write().deploy(deployer, artifact, args);
        debug!(%deployer, %address, artifact, "deployed");
        Ok(address)
    }

    async fn call(&self, sender: Address, call: &ContractCall) -> Result<Receipt, ChainError> {
        let events: Vec<Event> = self.transact(|state| state.apply_call(sender, call))?;
        debug!(%sender, target = %call.target, method = %call.method, "call applied");
        Ok(Receipt { events })
    }

    async fn fund(&self, account: Address, amount: Amount) -> Result<(), ChainError> {
        self.state.write().credit(account, amount);
        Ok(())
    }
}
