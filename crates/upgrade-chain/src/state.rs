//! Live-state access traits

use crate::amount::Amount;
use crate::call::{ContractCall, OracleReading, Receipt};
use crate::error::ChainError;
use crate::role::Role;
use async_trait::async_trait;
use serde_json::Value;
use upgrade_registry::Address;

/// Read-only view of live ledger state
///
/// Validation hooks and invariants only ever see this trait.
#[async_trait]
pub trait ChainState: Send + Sync {
    /// Whether code is installed at the address
    async fn has_code(&self, address: Address) -> Result<bool, ChainError>;

    /// Native-currency balance
    async fn native_balance(&self, account: Address) -> Result<Amount, ChainError>;

    /// Token balance of holder
    async fn balance_of(&self, token: Address, holder: Address) -> Result<Amount, ChainError>;

    /// Whether account holds role
    async fn has_role(&self, role: &Role, account: Address) -> Result<bool, ChainError>;

    /// All current holders of role, sorted
    async fn role_holders(&self, role: &Role) -> Result<Vec<Address>, ChainError>;

    /// Whether the contract is paused
    async fn is_paused(&self, address: Address) -> Result<bool, ChainError>;

    /// Current oracle reading
    async fn read_oracle(&self, oracle: Address) -> Result<OracleReading, ChainError>;

    /// Named storage slot of a contract
    async fn storage(&self, address: Address, key: &str) -> Result<Option<Value>, ChainError>;
}

/// State-changing access to the ledger
///
/// Deploy and setup hooks receive this trait.
#[async_trait]
pub trait ChainClient: ChainState {
    /// Upcast to the read-only view
    fn as_state(&self) -> &dyn ChainState;

    /// Deploy a contract from a named artifact
    async fn deploy(
        &self,
        deployer: Address,
        artifact: &str,
        args: &[Value],
    ) -> Result<Address, ChainError>;

    /// Submit a call from sender
    async fn call(&self, sender: Address, call: &ContractCall) -> Result<Receipt, ChainError>;

    /// Credit native currency to an account
    async fn fund(&self, account: Address, amount: Amount) -> Result<(), ChainError>;
}
