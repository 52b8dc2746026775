//! Environment loading errors

use upgrade_chain::ChainError;
use upgrade_registry::Address;

/// Environment errors; all of them stop a run before any proposal starts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvError {
    /// Deployer identity is the null address
    #[error("deployer address is not set")]
    ZeroDeployer,

    /// State version not understood
    #[error("unsupported state version {version} (supported: {supported:?})")]
    UnsupportedStateVersion { version: u32, supported: Vec<u32> },

    /// Required names absent from the address book
    #[error("contract address is not set: {}", names.join(", "))]
    MissingAddresses { names: Vec<String> },

    /// A contract-kind entry has no code on chain
    #[error("{name} at {address} has no code")]
    NoCode { name: String, address: Address },

    /// Address book could not be read or parsed
    #[error("address book: {0}")]
    AddressBook(String),

    /// Chain read failed while loading
    #[error("chain: {0}")]
    Chain(#[from] ChainError),
}
