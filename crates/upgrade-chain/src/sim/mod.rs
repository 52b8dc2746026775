//! In-memory ledger for tests and dry runs
//!
//! [`SimulatedChain`] implements [`ChainClient`](crate::ChainClient) over a
//! small model of the target system: contracts with named storage, pause
//! flags and oracle readings, token balances, and one global role table.
//! [`SimulatedGovernance`] executes proposal payloads atomically from a
//! per-category timelock. [`Genesis`] seeds both from a file.
//!
//! # Example
//!
//! ```rust
//! use upgrade_chain::sim::SimulatedChain;
//! use upgrade_chain::Role;
//! use upgrade_registry::Address;
//!
//! let chain = SimulatedChain::new();
//! let governor = Address::from_low_u64(1);
//! chain.grant_role(Role::governor(), governor);
//! let core = chain.install(Address::from_low_u64(100), "Core");
//! assert_eq!(chain.artifact_of(core).as_deref(), Some("Core"));
//! ```

mod chain;
mod genesis;
mod governance;
mod state;

pub use chain::SimulatedChain;
pub use genesis::{Genesis, GenesisBalance, GenesisContract, GenesisNative};
pub use governance::SimulatedGovernance;
