//! Upgrade Chain Boundary
//!
//! The harness never executes transactions itself. This crate names the
//! capabilities it borrows from the ledger runtime:
//!
//! - [`ChainState`]: read access to live state (balances, roles, oracles, storage)
//! - [`ChainClient`]: state-changing access (deploy, call, fund)
//! - [`GovernanceExecutor`]: apply a proposal payload under the target
//!   system's own governance rules
//!
//! The [`sim`] module provides an in-memory implementation of all three for
//! tests and dry runs.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod amount;
mod call;
mod error;
mod governance;
mod role;
pub mod sim;
mod state;

pub use amount::Amount;
pub use call::{ContractCall, Event, OracleReading, Receipt};
pub use error::ChainError;
pub use governance::{GovernanceAction, GovernanceExecutor, GovernanceReceipt, ProposalCategory};
pub use role::Role;
pub use state::{ChainClient, ChainState};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
