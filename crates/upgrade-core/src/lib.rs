//! Upgrade Core
//!
//! Applies a [`Catalogue`](upgrade_proposal::Catalogue) of proposals to a
//! live or simulated system and reports which ones are safe to ship.
//!
//! # Lifecycle
//!
//! Every active proposal moves through
//! `PENDING -> DEPLOYED -> CONFIGURED -> VALIDATED -> TORN_DOWN`:
//!
//! - deploy (or, when the proposal is already live, resolve its expected
//!   resources by name), then merge the resources into the registry
//! - setup
//! - governance execution of the payload, deprecations, then validation
//! - teardown, which runs whatever happened before it
//!
//! Proposals run one after another. The [`Orchestrator`] owns the registry;
//! hooks only see snapshots.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use upgrade_chain::sim::Genesis;
//! use upgrade_core::{Orchestrator, OrchestratorConfig};
//! use upgrade_proposal::{Catalogue, CatalogueMode, ProposalDescriptor};
//! use upgrade_registry::{Address, Registry};
//!
//! # async fn example() -> Result<(), upgrade_core::HarnessError> {
//! let (chain, governance) = Genesis::default().build();
//! let orchestrator = Orchestrator::new(
//!     OrchestratorConfig::new(Address::from_low_u64(1)),
//!     chain,
//!     Arc::new(governance),
//! );
//!
//! let catalogue = Catalogue::new(CatalogueMode::Fresh)
//!     .with_proposal(ProposalDescriptor::builder("p1").build())
//!     .expect("unique ids");
//! let report = orchestrator.run(&catalogue, Registry::new()).await?;
//! println!("{}", report.render_text());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod guard;
mod orchestrator;
mod report;
mod result;
mod state;
mod validator;

pub use error::{HarnessError, Phase, ProposalFailure};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use report::{ProposalSummary, RunReport, RunSummary};
pub use result::ProposalResult;
pub use state::{allowed_transitions, validate_transition, ProposalState, StateMachineError};
pub use validator::{Validation, Validator};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
