//! Upgrade Proposals
//!
//! A proposal is one discrete upgrade unit: an immutable
//! [`ProposalDescriptor`] carrying metadata (governance track, value,
//! affected and deprecated resource names) plus its four lifecycle hooks
//! ([`ProposalLifecycle`]). Proposals are applied in the order of a
//! [`Catalogue`].
//!
//! # Example
//!
//! ```rust
//! use upgrade_proposal::{Catalogue, CatalogueMode, ProposalDescriptor};
//! use upgrade_chain::ProposalCategory;
//!
//! let catalogue = Catalogue::new(CatalogueMode::Fresh)
//!     .with_proposal(
//!         ProposalDescriptor::builder("fip_82")
//!             .with_category(ProposalCategory::Dao)
//!             .with_affected(["core", "tribalCouncilTimelock"])
//!             .build(),
//!     )
//!     .unwrap();
//!
//! assert_eq!(catalogue.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod assertion;
mod catalogue;
mod context;
mod declarative;
mod descriptor;
mod error;
mod file;
mod invariant;
mod lifecycle;
mod outputs;
mod payload;
pub mod template;

pub use assertion::{AssertionFailure, AssertionSet};
pub use catalogue::{Catalogue, CatalogueEntry, CatalogueMode, DependencyIssue, DependencyIssueKind};
pub use context::{DeployContext, PhaseContext, ValidateContext};
pub use declarative::{DeclarativeLifecycle, DeploymentSpec};
pub use descriptor::{ProposalBuilder, ProposalDescriptor};
pub use error::{CatalogueError, PhaseError};
pub use file::{CatalogueFile, CatalogueRecord, HookBook};
pub use invariant::Invariant;
pub use lifecycle::{NoopLifecycle, ProposalLifecycle};
pub use outputs::{DeployOutputs, Deployment};
pub use payload::{ProposalCommand, ProposalDescription};

/// Re-exported so callers can name categories without depending on the chain crate
pub use upgrade_chain::ProposalCategory;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
