//! Upgrade Registry
//!
//! Tracks every resource (contract or account) created or touched while a
//! catalogue of proposals is applied.
//!
//! # Core Concepts
//!
//! - [`Address`]: 20-byte opaque identifier of an on-chain resource
//! - [`ResourceHandle`]: name + address + kind, the unit stored in the registry
//! - [`Registry`]: the mutable name → handle map owned by the orchestrator
//! - [`RegistrySnapshot`]: frozen, read-only view handed to lifecycle phases
//!
//! # Example
//!
//! ```rust
//! use upgrade_registry::{Address, Registry, ResourceHandle, ResourceKind};
//!
//! let mut registry = Registry::new();
//! registry.put("core", ResourceHandle::new("core", Address::from_low_u64(1), ResourceKind::Core));
//!
//! let snapshot = registry.snapshot();
//! assert_eq!(snapshot.get("core").unwrap().address, Address::from_low_u64(1));
//! assert!(snapshot.get("fei").is_err());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod address;
mod error;
mod handle;
mod registry;

pub use address::{Address, AddressParseError};
pub use error::RegistryError;
pub use handle::{ResourceHandle, ResourceKind};
pub use registry::{
    EntryStatus, MergeSummary, Overwrite, PutOutcome, Registry, RegistryEntry, RegistrySnapshot,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
