//! Upgrade Harness
//!
//! Command-line runner: reads a TOML config naming an address book, a
//! proposal catalogue and an optional genesis for the simulated chain, then
//! runs the catalogue and prints a report.
//!
//! ```toml
//! deployer = "0x00000000000000000000000000000000000000de"
//! address_book = "addresses.json"
//! catalogue = "catalogue.json"
//! genesis = "genesis.yaml"
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use upgrade_harness::{prepare, HarnessConfig};
//! use upgrade_proposal::HookBook;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = HarnessConfig::load("harness.toml").await?;
//! let prepared = prepare(&config, &HookBook::new()).await?;
//! let report = prepared.run().await?;
//! println!("{}", report.render_text());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cli;
mod config;
mod files;
pub mod logging;
mod run;

pub use config::HarnessConfig;
pub use files::{read_structured, read_text, FileError};
pub use run::{prepare, Prepared};

/// Version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
