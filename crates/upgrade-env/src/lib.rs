//! Upgrade Environment
//!
//! Bootstraps a simulated or forked state of the target system and the
//! baseline [`Registry`](upgrade_registry::Registry) every run starts from.
//!
//! - [`EnvironmentConfig`]: logging flag, deployer identity, state version
//! - [`AddressBook`]: the named addresses of the deployed system
//! - [`EnvironmentLoader`]: validates both and loads once per instance
//!
//! # Example
//!
//! ```rust,no_run
//! use upgrade_env::{AddressBook, EnvironmentConfig, EnvironmentLoader};
//! use upgrade_chain::sim::Genesis;
//! use upgrade_registry::Address;
//!
//! # async fn example() -> Result<(), upgrade_env::EnvError> {
//! let config = EnvironmentConfig::new(Address::from_low_u64(1)).with_logging(true);
//! let book = AddressBook::load("addresses.json").await?;
//! let loader = EnvironmentLoader::simulated(config, book, &Genesis::default());
//! let env = loader.load().await?;
//! println!("{} baseline resources", env.baseline().len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod book;
mod config;
mod error;
mod loader;

pub use book::{AddressBook, AddressBookEntry};
pub use config::{EnvironmentConfig, SUPPORTED_STATE_VERSIONS};
pub use error::EnvError;
pub use loader::{Environment, EnvironmentLoader};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
