//! Upgrade Test Utilities
//!
//! Shared fixtures for the workspace's tests: a closure-driven
//! [`ScriptedLifecycle`] that records every hook call into a [`PhaseLog`],
//! plus addresses, registries and a standard simulated environment.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod fixtures;
mod lifecycle;

pub use lifecycle::{PhaseLog, ScriptedLifecycle};
