//! Inputs handed to each lifecycle hook
//!
//! Hooks only ever see frozen [`RegistrySnapshot`]s; the orchestrator owns
//! the registry and merges whatever a deploy hook returns.

use crate::error::PhaseError;
use crate::outputs::DeployOutputs;
use upgrade_chain::{ChainClient, ChainState};
use upgrade_registry::{Address, RegistrySnapshot, ResourceHandle};

/// Input to `deploy`
#[derive(Clone, Copy)]
pub struct DeployContext<'a> {
    /// Identity that signs deployments
    pub deployer: Address,
    /// Registry before this proposal
    pub registry: &'a RegistrySnapshot,
    /// Chain to deploy on
    pub chain: &'a dyn ChainClient,
    /// Emit diagnostics
    pub logging: bool,
}

impl DeployContext<'_> {
    /// Address of a live resource
    ///
    /// # Errors
    /// Fails when the name is unknown or deprecated
    pub fn address(&self, name: &str) -> Result<Address, PhaseError> {
        Ok(self.registry.address(name)?)
    }
}

/// Input to `setup` and `teardown`
#[derive(Clone, Copy)]
pub struct PhaseContext<'a> {
    /// Identity used for privileged test-only actions
    pub deployer: Address,
    /// Registry including this proposal's resources
    pub registry: &'a RegistrySnapshot,
    /// Registry before this proposal
    pub previous: &'a RegistrySnapshot,
    /// Resources this proposal introduced or resolved
    pub resources: &'a [ResourceHandle],
    /// Values produced by `deploy`
    pub outputs: &'a DeployOutputs,
    /// Chain to act on
    pub chain: &'a dyn ChainClient,
    /// Emit diagnostics
    pub logging: bool,
}

impl PhaseContext<'_> {
    /// Address of a live resource
    ///
    /// # Errors
    /// Fails when the name is unknown or deprecated
    pub fn address(&self, name: &str) -> Result<Address, PhaseError> {
        Ok(self.registry.address(name)?)
    }
}

/// Input to `validate`; read-only chain access
#[derive(Clone, Copy)]
pub struct ValidateContext<'a> {
    /// Registry after governance execution
    pub registry: &'a RegistrySnapshot,
    /// Registry before this proposal
    pub previous: &'a RegistrySnapshot,
    /// Resources this proposal introduced or resolved
    pub resources: &'a [ResourceHandle],
    /// Values produced by `deploy`
    pub outputs: &'a DeployOutputs,
    /// Live state
    pub chain: &'a dyn ChainState,
}

impl ValidateContext<'_> {
    /// Address of a live resource
    ///
    /// # Errors
    /// Fails when the name is unknown or deprecated
    pub fn address(&self, name: &str) -> Result<Address, PhaseError> {
        Ok(self.registry.address(name)?)
    }

    /// Address a name had before this proposal, live or not
    ///
    /// # Errors
    /// Fails when the name was never registered
    pub fn previous_address(&self, name: &str) -> Result<Address, PhaseError> {
        Ok(self.previous.get_any(name)?.handle.address)
    }
}
