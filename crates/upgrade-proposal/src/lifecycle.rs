//! The four lifecycle hooks of a proposal

use crate::assertion::AssertionSet;
use crate::context::{DeployContext, PhaseContext, ValidateContext};
use crate::error::PhaseError;
use crate::outputs::Deployment;
use async_trait::async_trait;

/// Hooks driven by the orchestrator, in order: deploy, setup, validate,
/// teardown
///
/// Every hook has a no-op default so a proposal implements only what it
/// needs. `deploy` is skipped when the proposal's effects already exist.
#[async_trait]
pub trait ProposalLifecycle: Send + Sync {
    /// Deploy new resources
    async fn deploy(&self, _ctx: &DeployContext<'_>) -> Result<Deployment, PhaseError> {
        Ok(Deployment::default())
    }

    /// Prepare state the proposal needs but does not itself carry
    async fn setup(&self, _ctx: &PhaseContext<'_>) -> Result<(), PhaseError> {
        Ok(())
    }

    /// Assert post-conditions after governance execution
    async fn validate(
        &self,
        _ctx: &ValidateContext<'_>,
        _assertions: &mut AssertionSet,
    ) -> Result<(), PhaseError> {
        Ok(())
    }

    /// Undo test-only state
    async fn teardown(&self, _ctx: &PhaseContext<'_>) -> Result<(), PhaseError> {
        Ok(())
    }
}

/// Lifecycle that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLifecycle;

impl ProposalLifecycle for NoopLifecycle {}
