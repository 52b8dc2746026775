//! Per-proposal outcome

use crate::error::{HarnessError, Phase, ProposalFailure};
use crate::state::{validate_transition, ProposalState, StateMachineError};
use std::time::Duration;
use upgrade_chain::{GovernanceReceipt, ProposalCategory};
use upgrade_proposal::AssertionFailure;
use upgrade_registry::{Overwrite, ResourceHandle};

/// What happened to one proposal during a run
#[derive(Debug, Clone)]
pub struct ProposalResult {
    /// Proposal id
    pub id: String,
    /// Governance track
    pub category: ProposalCategory,
    /// States entered, starting at `Pending`
    pub trail: Vec<ProposalState>,
    /// Whether the deploy hook was called
    pub deploy_invoked: bool,
    /// Errors captured at the proposal boundary
    pub failures: Vec<ProposalFailure>,
    /// Post-conditions that did not hold
    pub assertion_failures: Vec<AssertionFailure>,
    /// Resources deployed or resolved
    pub resources: Vec<ResourceHandle>,
    /// Live entries this proposal moved to a new address
    pub superseded: Vec<Overwrite>,
    /// Governance execution receipt, when the payload ran
    pub governance: Option<GovernanceReceipt>,
    /// Wall time across all phases
    pub elapsed: Duration,
}

impl ProposalResult {
    /// Create a pending result
    #[must_use]
    pub fn new(id: impl Into<String>, category: ProposalCategory) -> Self {
        Self {
            id: id.into(),
            category,
            trail: vec![ProposalState::Pending],
            deploy_invoked: false,
            failures: Vec::new(),
            assertion_failures: Vec::new(),
            resources: Vec::new(),
            superseded: Vec::new(),
            governance: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> ProposalState {
        self.trail.last().copied().unwrap_or(ProposalState::Pending)
    }

    /// Move to `to`
    ///
    /// # Errors
    /// Returns `StateMachineError::IllegalTransition` if `to` is not
    /// reachable from the current state
    pub fn enter(&mut self, to: ProposalState) -> Result<(), StateMachineError> {
        validate_transition(self.state(), to)?;
        self.trail.push(to);
        Ok(())
    }

    /// Attach an error
    pub fn record(&mut self, phase: Phase, error: HarnessError) {
        self.failures.push(ProposalFailure { phase, error });
    }

    /// Furthest lifecycle state reached, not counting teardown
    #[must_use]
    pub fn terminal_state(&self) -> ProposalState {
        self.trail
            .iter()
            .rev()
            .find(|s| **s != ProposalState::TornDown)
            .copied()
            .unwrap_or(ProposalState::Pending)
    }

    /// Whether teardown completed
    #[must_use]
    pub fn torn_down(&self) -> bool {
        self.state() == ProposalState::TornDown
    }

    /// Check if the proposal validated without any captured error
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
            && self.assertion_failures.is_empty()
            && self.terminal_state() == ProposalState::Validated
    }

    /// Failure captured in `phase`, if any
    #[must_use]
    pub fn failure_in(&self, phase: Phase) -> Option<&ProposalFailure> {
        self.failures.iter().find(|f| f.phase == phase)
    }
}
