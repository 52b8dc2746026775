//! Proposal lifecycle state machine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one proposal within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalState {
    /// Not started
    Pending,
    /// Resources deployed or resolved and merged
    Deployed,
    /// Setup complete
    Configured,
    /// Governance executed and every assertion held
    Validated,
    /// Teardown complete
    TornDown,
}

impl ProposalState {
    /// Label used in reports
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Deployed => "DEPLOYED",
            Self::Configured => "CONFIGURED",
            Self::Validated => "VALIDATED",
            Self::TornDown => "TORN_DOWN",
        }
    }
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State machine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StateMachineError {
    /// Transition not in the table
    #[error("illegal transition {from} -> {to}")]
    IllegalTransition {
        /// Current state
        from: ProposalState,
        /// Requested state
        to: ProposalState,
    },
}

/// Validate a state transition
///
/// # Errors
/// Returns `StateMachineError::IllegalTransition` for anything not listed
/// by [`allowed_transitions`]
pub fn validate_transition(from: ProposalState, to: ProposalState) -> Result<(), StateMachineError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(StateMachineError::IllegalTransition { from, to })
    }
}

/// States reachable in one step; teardown is reachable from every live state
#[must_use]
pub fn allowed_transitions(from: ProposalState) -> Vec<ProposalState> {
    use ProposalState::{Configured, Deployed, Pending, TornDown, Validated};
    match from {
        Pending => vec![Deployed, TornDown],
        Deployed => vec![Configured, TornDown],
        Configured => vec![Validated, TornDown],
        Validated => vec![TornDown],
        TornDown => vec![],
    }
}
