//! Harness error taxonomy

use crate::state::StateMachineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use upgrade_env::EnvError;
use upgrade_proposal::{DependencyIssue, PhaseError};
use upgrade_registry::RegistryError;

/// Step of a proposal's lifecycle an error is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Resolving existing resources in place of deploy
    Resolve,
    /// Deploy hook
    Deploy,
    /// Setup hook
    Setup,
    /// Payload execution and deprecation bookkeeping
    Governance,
    /// Signoff, invariants and the validate hook
    Validate,
    /// Teardown hook
    Teardown,
}

impl Phase {
    /// Lowercase label
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resolve => "resolve",
            Self::Deploy => "deploy",
            Self::Setup => "setup",
            Self::Governance => "governance",
            Self::Validate => "validate",
            Self::Teardown => "teardown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Harness errors
///
/// `Configuration`, `Environment` and `Dependencies` are configuration
/// errors: they abort a run before any phase executes. Everything else is
/// caught at the proposal boundary and attached to that proposal's result.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HarnessError {
    /// Invalid run configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Environment could not be loaded
    #[error("configuration error: {0}")]
    Environment(#[from] EnvError),

    /// Catalogue needs names that will not exist when it runs
    #[error("configuration error: {}", join_issues(.0))]
    Dependencies(Vec<DependencyIssue>),

    /// A phase looked up a name that is absent or deprecated
    #[error(transparent)]
    UnknownResource(#[from] RegistryError),

    /// A phase itself failed
    #[error("{phase} failed: {message}")]
    PhaseExecution {
        /// Failing phase
        phase: Phase,
        /// Cause
        message: String,
    },

    /// Lifecycle bookkeeping went wrong
    #[error(transparent)]
    StateMachine(#[from] StateMachineError),
}

fn join_issues(issues: &[DependencyIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl HarnessError {
    /// Create a configuration error
    #[inline]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Classify a hook error raised in `phase`
    ///
    /// Registry lookups keep their identity as `UnknownResource`; anything
    /// else is a `PhaseExecution` error.
    #[must_use]
    pub fn from_phase(phase: Phase, error: PhaseError) -> Self {
        match error {
            PhaseError::Registry(e) => Self::UnknownResource(e),
            other => Self::PhaseExecution {
                phase,
                message: other.to_string(),
            },
        }
    }

    /// Check if this error halts the whole run
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::Environment(_) | Self::Dependencies(_)
        )
    }
}

/// Error captured at the proposal boundary
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalFailure {
    /// Phase the error occurred in
    pub phase: Phase,
    /// The error
    pub error: HarnessError,
}

impl fmt::Display for ProposalFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.phase, self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use upgrade_proposal::DependencyIssueKind;

    #[test]
    fn registry_errors_stay_unknown_resource() {
        let err = HarnessError::from_phase(
            Phase::Setup,
            PhaseError::Registry(RegistryError::UnknownResource {
                name: "oracleA".to_string(),
            }),
        );
        assert!(matches!(err, HarnessError::UnknownResource(_)));
        assert_eq!(err.to_string(), "unknown resource: oracleA");
        assert!(!err.is_fatal());
    }

    #[test]
    fn other_hook_errors_become_phase_execution() {
        let err = HarnessError::from_phase(Phase::Deploy, PhaseError::failed("out of gas"));
        assert_eq!(
            err,
            HarnessError::PhaseExecution {
                phase: Phase::Deploy,
                message: "out of gas".to_string()
            }
        );
        assert_eq!(err.to_string(), "deploy failed: out of gas");
    }

    #[test]
    fn configuration_errors_are_fatal() {
        assert!(HarnessError::configuration("no deployer").is_fatal());
        assert!(HarnessError::from(EnvError::ZeroDeployer).is_fatal());

        let deps = HarnessError::Dependencies(vec![DependencyIssue {
            proposal: "p2".to_string(),
            name: "oracleA".to_string(),
            kind: DependencyIssueKind::Missing,
        }]);
        assert!(deps.is_fatal());
        assert!(deps.to_string().starts_with("configuration error: p2 needs oracleA"));
    }
}
