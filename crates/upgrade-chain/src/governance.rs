//! Governance execution boundary

use crate::amount::{self, Amount};
use crate::call::{ContractCall, Event};
use crate::error::ChainError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Governance track a proposal is submitted through
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProposalCategory {
    /// Full DAO vote
    #[serde(rename = "dao", alias = "DAO")]
    Dao,
    /// Tribal council multisig
    #[serde(rename = "tc", alias = "TC")]
    TribalCouncil,
    /// Optimistic approval multisig
    #[serde(rename = "oa", alias = "OA")]
    OptimisticApproval,
    /// No governance step
    #[serde(rename = "none", alias = "None")]
    None,
}

impl ProposalCategory {
    /// Whether proposals of this category go through governance
    #[inline]
    #[must_use]
    pub fn has_governance(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Short label
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dao => "dao",
            Self::TribalCouncil => "tc",
            Self::OptimisticApproval => "oa",
            Self::None => "none",
        }
    }
}

impl Default for ProposalCategory {
    fn default() -> Self {
        Self::Dao
    }
}

impl fmt::Display for ProposalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully-resolved proposal payload ready for execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceAction {
    /// Proposal id in the catalogue
    pub proposal_id: String,
    /// Governance track
    pub category: ProposalCategory,
    /// Already-submitted on-chain proposal, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_proposal_id: Option<String>,
    /// Native currency the executor must hold
    #[serde(default, with = "amount::serde_str")]
    pub total_value: Amount,
    /// Calls in order
    pub calls: Vec<ContractCall>,
}

/// Result of a governance execution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GovernanceReceipt {
    /// Events emitted by all calls, in order
    pub events: Vec<Event>,
}

/// Executes proposal payloads under the target system's governance rules
///
/// Execution is all-or-nothing: on error no call takes effect.
#[async_trait]
pub trait GovernanceExecutor: Send + Sync {
    /// Execute the action
    async fn execute(&self, action: &GovernanceAction) -> Result<GovernanceReceipt, ChainError>;
}
