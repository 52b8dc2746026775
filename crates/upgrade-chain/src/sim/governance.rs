//! Simulated governance execution

use super::chain::SimulatedChain;
use crate::call::Event;
use crate::error::ChainError;
use crate::governance::{GovernanceAction, GovernanceExecutor, GovernanceReceipt, ProposalCategory};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};
use upgrade_registry::Address;

/// Executes payloads from the timelock registered for their category
///
/// The timelock is funded with the action's total value, then every call is
/// applied in order. Any failing call discards the whole batch.
#[derive(Debug)]
pub struct SimulatedGovernance {
    chain: Arc<SimulatedChain>,
    timelocks: BTreeMap<ProposalCategory, Address>,
    executed: Mutex<Vec<String>>,
}

impl SimulatedGovernance {
    /// Create executor over chain with no timelocks
    #[must_use]
    pub fn new(chain: Arc<SimulatedChain>) -> Self {
        Self {
            chain,
            timelocks: BTreeMap::new(),
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Register the timelock for a category
    #[inline]
    #[must_use]
    pub fn with_timelock(mut self, category: ProposalCategory, timelock: Address) -> Self {
        self.timelocks.insert(category, timelock);
        self
    }

    /// Timelock for a category
    #[must_use]
    pub fn timelock(&self, category: ProposalCategory) -> Option<Address> {
        self.timelocks.get(&category).copied()
    }

    /// Proposal ids executed so far, in order
    #[must_use]
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().clone()
    }
}

#[async_trait]
impl GovernanceExecutor for SimulatedGovernance {
    async fn execute(&self, action: &GovernanceAction) -> Result<GovernanceReceipt, ChainError> {
        let timelock = self.timelock(action.category).ok_or_else(|| {
            ChainError::reverted(format!("no timelock for category {}", action.category))
        })?;

        let events = self.chain.transact(|state| {
            state.credit(timelock, action.total_value);
            let mut events = Vec::new();
            for (index, call) in action.calls.iter().enumerate() {
                debug!(proposal = %action.proposal_id, index, method = %call.method, "applying command");
                let emitted = state.apply_call(timelock, call).map_err(|e| {
                    ChainError::reverted(format!("command {index} ({}): {e}", call.method))
                })?;
                events.extend(emitted);
            }
            events.push(Event::new(
                timelock,
                "ProposalExecuted",
                json!({
                    "proposal": action.proposal_id,
                    "onChainId": action.existing_proposal_id,
                }),
            ));
            Ok(events)
        })?;

        info!(
            proposal = %action.proposal_id,
            category = %action.category,
            calls = action.calls.len(),
            "governance action executed"
        );
        self.executed.lock().push(action.proposal_id.clone());
        Ok(GovernanceReceipt { events })
    }
}
