//! Run report

use crate::result::ProposalResult;
use crate::state::ProposalState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use ulid::Ulid;
use upgrade_chain::ProposalCategory;
use upgrade_proposal::AssertionFailure;
use upgrade_registry::{Address, Overwrite, Registry};

/// Outcome of one orchestrator run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Run identifier
    pub run_id: Ulid,
    /// When the first proposal started
    pub started_at: DateTime<Utc>,
    /// When the last proposal finished
    pub finished_at: DateTime<Utc>,
    /// Registry after every proposal
    pub registry: Registry,
    /// Results in catalogue order, placeholders excluded
    pub results: Vec<ProposalResult>,
    /// Placeholder ids that were skipped
    pub skipped: Vec<String>,
}

impl RunReport {
    /// Number of proposals that did not pass
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed()).count()
    }

    /// Check that every proposal passed
    #[must_use]
    pub fn is_safe_to_ship(&self) -> bool {
        self.failure_count() == 0
    }

    /// Result for a proposal id
    #[must_use]
    pub fn result(&self, id: &str) -> Option<&ProposalResult> {
        self.results.iter().find(|r| r.id == id)
    }

    /// Final registry and results
    #[must_use]
    pub fn into_parts(self) -> (Registry, Vec<ProposalResult>) {
        (self.registry, self.results)
    }

    /// Human-readable report
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Upgrade Run Report ===\n\n");
        report.push_str(&format!("Run: {}\n", self.run_id));
        report.push_str(&format!(
            "Duration: {} ms\n",
            (self.finished_at - self.started_at).num_milliseconds()
        ));
        report.push_str(&format!("Proposals: {}\n", self.results.len()));
        report.push_str(&format!("Failed: {}\n", self.failure_count()));
        report.push_str(&format!("Skipped placeholders: {}\n", self.skipped.len()));

        report.push_str("\n=== Proposals ===\n");
        for result in &self.results {
            report.push_str(&format!(
                "[{}] {} ({}) {}{} in {} ms\n",
                if result.passed() { "PASS" } else { "FAIL" },
                result.id,
                result.category,
                result.terminal_state(),
                if result.torn_down() { "" } else { ", teardown incomplete" },
                result.elapsed.as_millis()
            ));
            for failure in &result.failures {
                report.push_str(&format!("    {failure}\n"));
            }
            for failure in &result.assertion_failures {
                report.push_str(&format!("    assertion {failure}\n"));
            }
        }

        let overwrites: Vec<(Option<&str>, &Overwrite)> = self
            .registry
            .overwrites()
            .iter()
            .map(|o| (None, o))
            .chain(
                self.results
                    .iter()
                    .flat_map(|r| r.superseded.iter().map(move |o| (Some(r.id.as_str()), o))),
            )
            .collect();
        if !overwrites.is_empty() {
            report.push_str("\n=== Registry Overwrites ===\n");
            for (i, (by, overwrite)) in overwrites.iter().enumerate() {
                report.push_str(&format!(
                    "{}. {}: {} -> {}",
                    i + 1,
                    overwrite.name,
                    overwrite.previous,
                    overwrite.replacement
                ));
                if let Some(id) = by {
                    report.push_str(&format!(" ({id})"));
                }
                report.push('\n');
            }
        }

        report.push_str(&format!(
            "\n=== Result: {} ===\n",
            if self.is_safe_to_ship() {
                "SAFE TO SHIP"
            } else {
                "NOT SAFE TO SHIP"
            }
        ));

        report
    }

    /// Serializable summary
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let snapshot = self.registry.snapshot();
        RunSummary {
            run_id: self.run_id,
            started_at: self.started_at,
            finished_at: self.finished_at,
            safe_to_ship: self.is_safe_to_ship(),
            failure_count: self.failure_count(),
            skipped: self.skipped.clone(),
            proposals: self.results.iter().map(ProposalSummary::from).collect(),
            registry: snapshot
                .live_names()
                .into_iter()
                .filter_map(|name| {
                    snapshot
                        .address(name)
                        .ok()
                        .map(|address| (name.to_string(), address))
                })
                .collect(),
        }
    }
}

/// JSON form of a [`RunReport`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Run identifier
    pub run_id: Ulid,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time
    pub finished_at: DateTime<Utc>,
    /// No proposal failed
    pub safe_to_ship: bool,
    /// Proposals that did not pass
    pub failure_count: usize,
    /// Skipped placeholder ids
    pub skipped: Vec<String>,
    /// Per-proposal outcomes
    pub proposals: Vec<ProposalSummary>,
    /// Live registry names
    pub registry: BTreeMap<String, Address>,
}

/// JSON form of a [`ProposalResult`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalSummary {
    /// Proposal id
    pub id: String,
    /// Governance track
    pub category: ProposalCategory,
    /// Furthest state reached
    pub state: ProposalState,
    /// Teardown completed
    pub torn_down: bool,
    /// Proposal passed
    pub passed: bool,
    /// Captured errors as `phase: message`
    pub failures: Vec<String>,
    /// Failed assertions
    pub assertion_failures: Vec<AssertionFailure>,
    /// Resources deployed or resolved
    pub resources: BTreeMap<String, Address>,
    /// Live entries moved to a new address
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub superseded: Vec<Overwrite>,
    /// Wall time
    pub elapsed_ms: u128,
}

impl From<&ProposalResult> for ProposalSummary {
    fn from(result: &ProposalResult) -> Self {
        Self {
            id: result.id.clone(),
            category: result.category,
            state: result.terminal_state(),
            torn_down: result.torn_down(),
            passed: result.passed(),
            failures: result.failures.iter().map(ToString::to_string).collect(),
            assertion_failures: result.assertion_failures.clone(),
            resources: result
                .resources
                .iter()
                .map(|h| (h.name.clone(), h.address))
                .collect(),
            superseded: result.superseded.clone(),
            elapsed_ms: result.elapsed.as_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{HarnessError, Phase};
    use upgrade_registry::{ResourceHandle, ResourceKind};

    fn report() -> RunReport {
        let mut passed = ProposalResult::new("p1", ProposalCategory::Dao);
        for state in [
            ProposalState::Deployed,
            ProposalState::Configured,
            ProposalState::Validated,
            ProposalState::TornDown,
        ] {
            passed.enter(state).unwrap();
        }
        passed.resources.push(ResourceHandle::new(
            "oracleA",
            Address::from_low_u64(1),
            ResourceKind::Oracle,
        ));
        passed.superseded.push(Overwrite {
            name: "oracleA".to_string(),
            previous: Address::from_low_u64(9),
            replacement: Address::from_low_u64(1),
        });

        let mut failed = ProposalResult::new("p2", ProposalCategory::TribalCouncil);
        failed.record(
            Phase::Deploy,
            HarnessError::PhaseExecution {
                phase: Phase::Deploy,
                message: "reverted: no".to_string(),
            },
        );
        failed.enter(ProposalState::TornDown).unwrap();

        let now = Utc::now();
        RunReport {
            run_id: Ulid::new(),
            started_at: now,
            finished_at: now,
            registry: Registry::from_handles(passed.resources.clone()),
            results: vec![passed, failed],
            skipped: vec!["p0".to_string()],
        }
    }

    #[test]
    fn counts_failures() {
        let report = report();
        assert_eq!(report.failure_count(), 1);
        assert!(!report.is_safe_to_ship());
        assert!(report.result("p2").is_some());
    }

    #[test]
    fn text_lists_each_proposal() {
        let text = report().render_text();
        assert!(text.starts_with("=== Upgrade Run Report ==="));
        assert!(text.contains("[PASS] p1 (dao) VALIDATED in"));
        assert!(text.contains("[FAIL] p2 (tc) PENDING in"));
        assert!(text.contains("    deploy: deploy failed: reverted: no"));
        assert!(text.contains("Skipped placeholders: 1"));
        assert!(text.contains(&format!(
            "1. oracleA: {} -> {} (p1)",
            Address::from_low_u64(9),
            Address::from_low_u64(1)
        )));
        assert!(text.ends_with("=== Result: NOT SAFE TO SHIP ===\n"));
    }

    #[test]
    fn summary_serializes() {
        let summary = serde_json::to_value(report().summary()).unwrap();
        assert_eq!(summary["failureCount"], 1);
        assert_eq!(summary["safeToShip"], false);
        assert_eq!(summary["proposals"][0]["state"], "VALIDATED");
        assert_eq!(
            summary["registry"]["oracleA"],
            "0x0000000000000000000000000000000000000001"
        );
        assert_eq!(summary["skipped"][0], "p0");
        assert_eq!(summary["proposals"][0]["superseded"][0]["name"], "oracleA");
        assert!(summary["proposals"][1].get("superseded").is_none());
    }
}
