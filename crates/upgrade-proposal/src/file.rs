//! Persisted catalogue format and hook binding

use crate::catalogue::{Catalogue, CatalogueMode};
use crate::declarative::{DeclarativeLifecycle, DeploymentSpec};
use crate::descriptor::ProposalDescriptor;
use crate::error::CatalogueError;
use crate::invariant::Invariant;
use crate::lifecycle::{NoopLifecycle, ProposalLifecycle};
use crate::payload::ProposalDescription;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};
use upgrade_chain::amount::{self, Amount};
use upgrade_chain::ProposalCategory;

/// One persisted entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueRecord {
    /// Run the deploy phase in a fresh catalogue
    pub deploy: bool,
    /// Native currency the governance executor needs
    #[serde(default, with = "amount::serde_str")]
    pub total_value: Amount,
    /// Governance payload; absent for placeholders
    #[serde(default)]
    pub proposal: Option<ProposalDescription>,
    /// Already-submitted on-chain id; empty or null means none
    #[serde(default, deserialize_with = "non_empty")]
    pub proposal_id: Option<String>,
    /// Names the proposal writes
    #[serde(default)]
    pub affected_contract_signoff: Vec<String>,
    /// Names the proposal retires
    #[serde(default)]
    pub deprecated_contract_signoff: Vec<String>,
    /// Governance track
    #[serde(default)]
    pub category: ProposalCategory,
    /// Names resolved when deploy is skipped; defaults to the affected names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_resources: Option<Vec<String>>,
    /// Declared post-conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invariants: Vec<Invariant>,
    /// Contracts to deploy when no hooks are registered
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deployments: Vec<DeploymentSpec>,
}

fn non_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|id| !id.is_empty()))
}

/// Persisted catalogue: proposal id to record, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogueFile {
    entries: IndexMap<String, CatalogueRecord>,
}

impl CatalogueFile {
    /// Parse JSON
    ///
    /// # Errors
    /// Returns `CatalogueError::Parse` on malformed input
    pub fn from_json_str(text: &str) -> Result<Self, CatalogueError> {
        serde_json::from_str(text).map_err(|e| CatalogueError::Parse(e.to_string()))
    }

    /// Parse YAML
    ///
    /// # Errors
    /// Returns `CatalogueError::Parse` on malformed input
    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogueError> {
        serde_yaml::from_str(text).map_err(|e| CatalogueError::Parse(e.to_string()))
    }

    /// Records in order
    pub fn records(&self) -> impl Iterator<Item = (&str, &CatalogueRecord)> {
        self.entries.iter().map(|(id, record)| (id.as_str(), record))
    }

    /// Number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bind records to lifecycle hooks
    ///
    /// Hooks registered in `hooks` win; otherwise declared deployments are
    /// used; otherwise the proposal gets a no-op lifecycle, which is an
    /// error only when it would have to deploy.
    ///
    /// # Errors
    /// Returns `CatalogueError::MissingLifecycle` for a fresh-mode proposal
    /// that must deploy but has nothing to deploy with
    pub fn into_catalogue(self, hooks: &HookBook, mode: CatalogueMode) -> Result<Catalogue, CatalogueError> {
        let mut catalogue = Catalogue::new(mode);

        for id in hooks.ids() {
            if !self.entries.contains_key(id) {
                warn!(proposal = id, "hooks registered for a proposal not in the catalogue");
            }
        }

        for (id, record) in self.entries {
            let Some(payload) = record.proposal else {
                debug!(proposal = %id, "placeholder entry");
                catalogue.push_placeholder(id, record.category)?;
                continue;
            };

            let lifecycle: Arc<dyn ProposalLifecycle> = if let Some(hooks) = hooks.get(&id) {
                Arc::clone(hooks)
            } else if !record.deployments.is_empty() {
                Arc::new(DeclarativeLifecycle::new(record.deployments))
            } else if record.deploy && mode == CatalogueMode::Fresh {
                return Err(CatalogueError::MissingLifecycle { id });
            } else {
                Arc::new(NoopLifecycle)
            };

            let expected = record
                .expected_resources
                .unwrap_or_else(|| record.affected_contract_signoff.clone());

            let mut builder = ProposalDescriptor::builder(id)
                .with_category(record.category)
                .with_deploy(record.deploy)
                .with_total_value(record.total_value)
                .with_affected(record.affected_contract_signoff)
                .with_deprecated(record.deprecated_contract_signoff)
                .with_expected(expected)
                .with_payload(payload)
                .with_shared_lifecycle(lifecycle);
            if let Some(existing) = record.proposal_id {
                builder = builder.with_existing_proposal_id(existing);
            }
            for invariant in record.invariants {
                builder = builder.with_invariant(invariant);
            }

            catalogue.push(builder.build())?;
        }

        Ok(catalogue)
    }
}

/// Lifecycle hooks keyed by proposal id
#[derive(Clone, Default)]
pub struct HookBook {
    hooks: BTreeMap<String, Arc<dyn ProposalLifecycle>>,
}

impl HookBook {
    /// Create empty book
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register hooks for a proposal
    #[must_use]
    pub fn with_hooks(mut self, id: impl Into<String>, lifecycle: impl ProposalLifecycle + 'static) -> Self {
        self.register(id, Arc::new(lifecycle));
        self
    }

    /// Register shared hooks; replaces earlier hooks for the id
    pub fn register(&mut self, id: impl Into<String>, lifecycle: Arc<dyn ProposalLifecycle>) {
        self.hooks.insert(id.into(), lifecycle);
    }

    /// Hooks for a proposal
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<dyn ProposalLifecycle>> {
        self.hooks.get(id)
    }

    /// Registered ids, sorted
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.hooks.keys().map(String::as_str)
    }

    /// Number of registered proposals
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl std::fmt::Debug for HookBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.hooks.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::CatalogueEntry;
    use pretty_assertions::assert_eq;

    const CATALOGUE: &str = r#"{
        "fip_82": {
            "deploy": true,
            "totalValue": 0,
            "proposal": { "title": "FIP-82", "commands": [] },
            "proposalId": "",
            "affectedContractSignoff": ["core", "roleBastion"],
            "deprecatedContractSignoff": [],
            "category": "dao",
            "deployments": [
                { "name": "roleBastion", "artifact": "RoleBastion", "kind": "governance", "args": ["{core}"] }
            ]
        },
        "fip_x": {
            "deploy": false,
            "totalValue": "0",
            "proposalId": null,
            "affectedContractSignoff": [],
            "deprecatedContractSignoff": [],
            "category": "tc"
        },
        "oa_1": {
            "deploy": false,
            "totalValue": "4000000000000000000",
            "proposal": { "title": "OA-1" },
            "proposalId": "1234",
            "affectedContractSignoff": ["pcvGuardian"],
            "deprecatedContractSignoff": ["oldGuardian"],
            "category": "oa",
            "expectedResources": ["pcvGuardian", "oldGuardian"],
            "invariants": [{ "type": "paused", "resource": "pcvGuardian", "paused": false }]
        }
    }"#;

    #[test]
    fn converts_records_in_order() {
        let file = CatalogueFile::from_json_str(CATALOGUE).unwrap();
        let catalogue = file.into_catalogue(&HookBook::new(), CatalogueMode::Fresh).unwrap();

        let ids: Vec<&str> = catalogue.entries().map(CatalogueEntry::id).collect();
        assert_eq!(ids, vec!["fip_82", "fip_x", "oa_1"]);
        assert_eq!(catalogue.placeholders(), vec!["fip_x"]);

        let fip_82 = catalogue.get("fip_82").and_then(CatalogueEntry::descriptor).unwrap();
        assert_eq!(fip_82.existing_proposal_id(), None);
        assert_eq!(fip_82.expected().len(), 2);

        let oa = catalogue.get("oa_1").and_then(CatalogueEntry::descriptor).unwrap();
        assert_eq!(oa.category(), ProposalCategory::OptimisticApproval);
        assert_eq!(oa.existing_proposal_id(), Some("1234"));
        assert_eq!(oa.total_value(), 4_000_000_000_000_000_000);
        assert!(oa.deprecated().contains("oldGuardian"));
        assert_eq!(oa.invariants().len(), 1);
    }

    #[test]
    fn deploying_entry_without_lifecycle_is_rejected() {
        let file = CatalogueFile::from_yaml_str(
            r#"
fip_99:
  deploy: true
  totalValue: 0
  proposal:
    title: FIP-99
  category: dao
"#,
        )
        .unwrap();

        let err = file
            .clone()
            .into_catalogue(&HookBook::new(), CatalogueMode::Fresh)
            .unwrap_err();
        assert_eq!(err, CatalogueError::MissingLifecycle { id: "fip_99".to_string() });

        // nothing deploys in replay mode
        assert!(file.clone().into_catalogue(&HookBook::new(), CatalogueMode::Replay).is_ok());

        // registered hooks satisfy it
        let hooks = HookBook::new().with_hooks("fip_99", NoopLifecycle);
        assert!(file.into_catalogue(&hooks, CatalogueMode::Fresh).is_ok());
    }

    #[test]
    fn malformed_input_is_a_parse_error() {
        assert!(matches!(
            CatalogueFile::from_json_str(r#"{"p": {"totalValue": 1}}"#),
            Err(CatalogueError::Parse(_))
        ));
    }
}
