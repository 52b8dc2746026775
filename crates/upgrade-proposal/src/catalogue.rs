//! Ordered proposal catalogue

use crate::descriptor::ProposalDescriptor;
use crate::error::CatalogueError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use upgrade_chain::ProposalCategory;
use upgrade_registry::RegistrySnapshot;

/// How deploy flags are interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogueMode {
    /// Deploy fresh in test state; honour each entry's deploy flag
    #[default]
    Fresh,
    /// Replay against live state; every proposal is already deployed
    Replay,
}

/// One catalogue slot
#[derive(Debug, Clone)]
pub enum CatalogueEntry {
    /// Proposal with a lifecycle
    Active(ProposalDescriptor),
    /// Reserved slot without a proposal; skipped by the orchestrator
    Placeholder {
        /// Proposal id
        id: String,
        /// Governance track
        category: ProposalCategory,
    },
}

impl CatalogueEntry {
    /// Entry id
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Active(descriptor) => descriptor.id(),
            Self::Placeholder { id, .. } => id,
        }
    }

    /// Descriptor, if active
    #[must_use]
    pub fn descriptor(&self) -> Option<&ProposalDescriptor> {
        match self {
            Self::Active(descriptor) => Some(descriptor),
            Self::Placeholder { .. } => None,
        }
    }
}

/// Kind of dependency problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DependencyIssueKind {
    /// Name is neither in the initial registry nor introduced earlier
    Missing,
    /// Name was retired by an earlier proposal
    Deprecated {
        /// Proposal that retired it
        by: String,
    },
}

/// Name a proposal needs that will not be available when it runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyIssue {
    /// Proposal that needs the name
    pub proposal: String,
    /// Needed name
    pub name: String,
    /// Problem
    #[serde(flatten)]
    pub kind: DependencyIssueKind,
}

impl fmt::Display for DependencyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DependencyIssueKind::Missing => {
                write!(f, "{} needs {}, which no one provides", self.proposal, self.name)
            }
            DependencyIssueKind::Deprecated { by } => write!(
                f,
                "{} needs {}, deprecated by {by}",
                self.proposal, self.name
            ),
        }
    }
}

/// Proposals in application order
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    entries: IndexMap<String, CatalogueEntry>,
    mode: CatalogueMode,
}

impl Catalogue {
    /// Create empty catalogue
    #[inline]
    #[must_use]
    pub fn new(mode: CatalogueMode) -> Self {
        Self {
            entries: IndexMap::new(),
            mode,
        }
    }

    /// Append a proposal
    ///
    /// # Errors
    /// Returns `CatalogueError::DuplicateId` if the id is taken
    pub fn push(&mut self, descriptor: ProposalDescriptor) -> Result<(), CatalogueError> {
        self.insert(CatalogueEntry::Active(descriptor))
    }

    /// Append a placeholder
    ///
    /// # Errors
    /// Returns `CatalogueError::DuplicateId` if the id is taken
    pub fn push_placeholder(
        &mut self,
        id: impl Into<String>,
        category: ProposalCategory,
    ) -> Result<(), CatalogueError> {
        self.insert(CatalogueEntry::Placeholder {
            id: id.into(),
            category,
        })
    }

    /// Append a proposal, builder style
    ///
    /// # Errors
    /// Returns `CatalogueError::DuplicateId` if the id is taken
    pub fn with_proposal(mut self, descriptor: ProposalDescriptor) -> Result<Self, CatalogueError> {
        self.push(descriptor)?;
        Ok(self)
    }

    /// Append a placeholder, builder style
    ///
    /// # Errors
    /// Returns `CatalogueError::DuplicateId` if the id is taken
    pub fn with_placeholder(
        mut self,
        id: impl Into<String>,
        category: ProposalCategory,
    ) -> Result<Self, CatalogueError> {
        self.push_placeholder(id, category)?;
        Ok(self)
    }

    fn insert(&mut self, entry: CatalogueEntry) -> Result<(), CatalogueError> {
        let id = entry.id().to_string();
        if self.entries.contains_key(&id) {
            return Err(CatalogueError::DuplicateId { id });
        }
        self.entries.insert(id, entry);
        Ok(())
    }

    /// Mode
    #[inline]
    #[must_use]
    pub fn mode(&self) -> CatalogueMode {
        self.mode
    }

    /// Number of entries, placeholders included
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

    /// Entry by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CatalogueEntry> {
        self.entries.get(id)
    }

    /// All entries in order
    pub fn entries(&self) -> impl Iterator<Item = &CatalogueEntry> {
        self.entries.values()
    }

    /// Active proposals in order
    pub fn active(&self) -> impl Iterator<Item = &ProposalDescriptor> {
        self.entries.values().filter_map(CatalogueEntry::descriptor)
    }

    /// Placeholder ids in order
    #[must_use]
    pub fn placeholders(&self) -> Vec<&str> {
        self.entries
            .values()
            .filter(|e| e.descriptor().is_none())
            .map(CatalogueEntry::id)
            .collect()
    }

    /// Whether the deploy phase runs for this proposal
    #[inline]
    #[must_use]
    pub fn deploys(&self, descriptor: &ProposalDescriptor) -> bool {
        self.mode == CatalogueMode::Fresh && descriptor.deploy()
    }

    /// Names each proposal needs that will not be available when it runs
    ///
    /// Walks active proposals in order starting from the live names of
    /// `initial`. A proposal always relies on the names it retires; when its
    /// deploy phase is skipped it also relies on its `expected` and
    /// `affected` sets. After each proposal its affected names become
    /// available and its deprecated names are retired.
    #[must_use]
    pub fn check_dependencies(&self, initial: &RegistrySnapshot) -> Vec<DependencyIssue> {
        let mut available: BTreeSet<String> = initial
            .live_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let mut retired: BTreeMap<String, String> = BTreeMap::new();
        let mut issues = Vec::new();

        for descriptor in self.active() {
            let mut needed: BTreeSet<&String> = descriptor.deprecated().iter().collect();
            if !self.deploys(descriptor) {
                needed.extend(descriptor.expected());
                needed.extend(descriptor.affected());
            }

            for name in needed {
                if available.contains(name) {
                    continue;
                }
                let kind = match retired.get(name) {
                    Some(by) => DependencyIssueKind::Deprecated { by: by.clone() },
                    None => DependencyIssueKind::Missing,
                };
                issues.push(DependencyIssue {
                    proposal: descriptor.id().to_string(),
                    name: name.clone(),
                    kind,
                });
            }

            for name in descriptor.affected() {
                available.insert(name.clone());
                retired.remove(name);
            }
            for name in descriptor.deprecated() {
                available.remove(name);
                retired.insert(name.clone(), descriptor.id().to_string());
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use upgrade_registry::{Address, Registry, ResourceHandle, ResourceKind};

    fn initial() -> RegistrySnapshot {
        Registry::from_handles([
            ResourceHandle::new("core", Address::from_low_u64(1), ResourceKind::Core),
            ResourceHandle::new("oldOracle", Address::from_low_u64(2), ResourceKind::Oracle),
        ])
        .snapshot()
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = Catalogue::new(CatalogueMode::Fresh)
            .with_proposal(ProposalDescriptor::builder("p1").build())
            .and_then(|c| c.with_placeholder("p1", ProposalCategory::Dao))
            .unwrap_err();
        assert_eq!(err, CatalogueError::DuplicateId { id: "p1".to_string() });
    }

    #[test]
    fn order_and_placeholders() {
        let catalogue = Catalogue::new(CatalogueMode::Fresh)
            .with_proposal(ProposalDescriptor::builder("b").build())
            .and_then(|c| c.with_placeholder("skip", ProposalCategory::TribalCouncil))
            .and_then(|c| c.with_proposal(ProposalDescriptor::builder("a").build()))
            .unwrap();

        let ids: Vec<&str> = catalogue.active().map(ProposalDescriptor::id).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(catalogue.placeholders(), vec!["skip"]);
        assert_eq!(catalogue.len(), 3);
    }

    #[test]
    fn replay_mode_never_deploys() {
        let descriptor = ProposalDescriptor::builder("p").with_deploy(true).build();
        assert!(Catalogue::new(CatalogueMode::Fresh).deploys(&descriptor));
        assert!(!Catalogue::new(CatalogueMode::Replay).deploys(&descriptor));
    }

    #[test]
    fn dependencies_flow_through_affected_sets() {
        let catalogue = Catalogue::new(CatalogueMode::Fresh)
            .with_proposal(
                ProposalDescriptor::builder("p1")
                    .with_expected(["core"])
                    .with_affected(["newOracle"])
                    .with_deprecated(["oldOracle"])
                    .build(),
            )
            .and_then(|c| {
                c.with_proposal(
                    ProposalDescriptor::builder("p2")
                        .with_deploy(false)
                        .with_expected(["newOracle", "oldOracle", "ghost"])
                        .build(),
                )
            })
            .unwrap();

        assert_eq!(
            catalogue.check_dependencies(&initial()),
            vec![
                DependencyIssue {
                    proposal: "p2".to_string(),
                    name: "ghost".to_string(),
                    kind: DependencyIssueKind::Missing,
                },
                DependencyIssue {
                    proposal: "p2".to_string(),
                    name: "oldOracle".to_string(),
                    kind: DependencyIssueKind::Deprecated { by: "p1".to_string() },
                },
            ]
        );
    }

    #[test]
    fn skipped_deploy_needs_affected_names() {
        let catalogue = Catalogue::new(CatalogueMode::Replay)
            .with_proposal(
                ProposalDescriptor::builder("p1")
                    .with_affected(["core", "newPSM"])
                    .build(),
            )
            .unwrap();

        let issues = catalogue.check_dependencies(&initial());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].name, "newPSM");
        assert_eq!(issues[0].to_string(), "p1 needs newPSM, which no one provides");
    }

    #[test]
    fn re_affected_names_become_available_again() {
        let catalogue = Catalogue::new(CatalogueMode::Fresh)
            .with_proposal(ProposalDescriptor::builder("p1").with_deprecated(["oldOracle"]).build())
            .and_then(|c| {
                c.with_proposal(ProposalDescriptor::builder("p2").with_affected(["oldOracle"]).build())
            })
            .and_then(|c| {
                c.with_proposal(ProposalDescriptor::builder("p3").with_expected(["oldOracle"]).build())
            })
            .unwrap();

        assert!(catalogue.check_dependencies(&initial()).is_empty());
    }
}
