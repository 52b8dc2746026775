//! Immutable proposal descriptors

use crate::invariant::Invariant;
use crate::lifecycle::{NoopLifecycle, ProposalLifecycle};
use crate::payload::ProposalDescription;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use upgrade_chain::{Amount, ProposalCategory};

/// One upgrade unit
///
/// Built once through [`ProposalBuilder`] and never mutated afterwards.
#[derive(Clone)]
pub struct ProposalDescriptor {
    id: String,
    category: ProposalCategory,
    deploy: bool,
    total_value: Amount,
    existing_proposal_id: Option<String>,
    affected: BTreeSet<String>,
    deprecated: BTreeSet<String>,
    expected: BTreeSet<String>,
    invariants: Vec<Invariant>,
    payload: Option<ProposalDescription>,
    lifecycle: Arc<dyn ProposalLifecycle>,
}

impl ProposalDescriptor {
    /// Start building a descriptor
    #[inline]
    #[must_use]
    pub fn builder(id: impl Into<String>) -> ProposalBuilder {
        ProposalBuilder::new(id)
    }

    /// Proposal id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Governance track
    #[inline]
    #[must_use]
    pub fn category(&self) -> ProposalCategory {
        self.category
    }

    /// Whether the deploy phase should run in a fresh catalogue
    #[inline]
    #[must_use]
    pub fn deploy(&self) -> bool {
        self.deploy
    }

    /// Native currency the governance executor must hold
    #[inline]
    #[must_use]
    pub fn total_value(&self) -> Amount {
        self.total_value
    }

    /// Already-submitted on-chain proposal id
    #[inline]
    #[must_use]
    pub fn existing_proposal_id(&self) -> Option<&str> {
        self.existing_proposal_id.as_deref()
    }

    /// Names the proposal writes
    #[inline]
    #[must_use]
    pub fn affected(&self) -> &BTreeSet<String> {
        &self.affected
    }

    /// Names the proposal retires
    #[inline]
    #[must_use]
    pub fn deprecated(&self) -> &BTreeSet<String> {
        &self.deprecated
    }

    /// Names resolved from state when deploy is skipped
    #[inline]
    #[must_use]
    pub fn expected(&self) -> &BTreeSet<String> {
        &self.expected
    }

    /// Declared post-conditions
    #[inline]
    #[must_use]
    pub fn invariants(&self) -> &[Invariant] {
        &self.invariants
    }

    /// Governance payload
    #[inline]
    #[must_use]
    pub fn payload(&self) -> Option<&ProposalDescription> {
        self.payload.as_ref()
    }

    /// Lifecycle hooks
    #[inline]
    #[must_use]
    pub fn lifecycle(&self) -> &Arc<dyn ProposalLifecycle> {
        &self.lifecycle
    }

    /// Whether the governance step applies
    #[must_use]
    pub fn has_governance(&self) -> bool {
        self.category.has_governance() && self.payload.is_some()
    }
}

impl fmt::Debug for ProposalDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProposalDescriptor")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("deploy", &self.deploy)
            .field("total_value", &self.total_value)
            .field("affected", &self.affected)
            .field("deprecated", &self.deprecated)
            .field("expected", &self.expected)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ProposalDescriptor`]
#[must_use]
pub struct ProposalBuilder {
    inner: ProposalDescriptor,
}

impl ProposalBuilder {
    fn new(id: impl Into<String>) -> Self {
        Self {
            inner: ProposalDescriptor {
                id: id.into(),
                category: ProposalCategory::Dao,
                deploy: true,
                total_value: 0,
                existing_proposal_id: None,
                affected: BTreeSet::new(),
                deprecated: BTreeSet::new(),
                expected: BTreeSet::new(),
                invariants: Vec::new(),
                payload: None,
                lifecycle: Arc::new(NoopLifecycle),
            },
        }
    }

    /// With governance track
    #[inline]
    pub fn with_category(mut self, category: ProposalCategory) -> Self {
        self.inner.category = category;
        self
    }

    /// With deploy flag
    #[inline]
    pub fn with_deploy(mut self, deploy: bool) -> Self {
        self.inner.deploy = deploy;
        self
    }

    /// With total value
    #[inline]
    pub fn with_total_value(mut self, value: Amount) -> Self {
        self.inner.total_value = value;
        self
    }

    /// With already-submitted proposal id
    #[inline]
    pub fn with_existing_proposal_id(mut self, id: impl Into<String>) -> Self {
        self.inner.existing_proposal_id = Some(id.into());
        self
    }

    /// With affected names
    pub fn with_affected<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.affected.extend(names.into_iter().map(Into::into));
        self
    }

    /// With deprecated names
    pub fn with_deprecated<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.deprecated.extend(names.into_iter().map(Into::into));
        self
    }

    /// With names expected to exist when deploy is skipped
    pub fn with_expected<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.expected.extend(names.into_iter().map(Into::into));
        self
    }

    /// With a declared invariant
    #[inline]
    pub fn with_invariant(mut self, invariant: Invariant) -> Self {
        self.inner.invariants.push(invariant);
        self
    }

    /// With governance payload
    #[inline]
    pub fn with_payload(mut self, payload: ProposalDescription) -> Self {
        self.inner.payload = Some(payload);
        self
    }

    /// With lifecycle hooks
    #[inline]
    pub fn with_lifecycle(mut self, lifecycle: impl ProposalLifecycle + 'static) -> Self {
        self.inner.lifecycle = Arc::new(lifecycle);
        self
    }

    /// With shared lifecycle hooks
    #[inline]
    pub fn with_shared_lifecycle(mut self, lifecycle: Arc<dyn ProposalLifecycle>) -> Self {
        self.inner.lifecycle = lifecycle;
        self
    }

    /// Finish
    #[inline]
    #[must_use]
    pub fn build(self) -> ProposalDescriptor {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let descriptor = ProposalDescriptor::builder("fip_1").build();
        assert_eq!(descriptor.id(), "fip_1");
        assert_eq!(descriptor.category(), ProposalCategory::Dao);
        assert!(descriptor.deploy());
        assert!(descriptor.affected().is_empty());
        assert!(!descriptor.has_governance());
    }

    #[test]
    fn governance_needs_payload_and_track() {
        let with_payload = ProposalDescriptor::builder("a")
            .with_payload(ProposalDescription::new("A"))
            .build();
        let no_track = ProposalDescriptor::builder("b")
            .with_category(ProposalCategory::None)
            .with_payload(ProposalDescription::new("B"))
            .build();

        assert!(with_payload.has_governance());
        assert!(!no_track.has_governance());
    }

    #[test]
    fn name_sets_are_deduplicated() {
        let descriptor = ProposalDescriptor::builder("x")
            .with_affected(["core", "fei", "core"])
            .with_deprecated(vec!["oldOracle".to_string()])
            .build();
        assert_eq!(descriptor.affected().len(), 2);
        assert!(descriptor.deprecated().contains("oldOracle"));
    }
}
