//! Post-condition evaluation
//!
//! Assertions come from three places, evaluated in this order:
//!
//! 1. signoff: every affected name is live, every deprecated name is not
//! 2. the proposal's declared [`Invariant`](upgrade_proposal::Invariant)s
//! 3. the proposal's own `validate` hook
//!
//! All three write into one [`AssertionSet`], so a failed `require` in the
//! hook only gates what the hook records after it.

use crate::error::{HarnessError, Phase};
use crate::guard::guarded;
use tracing::debug;
use upgrade_chain::ChainState;
use upgrade_proposal::{
    AssertionFailure, AssertionSet, DeployOutputs, ProposalDescriptor, ValidateContext,
};
use upgrade_registry::RegistrySnapshot;

/// Outcome of validating one proposal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validation {
    /// Assertions that did not hold
    pub failures: Vec<AssertionFailure>,
    /// Errors that prevented an assertion from being evaluated
    pub errors: Vec<HarnessError>,
    /// Assertions evaluated
    pub evaluated: usize,
    /// Assertions skipped after a failed `require`
    pub skipped: usize,
}

impl Validation {
    /// Check that every assertion held and nothing errored
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty() && self.errors.is_empty()
    }
}

/// Evaluates a proposal's post-conditions against a registry snapshot and
/// read-only live state
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    logging: bool,
}

impl Validator {
    /// Create validator
    #[inline]
    #[must_use]
    pub fn new(logging: bool) -> Self {
        Self { logging }
    }

    /// Validate with full phase context
    pub async fn validate(
        &self,
        descriptor: &ProposalDescriptor,
        ctx: &ValidateContext<'_>,
    ) -> Validation {
        let mut set = AssertionSet::new();
        let mut errors = Vec::new();

        check_signoff(descriptor, ctx.registry, &mut set);

        for invariant in descriptor.invariants() {
            if let Err(e) = invariant.check(ctx.registry, ctx.chain, &mut set).await {
                errors.push(HarnessError::from_phase(Phase::Validate, e));
            }
        }

        if let Err(e) = guarded(
            Phase::Validate,
            descriptor.lifecycle().validate(ctx, &mut set),
        )
        .await
        {
            errors.push(e);
        }

        if self.logging {
            debug!(
                proposal = descriptor.id(),
                evaluated = set.evaluated(),
                skipped = set.skipped(),
                failed = set.failures().len(),
                "validation finished"
            );
        }

        Validation {
            evaluated: set.evaluated(),
            skipped: set.skipped(),
            failures: set.into_failures(),
            errors,
        }
    }

    /// Validate outside a run, against `registry` alone
    ///
    /// Hooks see `registry` as both current and previous state and no deploy
    /// outputs. Evaluation errors are reported as failures named after the
    /// phase.
    pub async fn assertions(
        &self,
        descriptor: &ProposalDescriptor,
        registry: &RegistrySnapshot,
        chain: &dyn ChainState,
    ) -> Vec<AssertionFailure> {
        let outputs = DeployOutputs::new();
        let ctx = ValidateContext {
            registry,
            previous: registry,
            resources: &[],
            outputs: &outputs,
            chain,
        };
        let validation = self.validate(descriptor, &ctx).await;
        let mut failures = validation.failures;
        failures.extend(
            validation
                .errors
                .into_iter()
                .map(|e| AssertionFailure::new(Phase::Validate.as_str(), e.to_string())),
        );
        failures
    }
}

fn check_signoff(descriptor: &ProposalDescriptor, registry: &RegistrySnapshot, set: &mut AssertionSet) {
    for name in descriptor.affected() {
        let lookup = registry.get(name);
        set.check_with(format!("signoff: {name} is live"), lookup.is_ok(), || {
            lookup
                .err()
                .map_or_else(String::new, |e| e.to_string())
        });
    }
    for name in descriptor.deprecated() {
        set.check_with(
            format!("signoff: {name} is deprecated"),
            !registry.is_live(name),
            || format!("{name} is still live"),
        );
    }
}
