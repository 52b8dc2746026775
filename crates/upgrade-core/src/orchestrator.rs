//! Run driver
//!
//! Applies a catalogue strictly in order. Each proposal is driven through
//! its lifecycle and every error short of a configuration error is caught
//! at the proposal boundary, so one failing proposal never stops the next.

use crate::error::{HarnessError, Phase};
use crate::guard::guarded;
use crate::report::RunReport;
use crate::result::ProposalResult;
use crate::state::ProposalState;
use crate::validator::Validator;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use ulid::Ulid;
use upgrade_chain::{ChainClient, GovernanceAction, GovernanceExecutor, GovernanceReceipt};
use upgrade_env::{Environment, EnvironmentConfig};
use upgrade_proposal::{
    Catalogue, DeployContext, DeployOutputs, PhaseContext, PhaseError, ProposalDescriptor,
    ValidateContext,
};
use upgrade_registry::{
    Address, Overwrite, Registry, RegistryError, RegistrySnapshot, ResourceHandle,
};

/// Orchestrator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Emit informational diagnostics; never changes results
    pub logging: bool,
    /// Identity handed to deploy and setup hooks
    pub deployer: Address,
    /// Execute proposal payloads through the governance executor
    pub execute_governance: bool,
    /// Treat catalogue dependency issues as configuration errors
    pub strict_dependencies: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            logging: false,
            deployer: Address::ZERO,
            execute_governance: true,
            strict_dependencies: true,
        }
    }
}

impl OrchestratorConfig {
    /// Create config for a deployer
    #[must_use]
    pub fn new(deployer: Address) -> Self {
        Self {
            deployer,
            ..Self::default()
        }
    }

    /// Set logging
    #[inline]
    #[must_use]
    pub fn with_logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }

    /// Set governance execution
    #[inline]
    #[must_use]
    pub fn with_execute_governance(mut self, execute: bool) -> Self {
        self.execute_governance = execute;
        self
    }

    /// Set dependency strictness
    #[inline]
    #[must_use]
    pub fn with_strict_dependencies(mut self, strict: bool) -> Self {
        self.strict_dependencies = strict;
        self
    }
}

impl From<&EnvironmentConfig> for OrchestratorConfig {
    fn from(config: &EnvironmentConfig) -> Self {
        Self::new(config.deployer).with_logging(config.logging)
    }
}

/// Drives a catalogue through the proposal lifecycle
pub struct Orchestrator {
    config: OrchestratorConfig,
    chain: Arc<dyn ChainClient>,
    governance: Arc<dyn GovernanceExecutor>,
    validator: Validator,
}

impl Orchestrator {
    /// Create orchestrator
    #[must_use]
    pub fn new(
        config: OrchestratorConfig,
        chain: Arc<dyn ChainClient>,
        governance: Arc<dyn GovernanceExecutor>,
    ) -> Self {
        Self {
            validator: Validator::new(config.logging),
            config,
            chain,
            governance,
        }
    }

    /// Create orchestrator over a loaded environment
    #[must_use]
    pub fn from_environment(env: &Environment) -> Self {
        Self::new(
            OrchestratorConfig::from(env.config()),
            Arc::clone(env.chain()),
            Arc::clone(env.governance()),
        )
    }

    /// Replace the configuration
    #[must_use]
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.validator = Validator::new(config.logging);
        self.config = config;
        self
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Apply every active proposal of `catalogue` in order, starting from
    /// `initial`
    ///
    /// Placeholders are skipped and absent from the results.
    ///
    /// # Errors
    /// - `HarnessError::Configuration` if no deployer is configured
    /// - `HarnessError::Dependencies` if strict dependency checking finds
    ///   names that will not exist when needed
    ///
    /// Both are raised before any phase runs. Every other error is recorded
    /// on the proposal that raised it.
    pub async fn run(&self, catalogue: &Catalogue, initial: Registry) -> Result<RunReport, HarnessError> {
        if self.config.deployer.is_zero() {
            return Err(HarnessError::configuration("deployer address is not set"));
        }

        let issues = catalogue.check_dependencies(&initial.snapshot());
        if !issues.is_empty() {
            if self.config.strict_dependencies {
                return Err(HarnessError::Dependencies(issues));
            }
            for issue in &issues {
                warn!(proposal = %issue.proposal, resource = %issue.name, "{issue}");
            }
        }

        let run_id = Ulid::new();
        let started_at = Utc::now();
        let skipped: Vec<String> = catalogue
            .placeholders()
            .into_iter()
            .map(str::to_string)
            .collect();
        if self.config.logging {
            info!(
                %run_id,
                proposals = catalogue.len() - skipped.len(),
                placeholders = skipped.len(),
                mode = ?catalogue.mode(),
                "run started"
            );
        }

        let mut registry = initial;
        let mut results = Vec::new();
        for descriptor in catalogue.active() {
            let span = info_span!("proposal", id = descriptor.id(), category = %descriptor.category());
            let deploys = catalogue.deploys(descriptor);
            let result = self
                .run_proposal(descriptor, deploys, &mut registry)
                .instrument(span)
                .await;
            results.push(result);
        }

        let report = RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            registry,
            results,
            skipped,
        };
        if self.config.logging {
            info!(
                %run_id,
                failed = report.failure_count(),
                safe_to_ship = report.is_safe_to_ship(),
                "run finished"
            );
        }
        Ok(report)
    }

    async fn run_proposal(
        &self,
        descriptor: &ProposalDescriptor,
        deploys: bool,
        registry: &mut Registry,
    ) -> ProposalResult {
        let started = Instant::now();
        let logging = self.config.logging;
        let mut result = ProposalResult::new(descriptor.id(), descriptor.category());
        let previous = registry.snapshot();
        let mut outputs = DeployOutputs::new();

        // PENDING -> DEPLOYED
        let staged = if deploys {
            result.deploy_invoked = true;
            let ctx = DeployContext {
                deployer: self.config.deployer,
                registry: &previous,
                chain: self.chain.as_ref(),
                logging,
            };
            guarded(Phase::Deploy, descriptor.lifecycle().deploy(&ctx))
                .await
                .map(|deployment| (deployment.resources, deployment.outputs))
                .map_err(|e| (Phase::Deploy, e))
        } else {
            resolve_expected(descriptor, &previous)
                .map(|resources| (resources, DeployOutputs::new()))
                .map_err(|e| (Phase::Resolve, HarnessError::from(e)))
        };

        let staged = staged.and_then(|(resources, deploy_outputs)| {
            let phase = if deploys { Phase::Deploy } else { Phase::Resolve };
            self.supersessions(phase, descriptor, &resources, &previous)
                .map(|superseded| (resources, deploy_outputs, superseded))
                .map_err(|e| (phase, e))
        });

        match staged {
            Ok((resources, deploy_outputs, superseded)) => {
                let merged = registry.merge(Registry::from_handles(resources.iter().cloned()));
                if logging {
                    info!(
                        deployed = deploys,
                        resources = resources.len(),
                        inserted = merged.inserted.len(),
                        superseded = merged.superseded.len(),
                        "resources merged"
                    );
                }
                result.resources = resources;
                result.superseded = superseded;
                outputs = deploy_outputs;
                self.advance(&mut result, Phase::Deploy, ProposalState::Deployed);
            }
            Err((phase, error)) => self.fail(&mut result, phase, error),
        }

        // DEPLOYED -> CONFIGURED
        if result.state() == ProposalState::Deployed {
            let current = registry.snapshot();
            let ctx = self.phase_context(&current, &previous, &result.resources, &outputs);
            match guarded(Phase::Setup, descriptor.lifecycle().setup(&ctx)).await {
                Ok(()) => self.advance(&mut result, Phase::Setup, ProposalState::Configured),
                Err(e) => self.fail(&mut result, Phase::Setup, e),
            }
        }

        // CONFIGURED -> VALIDATED
        if result.state() == ProposalState::Configured {
            let governed = match self.execute_governance(descriptor, registry).await {
                Ok(receipt) => {
                    result.governance = receipt;
                    self.apply_deprecations(descriptor, registry)
                }
                Err(e) => Err(e),
            };

            match governed {
                Ok(()) => {
                    let current = registry.snapshot();
                    let ctx = ValidateContext {
                        registry: &current,
                        previous: &previous,
                        resources: &result.resources,
                        outputs: &outputs,
                        chain: self.chain.as_state(),
                    };
                    let validation = self.validator.validate(descriptor, &ctx).await;
                    let passed = validation.passed();
                    for failure in &validation.failures {
                        warn!(assertion = %failure.name, detail = %failure.detail, "assertion failed");
                    }
                    result.assertion_failures = validation.failures;
                    for error in validation.errors {
                        self.fail(&mut result, Phase::Validate, error);
                    }
                    if passed {
                        self.advance(&mut result, Phase::Validate, ProposalState::Validated);
                    }
                }
                Err(e) => self.fail(&mut result, Phase::Governance, e),
            }
        }

        // -> TORN_DOWN, whatever happened above
        let current = registry.snapshot();
        let ctx = self.phase_context(&current, &previous, &result.resources, &outputs);
        match guarded(Phase::Teardown, descriptor.lifecycle().teardown(&ctx)).await {
            Ok(()) => self.advance(&mut result, Phase::Teardown, ProposalState::TornDown),
            Err(e) => self.fail(&mut result, Phase::Teardown, e),
        }

        result.elapsed = started.elapsed();
        if logging {
            info!(
                state = %result.terminal_state(),
                passed = result.passed(),
                elapsed_ms = result.elapsed.as_millis(),
                "proposal finished"
            );
        }
        result
    }

    async fn execute_governance(
        &self,
        descriptor: &ProposalDescriptor,
        registry: &Registry,
    ) -> Result<Option<GovernanceReceipt>, HarnessError> {
        let Some(payload) = descriptor.payload() else {
            return Ok(None);
        };
        if !self.config.execute_governance || !descriptor.has_governance() {
            if self.config.logging {
                debug!("governance execution skipped");
            }
            return Ok(None);
        }

        let action = GovernanceAction {
            proposal_id: descriptor.id().to_string(),
            category: descriptor.category(),
            existing_proposal_id: descriptor.existing_proposal_id().map(str::to_string),
            total_value: descriptor.total_value(),
            calls: payload.resolve(&registry.snapshot())?,
        };
        let receipt = guarded(Phase::Governance, async {
            self.governance
                .execute(&action)
                .await
                .map_err(PhaseError::from)
        })
        .await?;

        if self.config.logging {
            info!(
                title = %payload.title,
                calls = action.calls.len(),
                events = receipt.events.len(),
                "governance executed"
            );
        }
        Ok(Some(receipt))
    }

    /// Live entries a proposal's resources replace, checked before the merge
    ///
    /// A name returned twice, or a live name moved to a new address without
    /// being declared affected, fails the phase and nothing is merged.
    fn supersessions(
        &self,
        phase: Phase,
        descriptor: &ProposalDescriptor,
        resources: &[ResourceHandle],
        current: &RegistrySnapshot,
    ) -> Result<Vec<Overwrite>, HarnessError> {
        let mut seen = BTreeSet::new();
        let mut superseded = Vec::new();
        let mut undeclared = Vec::new();
        for handle in resources {
            if !seen.insert(handle.name.as_str()) {
                return Err(HarnessError::PhaseExecution {
                    phase,
                    message: format!("{} returned more than once", handle.name),
                });
            }
            let Ok(live) = current.get(&handle.name) else {
                continue;
            };
            if live.address == handle.address {
                continue;
            }
            let overwrite = Overwrite {
                name: handle.name.clone(),
                previous: live.address,
                replacement: handle.address,
            };
            if descriptor.affected().contains(handle.name.as_str()) {
                if self.config.logging {
                    info!(
                        resource = %overwrite.name,
                        previous = %overwrite.previous,
                        replacement = %overwrite.replacement,
                        "resource superseded"
                    );
                }
                superseded.push(overwrite);
            } else {
                warn!(
                    resource = %overwrite.name,
                    previous = %overwrite.previous,
                    replacement = %overwrite.replacement,
                    "undeclared overwrite"
                );
                undeclared.push(overwrite);
            }
        }

        if undeclared.is_empty() {
            return Ok(superseded);
        }
        let names: Vec<String> = undeclared
            .iter()
            .map(|o| format!("{} ({} -> {})", o.name, o.previous, o.replacement))
            .collect();
        Err(HarnessError::PhaseExecution {
            phase,
            message: format!("overwrites undeclared resources: {}", names.join(", ")),
        })
    }

    /// Retire every deprecated name, or none of them
    fn apply_deprecations(
        &self,
        descriptor: &ProposalDescriptor,
        registry: &mut Registry,
    ) -> Result<(), HarnessError> {
        for name in descriptor.deprecated() {
            registry.get_any(name)?;
        }
        for name in descriptor.deprecated() {
            let retired = registry.deprecate(name)?;
            if self.config.logging {
                info!(resource = %name, address = %retired.address, "resource deprecated");
            }
        }
        Ok(())
    }

    fn phase_context<'a>(
        &'a self,
        current: &'a RegistrySnapshot,
        previous: &'a RegistrySnapshot,
        resources: &'a [ResourceHandle],
        outputs: &'a DeployOutputs,
    ) -> PhaseContext<'a> {
        PhaseContext {
            deployer: self.config.deployer,
            registry: current,
            previous,
            resources,
            outputs,
            chain: self.chain.as_ref(),
            logging: self.config.logging,
        }
    }

    fn advance(&self, result: &mut ProposalResult, phase: Phase, to: ProposalState) {
        match result.enter(to) {
            Ok(()) => {
                if self.config.logging {
                    debug!(state = %to, "state entered");
                }
            }
            Err(e) => result.record(phase, e.into()),
        }
    }

    fn fail(&self, result: &mut ProposalResult, phase: Phase, error: HarnessError) {
        warn!(%phase, error = %error, "phase failed");
        result.record(phase, error);
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Look up the names a proposal expects to already exist
fn resolve_expected(
    descriptor: &ProposalDescriptor,
    registry: &RegistrySnapshot,
) -> Result<Vec<ResourceHandle>, RegistryError> {
    descriptor
        .expected()
        .iter()
        .map(|name| registry.get(name).cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use upgrade_chain::sim::SimulatedChain;
    use upgrade_chain::ChainError;
    use upgrade_proposal::{CatalogueMode, Deployment, ProposalDescription, ProposalLifecycle};
    use upgrade_registry::ResourceKind;

    mockall::mock! {
        Governance {}

        #[async_trait]
        impl GovernanceExecutor for Governance {
            async fn execute(&self, action: &GovernanceAction) -> Result<GovernanceReceipt, ChainError>;
        }
    }

    struct DeploysOracle;

    #[async_trait]
    impl ProposalLifecycle for DeploysOracle {
        async fn deploy(&self, _ctx: &DeployContext<'_>) -> Result<Deployment, PhaseError> {
            Ok(Deployment::new()
                .with_resource(ResourceHandle::new(
                    "oracleA",
                    Address::from_low_u64(0xa),
                    ResourceKind::Oracle,
                ))
                .with_output("poolId", 7))
        }

        async fn setup(&self, ctx: &PhaseContext<'_>) -> Result<(), PhaseError> {
            let pool: u64 = ctx.outputs.get("poolId")?;
            if pool == 7 {
                Ok(())
            } else {
                Err(PhaseError::failed("pool id lost"))
            }
        }
    }

    fn deployer() -> Address {
        Address::from_low_u64(0xd)
    }

    fn initial() -> Registry {
        Registry::from_handles([ResourceHandle::new(
            "core",
            Address::from_low_u64(1),
            ResourceKind::Core,
        )])
    }

    fn orchestrator(governance: MockGovernance) -> Orchestrator {
        Orchestrator::new(
            OrchestratorConfig::new(deployer()),
            Arc::new(SimulatedChain::new()),
            Arc::new(governance),
        )
    }

    #[tokio::test]
    async fn governance_receives_resolved_payload() {
        let mut governance = MockGovernance::new();
        governance
            .expect_execute()
            .withf(|action| {
                action.proposal_id == "p1"
                    && action.total_value == 5
                    && action.calls.len() == 1
                    && action.calls[0].target == Address::from_low_u64(1)
                    && action.calls[0].arguments
                        == vec![serde_json::json!(Address::from_low_u64(0xa).to_string())]
            })
            .times(1)
            .returning(|_| Ok(GovernanceReceipt::default()));

        let catalogue = Catalogue::new(CatalogueMode::Fresh)
            .with_proposal(
                ProposalDescriptor::builder("p1")
                    .with_total_value(5)
                    .with_affected(["oracleA"])
                    .with_payload(ProposalDescription::new("wire oracle").with_command(
                        "core",
                        "setOracle",
                        vec![serde_json::json!("{oracleA}")],
                    ))
                    .with_lifecycle(DeploysOracle)
                    .build(),
            )
            .unwrap();

        let report = orchestrator(governance).run(&catalogue, initial()).await.unwrap();
        let result = &report.results[0];
        assert!(result.passed(), "{:?}", result.failures);
        assert!(result.governance.is_some());
        assert_eq!(
            result.trail,
            vec![
                ProposalState::Pending,
                ProposalState::Deployed,
                ProposalState::Configured,
                ProposalState::Validated,
                ProposalState::TornDown,
            ]
        );
    }

    #[tokio::test]
    async fn governance_revert_skips_validation_but_not_teardown() {
        let mut governance = MockGovernance::new();
        governance
            .expect_execute()
            .returning(|_| Err(ChainError::reverted("Timelock: insufficient delay")));

        let catalogue = Catalogue::new(CatalogueMode::Fresh)
            .with_proposal(
                ProposalDescriptor::builder("p1")
                    .with_deprecated(["core"])
                    .with_payload(
                        ProposalDescription::new("noop")
                            .with_command("core", "pause", vec![]),
                    )
                    .build(),
            )
            .unwrap();

        let report = orchestrator(governance).run(&catalogue, initial()).await.unwrap();
        let result = &report.results[0];
        assert_eq!(result.terminal_state(), ProposalState::Configured);
        assert!(result.torn_down());
        let failure = result.failure_in(Phase::Governance).unwrap();
        assert_eq!(
            failure.error.to_string(),
            "governance failed: chain: reverted: Timelock: insufficient delay"
        );
        // deprecations only follow a successful execution
        assert!(report.registry.is_live("core"));
    }

    #[tokio::test]
    async fn category_none_never_reaches_governance() {
        let mut governance = MockGovernance::new();
        governance.expect_execute().never();

        let catalogue = Catalogue::new(CatalogueMode::Fresh)
            .with_proposal(
                ProposalDescriptor::builder("p1")
                    .with_category(upgrade_chain::ProposalCategory::None)
                    .with_payload(
                        ProposalDescription::new("offline")
                            .with_command("core", "pause", vec![]),
                    )
                    .build(),
            )
            .unwrap();

        let report = orchestrator(governance).run(&catalogue, initial()).await.unwrap();
        assert!(report.results[0].passed());
        assert!(report.results[0].governance.is_none());
    }

    #[tokio::test]
    async fn zero_deployer_is_a_configuration_error() {
        let orchestrator = Orchestrator::new(
            OrchestratorConfig::default(),
            Arc::new(SimulatedChain::new()),
            Arc::new(MockGovernance::new()),
        );
        let err = orchestrator
            .run(&Catalogue::default(), initial())
            .await
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn config_defaults() {
        let config: OrchestratorConfig = serde_json::from_str(r#"{ "logging": true }"#).unwrap();
        assert!(config.logging);
        assert!(config.execute_governance);
        assert!(config.strict_dependencies);
        assert!(config.deployer.is_zero());
    }
}
