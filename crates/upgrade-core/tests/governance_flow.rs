//! Payloads executed through the simulated timelocks

use serde_json::json;
use upgrade_chain::{ChainState, ProposalCategory, Role};
use upgrade_core::{HarnessError, Orchestrator, Phase, ProposalState};
use upgrade_proposal::{
    Catalogue, CatalogueMode, DeclarativeLifecycle, DeploymentSpec, Invariant, ProposalDescription,
    ProposalDescriptor,
};
use upgrade_registry::ResourceKind;
use upgrade_test_utils::fixtures::{address, sim_environment, DAO_TIMELOCK};

fn minter_deployment() -> DeclarativeLifecycle {
    DeclarativeLifecycle::new(vec![DeploymentSpec {
        name: "daiPSM".to_string(),
        artifact: "PegStabilityModule".to_string(),
        kind: ResourceKind::Peg,
        args: vec![json!({ "core": "{core}", "token": "{fei}" })],
    }])
}

#[tokio::test]
async fn deployed_contract_is_granted_minter() {
    let env = sim_environment(false).await.unwrap();
    let catalogue = Catalogue::new(CatalogueMode::Fresh)
        .with_proposal(
            ProposalDescriptor::builder("fip_101")
                .with_affected(["daiPSM"])
                .with_payload(ProposalDescription::new("FIP-101: add DAI PSM").with_command(
                    "core",
                    "grantRole",
                    vec![json!(Role::MINTER), json!("{daiPSM}")],
                ))
                .with_invariant(Invariant::RoleHeldBy {
                    role: Role::MINTER.to_string(),
                    holders: vec!["feiDAOTimelock".to_string(), "daiPSM".to_string()],
                    exclusive: true,
                })
                .with_invariant(Invariant::StorageEquals {
                    resource: "daiPSM".to_string(),
                    key: "token".to_string(),
                    expected: json!("{fei}"),
                })
                .with_lifecycle(minter_deployment())
                .build(),
        )
        .unwrap();

    let report = Orchestrator::from_environment(&env)
        .run(&catalogue, env.initial_registry())
        .await
        .unwrap();
    let result = &report.results[0];

    assert!(result.passed(), "{}", report.render_text());
    let receipt = result.governance.as_ref().unwrap();
    assert!(receipt.events.iter().any(|e| e.name == "RoleGranted"));

    let psm = report.registry.get("daiPSM").unwrap().address;
    assert!(env.chain().has_role(&Role::minter(), psm).await.unwrap());
}

#[tokio::test]
async fn reverted_payload_fails_governance_and_leaves_state_untouched() {
    let env = sim_environment(false).await.unwrap();
    let catalogue = Catalogue::new(CatalogueMode::Fresh)
        .with_proposal(
            ProposalDescriptor::builder("fip_102")
                .with_category(ProposalCategory::TribalCouncil)
                .with_payload(
                    ProposalDescription::new("FIP-102: mint and pause")
                        .with_command("fei", "pause", vec![])
                        .with_command("fei", "mint", vec![json!("{core}"), json!(100)]),
                )
                .build(),
        )
        .unwrap();

    let report = Orchestrator::from_environment(&env)
        .run(&catalogue, env.initial_registry())
        .await
        .unwrap();
    let result = &report.results[0];

    assert_eq!(result.terminal_state(), ProposalState::Configured);
    assert!(matches!(
        result.failure_in(Phase::Governance).unwrap().error,
        HarnessError::PhaseExecution { phase: Phase::Governance, .. }
    ));
    assert!(result.torn_down());
    assert!(!env.chain().is_paused(address(2)).await.unwrap());
}

#[tokio::test]
async fn unresolvable_payload_target_is_unknown_resource() {
    let env = sim_environment(false).await.unwrap();
    let catalogue = Catalogue::new(CatalogueMode::Fresh)
        .with_proposal(
            ProposalDescriptor::builder("fip_103")
                .with_payload(ProposalDescription::new("FIP-103").with_command(
                    "core",
                    "grantRole",
                    vec![json!(Role::GUARDIAN), json!("{pcvGuardianV2}")],
                ))
                .build(),
        )
        .unwrap();

    let report = Orchestrator::from_environment(&env)
        .run(&catalogue, env.initial_registry())
        .await
        .unwrap();
    let failure = report.results[0].failure_in(Phase::Governance).unwrap();
    assert_eq!(failure.error.to_string(), "unknown resource: pcvGuardianV2");
    assert!(!env
        .chain()
        .has_role(&Role::guardian(), address(DAO_TIMELOCK))
        .await
        .unwrap());
}
