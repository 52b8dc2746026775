//! Lifecycle built from declared deployments

use crate::context::DeployContext;
use crate::error::PhaseError;
use crate::lifecycle::ProposalLifecycle;
use crate::outputs::Deployment;
use crate::template;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use upgrade_registry::{Registry, ResourceHandle, ResourceKind};

/// One contract to deploy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSpec {
    /// Registry name of the new resource
    pub name: String,
    /// Artifact to deploy
    pub artifact: String,
    /// Resource kind
    #[serde(default)]
    pub kind: ResourceKind,
    /// Constructor arguments; `{name}` resolves to addresses, including
    /// names deployed earlier in the same list
    #[serde(default)]
    pub args: Vec<Value>,
}

/// Deploys a fixed list of contracts; other phases do nothing
#[derive(Debug, Clone, Default)]
pub struct DeclarativeLifecycle {
    deployments: Vec<DeploymentSpec>,
}

impl DeclarativeLifecycle {
    /// Create from specs
    #[inline]
    #[must_use]
    pub fn new(deployments: Vec<DeploymentSpec>) -> Self {
        Self { deployments }
    }

    /// Declared deployments
    #[inline]
    #[must_use]
    pub fn deployments(&self) -> &[DeploymentSpec] {
        &self.deployments
    }
}

#[async_trait]
impl ProposalLifecycle for DeclarativeLifecycle {
    async fn deploy(&self, ctx: &DeployContext<'_>) -> Result<Deployment, PhaseError> {
        let mut scope = Registry::from(ctx.registry.clone());
        let mut deployment = Deployment::new();

        for spec in &self.deployments {
            let view = scope.snapshot();
            let args = spec
                .args
                .iter()
                .map(|arg| template::resolve(arg, &view))
                .collect::<Result<Vec<_>, _>>()?;
            let address = ctx.chain.deploy(ctx.deployer, &spec.artifact, &args).await?;
            if ctx.logging {
                info!(name = %spec.name, artifact = %spec.artifact, %address, "deployed");
            }

            let handle = ResourceHandle::new(spec.name.clone(), address, spec.kind)
                .with_artifact(spec.artifact.clone());
            scope.put(spec.name.clone(), handle.clone());
            deployment.resources.push(handle);
        }

        Ok(deployment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use upgrade_chain::sim::SimulatedChain;
    use upgrade_chain::ChainState;
    use upgrade_registry::Address;

    #[tokio::test]
    async fn later_specs_see_earlier_deployments() {
        let chain = SimulatedChain::new();
        let registry = Registry::from_handles([ResourceHandle::new(
            "core",
            Address::from_low_u64(1),
            ResourceKind::Core,
        )])
        .snapshot();

        let lifecycle = DeclarativeLifecycle::new(vec![
            DeploymentSpec {
                name: "feiOracle".to_string(),
                artifact: "ConstantOracle".to_string(),
                kind: ResourceKind::Oracle,
                args: vec![json!("{core}")],
            },
            DeploymentSpec {
                name: "feiPSM".to_string(),
                artifact: "PegStabilityModule".to_string(),
                kind: ResourceKind::Peg,
                args: vec![json!({ "core": "{core}", "oracle": "{feiOracle}" })],
            },
        ]);

        let ctx = DeployContext {
            deployer: Address::from_low_u64(42),
            registry: &registry,
            chain: &chain,
            logging: false,
        };
        let deployment = lifecycle.deploy(&ctx).await.unwrap();

        assert_eq!(deployment.resources.len(), 2);
        let oracle = deployment.resources[0].address;
        let psm = deployment.resources[1].address;
        assert_eq!(
            chain.storage(psm, "oracle").await.unwrap(),
            Some(json!(oracle.to_string()))
        );
        assert_eq!(deployment.resources[1].artifact.as_deref(), Some("PegStabilityModule"));
        // the caller's registry is untouched
        assert!(registry.get("feiOracle").is_err());
    }
}
