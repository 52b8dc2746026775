//! Lifecycle built from closures, recording each hook call

use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use upgrade_proposal::{
    AssertionSet, DeployContext, Deployment, PhaseContext, PhaseError, ProposalLifecycle,
    ValidateContext,
};
use upgrade_registry::ResourceHandle;

type DeployFn = Arc<dyn Fn(&DeployContext<'_>) -> Result<Deployment, PhaseError> + Send + Sync>;
type PhaseFn = Arc<dyn Fn(&PhaseContext<'_>) -> Result<(), PhaseError> + Send + Sync>;
type ValidateFn =
    Arc<dyn Fn(&ValidateContext<'_>, &mut AssertionSet) -> Result<(), PhaseError> + Send + Sync>;

/// Shared, ordered record of hook invocations as `"{id}:{hook}"`
#[derive(Debug, Clone, Default)]
pub struct PhaseLog(Arc<Mutex<Vec<String>>>);

impl PhaseLog {
    /// Create empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    /// All entries in order
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// Check for an entry
    #[must_use]
    pub fn contains(&self, entry: &str) -> bool {
        self.0.lock().iter().any(|e| e == entry)
    }

    /// Hooks called for one proposal, in order
    #[must_use]
    pub fn hooks_of(&self, id: &str) -> Vec<String> {
        let prefix = format!("{id}:");
        self.0
            .lock()
            .iter()
            .filter_map(|e| e.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }
}

/// [`ProposalLifecycle`] whose hooks are closures
///
/// Every hook call is recorded in the [`PhaseLog`] before its closure runs;
/// hooks without a closure succeed and do nothing else.
#[derive(Clone)]
pub struct ScriptedLifecycle {
    id: String,
    log: PhaseLog,
    deploy: Option<DeployFn>,
    setup: Option<PhaseFn>,
    validate: Option<ValidateFn>,
    teardown: Option<PhaseFn>,
}

impl ScriptedLifecycle {
    /// Create lifecycle for proposal `id`
    #[must_use]
    pub fn new(id: impl Into<String>, log: &PhaseLog) -> Self {
        Self {
            id: id.into(),
            log: log.clone(),
            deploy: None,
            setup: None,
            validate: None,
            teardown: None,
        }
    }

    /// Script the deploy hook
    #[must_use]
    pub fn on_deploy(
        mut self,
        hook: impl Fn(&DeployContext<'_>) -> Result<Deployment, PhaseError> + Send + Sync + 'static,
    ) -> Self {
        self.deploy = Some(Arc::new(hook));
        self
    }

    /// Deploy exactly these handles
    #[must_use]
    pub fn deploying(self, handles: impl IntoIterator<Item = ResourceHandle>) -> Self {
        let handles: Vec<ResourceHandle> = handles.into_iter().collect();
        self.on_deploy(move |_| {
            Ok(handles
                .iter()
                .cloned()
                .fold(Deployment::new(), Deployment::with_resource))
        })
    }

    /// Script the setup hook
    #[must_use]
    pub fn on_setup(
        mut self,
        hook: impl Fn(&PhaseContext<'_>) -> Result<(), PhaseError> + Send + Sync + 'static,
    ) -> Self {
        self.setup = Some(Arc::new(hook));
        self
    }

    /// Script the validate hook
    #[must_use]
    pub fn on_validate(
        mut self,
        hook: impl Fn(&ValidateContext<'_>, &mut AssertionSet) -> Result<(), PhaseError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.validate = Some(Arc::new(hook));
        self
    }

    /// Script the teardown hook
    #[must_use]
    pub fn on_teardown(
        mut self,
        hook: impl Fn(&PhaseContext<'_>) -> Result<(), PhaseError> + Send + Sync + 'static,
    ) -> Self {
        self.teardown = Some(Arc::new(hook));
        self
    }

    fn mark(&self, hook: &str) {
        self.log.push(format!("{}:{hook}", self.id));
    }
}

impl fmt::Debug for ScriptedLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedLifecycle")
            .field("id", &self.id)
            .field("deploy", &self.deploy.is_some())
            .field("setup", &self.setup.is_some())
            .field("validate", &self.validate.is_some())
            .field("teardown", &self.teardown.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ProposalLifecycle for ScriptedLifecycle {
    async fn deploy(&self, ctx: &DeployContext<'_>) -> Result<Deployment, PhaseError> {
        self.mark("deploy");
        self.deploy
            .as_ref()
            .map_or_else(|| Ok(Deployment::new()), |hook| hook(ctx))
    }

    async fn setup(&self, ctx: &PhaseContext<'_>) -> Result<(), PhaseError> {
        self.mark("setup");
        self.setup.as_ref().map_or(Ok(()), |hook| hook(ctx))
    }

    async fn validate(
        &self,
        ctx: &ValidateContext<'_>,
        assertions: &mut AssertionSet,
    ) -> Result<(), PhaseError> {
        self.mark("validate");
        self.validate
            .as_ref()
            .map_or(Ok(()), |hook| hook(ctx, assertions))
    }

    async fn teardown(&self, ctx: &PhaseContext<'_>) -> Result<(), PhaseError> {
        self.mark("teardown");
        self.teardown.as_ref().map_or(Ok(()), |hook| hook(ctx))
    }
}
