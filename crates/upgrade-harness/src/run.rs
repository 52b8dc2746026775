//! Loading a configured run and executing it

use crate::config::HarnessConfig;
use crate::files;
use tracing::{debug, info};
use upgrade_chain::sim::Genesis;
use upgrade_core::{HarnessError, Orchestrator, OrchestratorConfig, RunReport};
use upgrade_env::{AddressBook, Environment, EnvironmentLoader};
use upgrade_proposal::{Catalogue, CatalogueFile, DependencyIssue, HookBook};

/// Environment and catalogue ready to run
#[derive(Debug)]
pub struct Prepared {
    environment: Environment,
    catalogue: Catalogue,
    orchestrator: OrchestratorConfig,
}

/// Load every file a config names and bootstrap the environment
///
/// Hooks in `hooks` override declared deployments for the same proposal id.
///
/// # Errors
/// Returns a configuration error if any file is unreadable or malformed,
/// or if the environment fails validation
pub async fn prepare(config: &HarnessConfig, hooks: &HookBook) -> Result<Prepared, HarnessError> {
    let book = AddressBook::load(&config.address_book).await?;
    debug!(path = %config.address_book.display(), entries = book.len(), "address book read");

    let genesis = match &config.genesis {
        Some(path) => files::read_structured::<Genesis>(path).await?,
        None => Genesis::default(),
    };

    let file: CatalogueFile = files::read_structured(&config.catalogue).await?;
    let catalogue = file
        .into_catalogue(hooks, config.mode)
        .map_err(|e| HarnessError::configuration(e.to_string()))?;

    let loader = EnvironmentLoader::simulated(config.environment_config(), book, &genesis);
    let environment = loader.load().await?.clone();

    if config.logging {
        info!(
            proposals = catalogue.len(),
            placeholders = catalogue.placeholders().len(),
            mode = ?catalogue.mode(),
            "catalogue loaded"
        );
    }

    Ok(Prepared {
        environment,
        catalogue,
        orchestrator: config.orchestrator_config(),
    })
}

impl Prepared {
    /// Loaded environment
    #[inline]
    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Loaded catalogue
    #[inline]
    #[must_use]
    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Names a proposal needs that nothing before it provides
    #[must_use]
    pub fn check(&self) -> Vec<DependencyIssue> {
        self.catalogue
            .check_dependencies(self.environment.baseline())
    }

    /// Run the catalogue against a fresh registry
    ///
    /// # Errors
    /// Returns a configuration error raised before any proposal starts
    pub async fn run(&self) -> Result<RunReport, HarnessError> {
        Orchestrator::from_environment(&self.environment)
            .with_config(self.orchestrator.clone())
            .run(&self.catalogue, self.environment.initial_registry())
            .await
    }
}
