//! Addresses, handles and a small simulated environment

use serde_json::json;
use upgrade_chain::sim::{Genesis, GenesisContract};
use upgrade_chain::{ProposalCategory, Role};
use upgrade_env::{AddressBook, EnvError, Environment, EnvironmentConfig, EnvironmentLoader};
use upgrade_registry::{Address, Registry, ResourceHandle, ResourceKind};

/// Address `0x…n`
#[must_use]
pub fn address(n: u64) -> Address {
    Address::from_low_u64(n)
}

/// Deployer identity used across fixtures
#[must_use]
pub fn deployer() -> Address {
    address(0xde)
}

/// External resource at `0x…n`
#[must_use]
pub fn handle(name: &str, n: u64) -> ResourceHandle {
    ResourceHandle::new(name, address(n), ResourceKind::External)
}

/// Registry of external handles
#[must_use]
pub fn registry(entries: &[(&str, u64)]) -> Registry {
    Registry::from_handles(entries.iter().map(|(name, n)| handle(name, *n)))
}

/// Core contract
pub const CORE: u64 = 1;
/// FEI token
pub const FEI: u64 = 2;
/// DAO timelock
pub const DAO_TIMELOCK: u64 = 7;
/// Tribal council timelock
pub const TC_TIMELOCK: u64 = 8;
/// Optimistic timelock
pub const OA_TIMELOCK: u64 = 9;

/// Address book matching [`standard_genesis`]
#[must_use]
pub fn standard_book() -> AddressBook {
    AddressBook::new()
        .with_entry("core", address(CORE), ResourceKind::Core)
        .with_entry("fei", address(FEI), ResourceKind::Token)
        .with_entry("feiDAOTimelock", address(DAO_TIMELOCK), ResourceKind::Governance)
        .with_entry("tribalCouncilTimelock", address(TC_TIMELOCK), ResourceKind::Governance)
        .with_entry("optimisticTimelock", address(OA_TIMELOCK), ResourceKind::Governance)
}

/// Core, a token and one timelock per governance track, each timelock
/// holding the governor role
#[must_use]
pub fn standard_genesis() -> Genesis {
    let mut genesis = Genesis::default()
        .with_contract(address(FEI), "Fei")
        .with_role(Role::MINTER, address(DAO_TIMELOCK));
    genesis.contracts.push(GenesisContract {
        address: address(CORE),
        artifact: "Core".to_string(),
        storage: [("version".to_string(), json!(1))].into_iter().collect(),
        paused: false,
        oracle: None,
    });
    for (category, timelock, artifact) in [
        (ProposalCategory::Dao, DAO_TIMELOCK, "FeiDAOTimelock"),
        (ProposalCategory::TribalCouncil, TC_TIMELOCK, "TribalCouncilTimelock"),
        (ProposalCategory::OptimisticApproval, OA_TIMELOCK, "OptimisticTimelock"),
    ] {
        genesis = genesis
            .with_contract(address(timelock), artifact)
            .with_role(Role::GOVERN, address(timelock))
            .with_timelock(category, address(timelock));
    }
    genesis
}

/// Load the standard simulated environment
///
/// # Errors
/// Propagates loader errors
pub async fn sim_environment(logging: bool) -> Result<Environment, EnvError> {
    let loader = EnvironmentLoader::simulated(
        EnvironmentConfig::new(deployer())
            .with_logging(logging)
            .with_verify_code(true),
        standard_book(),
        &standard_genesis(),
    );
    loader.load().await.cloned()
}
