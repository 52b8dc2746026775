//! Declarative post-conditions
//!
//! Invariants are data, so a persisted catalogue can carry them next to the
//! proposal they guard. Parties and resources are registry names, `{name}`
//! placeholders or literal addresses.

use crate::assertion::AssertionSet;
use crate::error::PhaseError;
use crate::template;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use upgrade_chain::amount::{self, Amount};
use upgrade_chain::{ChainState, Role};
use upgrade_registry::{Address, RegistrySnapshot};

/// Post-condition over live state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Invariant {
    /// Role is held by every listed party; with `exclusive`, by no one else
    RoleHeldBy {
        /// Role name
        role: String,
        /// Expected holders
        holders: Vec<String>,
        /// Reject additional holders
        #[serde(default)]
        exclusive: bool,
    },

    /// Token balance of holder lies in `[min, max]`
    BalanceWithin {
        /// Token resource
        token: String,
        /// Holder
        holder: String,
        /// Lower bound
        #[serde(with = "amount::serde_str")]
        min: Amount,
        /// Upper bound
        #[serde(with = "amount::serde_str")]
        max: Amount,
    },

    /// Oracle reading is valid and lies in `[min, max]`
    OracleWithin {
        /// Oracle resource
        oracle: String,
        /// Lower bound
        #[serde(with = "amount::serde_str")]
        min: Amount,
        /// Upper bound
        #[serde(with = "amount::serde_str")]
        max: Amount,
    },

    /// Resource pause flag matches
    Paused {
        /// Pausable resource
        resource: String,
        /// Expected flag
        #[serde(default = "default_true")]
        paused: bool,
    },

    /// Named storage slot equals a templated value
    StorageEquals {
        /// Resource
        resource: String,
        /// Storage key
        key: String,
        /// Expected value; `{name}` resolves to an address
        expected: Value,
    },
}

fn default_true() -> bool {
    true
}

impl Invariant {
    /// Short human-readable name
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::RoleHeldBy { role, exclusive, .. } => {
                if *exclusive {
                    format!("{role} held exclusively")
                } else {
                    format!("{role} held")
                }
            }
            Self::BalanceWithin { token, holder, .. } => format!("{token} balance of {holder}"),
            Self::OracleWithin { oracle, .. } => format!("{oracle} reading"),
            Self::Paused { resource, paused } => {
                format!("{resource} {}", if *paused { "paused" } else { "unpaused" })
            }
            Self::StorageEquals { resource, key, .. } => format!("{resource}.{key}"),
        }
    }

    /// Evaluate against live state, recording into `set`
    ///
    /// # Errors
    /// - `PhaseError::Registry` if a name does not resolve
    /// - `PhaseError::Chain` if a read fails
    pub async fn check(
        &self,
        registry: &RegistrySnapshot,
        chain: &dyn ChainState,
        set: &mut AssertionSet,
    ) -> Result<(), PhaseError> {
        let name = format!("invariant: {}", self.name());
        match self {
            Self::RoleHeldBy {
                role,
                holders,
                exclusive,
            } => {
                let expected = holders
                    .iter()
                    .map(|h| template::resolve_party(h, registry))
                    .collect::<Result<Vec<Address>, _>>()?;
                let actual = chain.role_holders(&Role::new(role.clone())).await?;
                let missing: Vec<&Address> =
                    expected.iter().filter(|a| !actual.contains(a)).collect();
                let extra: Vec<&Address> = actual
                    .iter()
                    .filter(|a| *exclusive && !expected.contains(a))
                    .collect();
                set.check_with(name, missing.is_empty() && extra.is_empty(), || {
                    format!("missing {}, unexpected {}", list(&missing), list(&extra))
                });
            }
            Self::BalanceWithin {
                token,
                holder,
                min,
                max,
            } => {
                let token = template::resolve_party(token, registry)?;
                let holder = template::resolve_party(holder, registry)?;
                let balance = chain.balance_of(token, holder).await?;
                set.within(name, balance, *min, *max);
            }
            Self::OracleWithin { oracle, min, max } => {
                let oracle = template::resolve_party(oracle, registry)?;
                let reading = chain.read_oracle(oracle).await?;
                let holds = reading.valid && (*min..=*max).contains(&reading.value);
                set.check_with(name, holds, || {
                    format!(
                        "reading {} (valid: {}) outside [{min}, {max}]",
                        reading.value, reading.valid
                    )
                });
            }
            Self::Paused { resource, paused } => {
                let address = template::resolve_party(resource, registry)?;
                let actual = chain.is_paused(address).await?;
                set.eq(name, actual, *paused);
            }
            Self::StorageEquals {
                resource,
                key,
                expected,
            } => {
                let address = template::resolve_party(resource, registry)?;
                let expected = template::resolve(expected, registry)?;
                let actual = chain.storage(address, key).await?;
                set.eq(name, actual, Some(expected));
            }
        }
        Ok(())
    }
}

fn list(addresses: &[&Address]) -> String {
    if addresses.is_empty() {
        return "none".to_string();
    }
    addresses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
