//! Governance payload attached to a proposal

use crate::template;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use upgrade_chain::amount::{self, Amount};
use upgrade_chain::ContractCall;
use upgrade_registry::{RegistryError, RegistrySnapshot};

/// One command of a proposal payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalCommand {
    /// Registry name of the target (`core` or `{core}`)
    pub target: String,
    /// Native value sent with the call
    #[serde(default, with = "amount::serde_str")]
    pub values: Amount,
    /// Method name
    pub method: String,
    /// Arguments; `{name}` strings resolve to addresses
    #[serde(default)]
    pub arguments: Vec<Value>,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
}

/// Proposal payload as submitted to governance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposalDescription {
    /// Proposal title
    pub title: String,
    /// Commands in execution order
    #[serde(default)]
    pub commands: Vec<ProposalCommand>,
    /// Long-form description
    #[serde(default)]
    pub description: String,
}

impl ProposalDescription {
    /// Create payload with title
    #[inline]
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Append a command
    #[must_use]
    pub fn with_command(
        mut self,
        target: impl Into<String>,
        method: impl Into<String>,
        arguments: Vec<Value>,
    ) -> Self {
        self.commands.push(ProposalCommand {
            target: target.into(),
            values: 0,
            method: method.into(),
            arguments,
            description: String::new(),
        });
        self
    }

    /// Sum of values attached to all commands
    #[must_use]
    pub fn total_value(&self) -> Amount {
        self.commands
            .iter()
            .fold(0, |acc: Amount, c| acc.saturating_add(c.values))
    }

    /// Resolve targets and argument placeholders against the registry
    ///
    /// # Errors
    /// Fails on the first name that is unknown or deprecated
    pub fn resolve(&self, registry: &RegistrySnapshot) -> Result<Vec<ContractCall>, RegistryError> {
        self.commands
            .iter()
            .map(|command| {
                let target = template::resolve_party(&command.target, registry)?;
                let arguments = command
                    .arguments
                    .iter()
                    .map(|arg| template::resolve(arg, registry))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok::<_, RegistryError>(
                    ContractCall::new(target, command.method.clone(), arguments)
                        .with_value(command.values),
                )
            })
            .collect()
    }
}
