//! Calls, events and readings exchanged with the chain

use crate::amount::{self, Amount};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use upgrade_registry::Address;

/// One state-changing call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractCall {
    /// Contract to call
    pub target: Address,
    /// Method name
    pub method: String,
    /// Positional arguments
    #[serde(default)]
    pub arguments: Vec<Value>,
    /// Native value attached
    #[serde(default, with = "amount::serde_str")]
    pub value: Amount,
}

impl ContractCall {
    /// Create call without value
    #[inline]
    #[must_use]
    pub fn new(target: Address, method: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            target,
            method: method.into(),
            arguments,
            value: 0,
        }
    }

    /// With attached native value
    #[inline]
    #[must_use]
    pub fn with_value(mut self, value: Amount) -> Self {
        self.value = value;
        self
    }
}

/// Event emitted by a call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Emitting contract
    pub emitter: Address,
    /// Event name
    pub name: String,
    /// Event payload
    #[serde(default)]
    pub data: Value,
}

impl Event {
    /// Create event
    #[inline]
    #[must_use]
    pub fn new(emitter: Address, name: impl Into<String>, data: Value) -> Self {
        Self {
            emitter,
            name: name.into(),
            data,
        }
    }
}

/// Receipt of a successful call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// Events in emission order
    pub events: Vec<Event>,
}

impl Receipt {
    /// Find first event by name
    #[must_use]
    pub fn event(&self, name: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.name == name)
    }
}

/// Oracle reading, 18-decimal fixed point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleReading {
    /// Price scaled by 1e18
    #[serde(with = "amount::serde_str")]
    pub value: Amount,
    /// Whether the oracle reports the value as valid
    #[serde(default = "default_valid")]
    pub valid: bool,
}

fn default_valid() -> bool {
    true
}

impl OracleReading {
    /// Valid reading
    #[inline]
    #[must_use]
    pub fn valid(value: Amount) -> Self {
        Self { value, valid: true }
    }
}
