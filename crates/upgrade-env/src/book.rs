//! Named addresses of the deployed system

use crate::error::EnvError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use upgrade_registry::{Address, Registry, ResourceHandle, ResourceKind};

/// Address book entry; a bare address string is accepted as shorthand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AddressBookEntry {
    /// Address with metadata
    Detailed {
        /// Address
        address: Address,
        /// Category
        #[serde(default, alias = "category")]
        kind: ResourceKind,
        /// Artifact name
        #[serde(default, skip_serializing_if = "Option::is_none")]
        artifact: Option<String>,
    },
    /// Address only; kind defaults to external
    Bare(Address),
}

impl AddressBookEntry {
    /// Address
    #[must_use]
    pub fn address(&self) -> Address {
        match self {
            Self::Detailed { address, .. } | Self::Bare(address) => *address,
        }
    }

    /// Kind
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Detailed { kind, .. } => *kind,
            Self::Bare(_) => ResourceKind::default(),
        }
    }

    fn to_handle(&self, name: &str) -> ResourceHandle {
        let handle = ResourceHandle::new(name, self.address(), self.kind());
        match self {
            Self::Detailed {
                artifact: Some(artifact),
                ..
            } => handle.with_artifact(artifact.clone()),
            _ => handle,
        }
    }
}

/// Name to address mapping, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressBook {
    entries: IndexMap<String, AddressBookEntry>,
}

impl AddressBook {
    /// Create empty book
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry
    #[must_use]
    pub fn with_entry(mut self, name: impl Into<String>, address: Address, kind: ResourceKind) -> Self {
        self.entries.insert(
            name.into(),
            AddressBookEntry::Detailed {
                address,
                kind,
                artifact: None,
            },
        );
        self
    }

    /// Parse JSON
    ///
    /// # Errors
    /// Returns `EnvError::AddressBook` on malformed input
    pub fn from_json_str(text: &str) -> Result<Self, EnvError> {
        serde_json::from_str(text).map_err(|e| EnvError::AddressBook(e.to_string()))
    }

    /// Parse YAML
    ///
    /// # Errors
    /// Returns `EnvError::AddressBook` on malformed input
    pub fn from_yaml_str(text: &str) -> Result<Self, EnvError> {
        serde_yaml::from_str(text).map_err(|e| EnvError::AddressBook(e.to_string()))
    }

    /// Read a file; `.yaml`/`.yml` parse as YAML, anything else as JSON
    ///
    /// # Errors
    /// Returns `EnvError::AddressBook` if the file cannot be read or parsed
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, EnvError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| EnvError::AddressBook(format!("{}: {e}", path.display())))?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| matches!(ext, "yaml" | "yml"));
        if is_yaml {
            Self::from_yaml_str(&text)
        } else {
            Self::from_json_str(&text)
        }
    }

    /// Entry by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AddressBookEntry> {
        self.entries.get(name)
    }

    /// Check for a name
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AddressBookEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Names from `required` that are absent or set to the zero address,
    /// in the order given
    #[must_use]
    pub fn missing<'a>(&self, required: &'a [String]) -> Vec<&'a str> {
        required
            .iter()
            .filter(|name| self.get(name).map_or(true, |entry| entry.address().is_zero()))
            .map(String::as_str)
            .collect()
    }

    /// Build a registry of live handles
    #[must_use]
    pub fn to_registry(&self) -> Registry {
        Registry::from_handles(self.iter().map(|(name, entry)| entry.to_handle(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn accepts_detailed_and_bare_entries() {
        let book = AddressBook::from_json_str(
            r#"{
                "core": { "address": "0x0000000000000000000000000000000000000001", "category": "core", "artifact": "Core" },
                "multisig": "0x0000000000000000000000000000000000000002"
            }"#,
        )
        .unwrap();

        assert_eq!(book.len(), 2);
        assert_eq!(book.get("core").map(AddressBookEntry::kind), Some(ResourceKind::Core));
        assert_eq!(
            book.get("multisig").map(AddressBookEntry::address),
            Some(Address::from_low_u64(2))
        );

        let registry = book.to_registry();
        assert_eq!(registry.get("core").unwrap().artifact.as_deref(), Some("Core"));
        assert_eq!(registry.get("multisig").unwrap().kind, ResourceKind::External);
    }

    #[test]
    fn reports_missing_names_in_order() {
        let book = AddressBook::new().with_entry("core", Address::from_low_u64(1), ResourceKind::Core);
        let required = vec!["fei".to_string(), "core".to_string(), "tribe".to_string()];
        assert_eq!(book.missing(&required), vec!["fei", "tribe"]);
    }

    #[test]
    fn zero_address_counts_as_unset() {
        let book = AddressBook::from_json_str(
            r#"{
                "core": "0x0000000000000000000000000000000000000001",
                "fei": "0x0000000000000000000000000000000000000000"
            }"#,
        )
        .unwrap();
        let required = vec!["core".to_string(), "fei".to_string()];
        assert_eq!(book.missing(&required), vec!["fei"]);
    }

    #[test]
    fn yaml_book() {
        let book = AddressBook::from_yaml_str(
            "core:\n  address: \"0x0000000000000000000000000000000000000001\"\n  kind: core\n",
        )
        .unwrap();
        assert!(book.contains("core"));
    }
}
