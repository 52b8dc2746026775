//! Resource registry and frozen snapshots
//!
//! The [`Registry`] is owned by whoever drives a run and is the only mutable
//! shared state of the harness. Everything else reads it through a
//! [`RegistrySnapshot`], which shares structure with the registry (`im`), so
//! freezing one per lifecycle phase costs O(1).

use crate::address::Address;
use crate::error::RegistryError;
use crate::handle::ResourceHandle;
use serde::Serialize;
use std::collections::BTreeMap;

/// Status of a registry entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Current resource
    Live,
    /// Retired by a proposal; no longer current
    Deprecated,
}

/// Handle plus bookkeeping status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    /// Resource handle
    pub handle: ResourceHandle,
    /// Live or deprecated
    pub status: EntryStatus,
}

impl RegistryEntry {
    #[inline]
    fn live(handle: ResourceHandle) -> Self {
        Self {
            handle,
            status: EntryStatus::Live,
        }
    }

    /// Check if entry is current
    #[inline]
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.status == EntryStatus::Live
    }
}

/// Result of a [`Registry::put`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome {
    /// Name was not present
    Inserted,
    /// Identical live handle already present
    Unchanged,
    /// A live handle was overwritten (flagged)
    Replaced { previous: ResourceHandle },
    /// A deprecated handle was explicitly re-added
    Revived { previous: ResourceHandle },
}

/// Record of a live entry moving to a new address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overwrite {
    /// Registry name
    pub name: String,
    /// Address before the overwrite
    pub previous: Address,
    /// Address after the overwrite
    pub replacement: Address,
}

/// Summary of a [`Registry::merge`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Names that were new
    pub inserted: Vec<String>,
    /// Live names whose handle was superseded by the incoming one
    pub superseded: Vec<String>,
    /// Deprecated names brought back by the incoming entry
    pub revived: Vec<String>,
    /// Names whose incoming entry matched the existing one
    pub unchanged: usize,
}

impl MergeSummary {
    /// Number of entries that changed the registry
    #[inline]
    #[must_use]
    pub fn changed(&self) -> usize {
        self.inserted.len() + self.superseded.len() + self.revived.len()
    }
}

/// Frozen, read-only view of a registry
///
/// Cloning is cheap; the view never observes later registry mutations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySnapshot {
    entries: im::HashMap<String, RegistryEntry>,
}

impl RegistrySnapshot {
    /// Lookup a live resource
    ///
    /// # Errors
    /// - `RegistryError::UnknownResource` if the name was never registered
    /// - `RegistryError::Deprecated` if the name was retired
    pub fn get(&self, name: &str) -> Result<&ResourceHandle, RegistryError> {
        let entry = self.get_any(name)?;
        if entry.is_live() {
            Ok(&entry.handle)
        } else {
            Err(RegistryError::Deprecated {
                name: name.to_string(),
            })
        }
    }

    /// Lookup an entry regardless of status
    ///
    /// # Errors
    /// Returns `RegistryError::UnknownResource` if the name was never registered
    pub fn get_any(&self, name: &str) -> Result<&RegistryEntry, RegistryError> {
        self.entries
            .get(name)
            .ok_or_else(|| RegistryError::UnknownResource {
                name: name.to_string(),
            })
    }

    /// Address of a live resource
    ///
    /// # Errors
    /// Same as [`RegistrySnapshot::get`]
    #[inline]
    pub fn address(&self, name: &str) -> Result<Address, RegistryError> {
        self.get(name).map(|h| h.address)
    }

    /// Check if name is registered and live
    #[inline]
    #[must_use]
    pub fn is_live(&self, name: &str) -> bool {
        self.entries.get(name).is_some_and(RegistryEntry::is_live)
    }

    /// Check if name is registered and deprecated
    #[inline]
    #[must_use]
    pub fn is_deprecated(&self, name: &str) -> bool {
        self.entries
            .get(name)
            .is_some_and(|e| e.status == EntryStatus::Deprecated)
    }

    /// Check if name is registered at all
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of entries (live and deprecated)
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

    /// Sorted names of live entries
    #[must_use]
    pub fn live_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .entries
            .iter()
            .filter(|(_, e)| e.is_live())
            .map(|(n, _)| n.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Find the live name registered at an address
    #[must_use]
    pub fn name_of(&self, address: Address) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, e)| e.is_live() && e.handle.address == address)
            .map(|(n, _)| n.as_str())
    }

    /// Iterate over all entries in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &RegistryEntry)> {
        self.entries.iter()
    }

    /// Entries ordered by name
    #[must_use]
    pub fn to_sorted(&self) -> BTreeMap<String, RegistryEntry> {
        self.entries
            .iter()
            .map(|(n, e)| (n.clone(), e.clone()))
            .collect()
    }
}

/// Name → resource mapping accumulated across a run
#[derive(Debug, Clone, Default)]
pub struct Registry {
    current: RegistrySnapshot,
    overwrites: Vec<Overwrite>,
}

impl Registry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from handles keyed by their own names
    ///
    /// Later handles win when names repeat.
    #[must_use]
    pub fn from_handles(handles: impl IntoIterator<Item = ResourceHandle>) -> Self {
        let mut registry = Self::new();
        for handle in handles {
            registry
                .current
                .entries
                .insert(handle.name.clone(), RegistryEntry::live(handle));
        }
        registry
    }

    /// Lookup a live resource
    ///
    /// # Errors
    /// See [`RegistrySnapshot::get`]
    #[inline]
    pub fn get(&self, name: &str) -> Result<&ResourceHandle, RegistryError> {
        self.current.get(name)
    }

    /// Lookup an entry regardless of status
    ///
    /// # Errors
    /// See [`RegistrySnapshot::get_any`]
    #[inline]
    pub fn get_any(&self, name: &str) -> Result<&RegistryEntry, RegistryError> {
        self.current.get_any(name)
    }

    /// Check if name is registered and live
    #[inline]
    #[must_use]
    pub fn is_live(&self, name: &str) -> bool {
        self.current.is_live(name)
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.current.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Insert or overwrite a handle under `name`
    ///
    /// The stored handle is renamed to `name`. Overwriting a live entry with a
    /// different handle is allowed but logged and recorded in
    /// [`Registry::overwrites`].
    pub fn put(&mut self, name: impl Into<String>, handle: ResourceHandle) -> PutOutcome {
        let name = name.into();
        let handle = handle.renamed(name.clone());
        let previous = self
            .current
            .entries
            .insert(name.clone(), RegistryEntry::live(handle.clone()));

        match previous {
            None => PutOutcome::Inserted,
            Some(prev) if prev.is_live() && prev.handle == handle => PutOutcome::Unchanged,
            Some(prev) if prev.is_live() => {
                tracing::warn!(
                    name = %name,
                    previous = %prev.handle.address,
                    replacement = %handle.address,
                    "overwriting live registry entry"
                );
                self.overwrites.push(Overwrite {
                    name,
                    previous: prev.handle.address,
                    replacement: handle.address,
                });
                PutOutcome::Replaced {
                    previous: prev.handle,
                }
            }
            Some(prev) => PutOutcome::Revived {
                previous: prev.handle,
            },
        }
    }

    /// Insert every entry of `other`; incoming entries win on collision
    pub fn merge(&mut self, other: Registry) -> MergeSummary {
        let mut summary = MergeSummary::default();

        for (name, incoming) in other.current.entries {
            match self.current.entries.insert(name.clone(), incoming.clone()) {
                None => summary.inserted.push(name),
                Some(prev) if prev == incoming => summary.unchanged += 1,
                Some(prev) if prev.is_live() => {
                    tracing::debug!(
                        name = %name,
                        previous = %prev.handle.address,
                        replacement = %incoming.handle.address,
                        "registry entry superseded"
                    );
                    summary.superseded.push(name);
                }
                Some(_) => summary.revived.push(name),
            }
        }

        summary.inserted.sort_unstable();
        summary.superseded.sort_unstable();
        summary.revived.sort_unstable();
        summary
    }

    /// Retire a resource
    ///
    /// Later lookups through [`Registry::get`] fail with
    /// `RegistryError::Deprecated` until the name is re-added.
    ///
    /// # Errors
    /// Returns `RegistryError::UnknownResource` if the name was never registered
    pub fn deprecate(&mut self, name: &str) -> Result<&ResourceHandle, RegistryError> {
        let entry = self
            .current
            .entries
            .get_mut(name)
            .ok_or_else(|| RegistryError::UnknownResource {
                name: name.to_string(),
            })?;
        entry.status = EntryStatus::Deprecated;
        Ok(&entry.handle)
    }

    /// Freeze the current state into a read-only view
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.current.clone()
    }

    /// Live entries overwritten through [`Registry::put`], oldest first
    #[inline]
    #[must_use]
    pub fn overwrites(&self) -> &[Overwrite] {
        &self.overwrites
    }
}

impl From<RegistrySnapshot> for Registry {
    fn from(snapshot: RegistrySnapshot) -> Self {
        Self {
            current: snapshot,
            overwrites: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::ResourceKind;
    use pretty_assertions::assert_eq;

    fn handle(name: &str, n: u64) -> ResourceHandle {
        ResourceHandle::new(name, Address::from_low_u64(n), ResourceKind::Oracle)
    }

    #[test]
    fn get_unknown_fails() {
        let registry = Registry::new();
        assert_eq!(
            registry.get("oracleA"),
            Err(RegistryError::UnknownResource {
                name: "oracleA".to_string()
            })
        );
    }

    #[test]
    fn put_then_get() {
        let mut registry = Registry::new();
        assert_eq!(registry.put("oracleA", handle("oracleA", 1)), PutOutcome::Inserted);
        assert_eq!(registry.get("oracleA").unwrap().address, Address::from_low_u64(1));
    }

    #[test]
    fn put_renames_handle() {
        let mut registry = Registry::new();
        registry.put("alias", handle("original", 3));
        assert_eq!(registry.get("alias").unwrap().name, "alias");
    }

    #[test]
    fn put_identical_is_unchanged() {
        let mut registry = Registry::new();
        registry.put("oracleA", handle("oracleA", 1));
        assert_eq!(registry.put("oracleA", handle("oracleA", 1)), PutOutcome::Unchanged);
        assert!(registry.overwrites().is_empty());
    }

    #[test]
    fn put_overwrite_is_flagged() {
        let mut registry = Registry::new();
        registry.put("oracleA", handle("oracleA", 1));
        let outcome = registry.put("oracleA", handle("oracleA", 2));

        assert_eq!(
            outcome,
            PutOutcome::Replaced {
                previous: handle("oracleA", 1)
            }
        );
        assert_eq!(
            registry.overwrites(),
            &[Overwrite {
                name: "oracleA".to_string(),
                previous: Address::from_low_u64(1),
                replacement: Address::from_low_u64(2),
            }]
        );
    }

    #[test]
    fn deprecate_hides_until_readded() {
        let mut registry = Registry::new();
        registry.put("lens", handle("lens", 1));
        registry.deprecate("lens").unwrap();

        assert!(matches!(registry.get("lens"), Err(RegistryError::Deprecated { .. })));
        assert!(!registry.get_any("lens").unwrap().is_live());

        let outcome = registry.put("lens", handle("lens", 2));
        assert!(matches!(outcome, PutOutcome::Revived { .. }));
        assert_eq!(registry.get("lens").unwrap().address, Address::from_low_u64(2));
        assert!(registry.overwrites().is_empty());
    }

    #[test]
    fn deprecate_unknown_fails() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.deprecate("ghost"),
            Err(RegistryError::UnknownResource { .. })
        ));
    }

    #[test]
    fn merge_incoming_wins() {
        let mut registry = Registry::from_handles([handle("oracleA", 1), handle("core", 9)]);
        let incoming = Registry::from_handles([handle("oracleA", 2), handle("swapper", 3)]);

        let summary = registry.merge(incoming);

        assert_eq!(summary.inserted, vec!["swapper".to_string()]);
        assert_eq!(summary.superseded, vec!["oracleA".to_string()]);
        assert_eq!(summary.changed(), 2);
        assert_eq!(registry.get("oracleA").unwrap().address, Address::from_low_u64(2));
        assert_eq!(registry.get("core").unwrap().address, Address::from_low_u64(9));
        // merge supersedes legitimately, it is not an overwrite
        assert!(registry.overwrites().is_empty());
    }

    #[test]
    fn merge_revives_deprecated() {
        let mut registry = Registry::from_handles([handle("lens", 1)]);
        registry.deprecate("lens").unwrap();

        let summary = registry.merge(Registry::from_handles([handle("lens", 4)]));
        assert_eq!(summary.revived, vec!["lens".to_string()]);
        assert!(registry.is_live("lens"));
    }

    #[test]
    fn snapshot_is_frozen() {
        let mut registry = Registry::from_handles([handle("oracleA", 1)]);
        let before = registry.snapshot();

        registry.put("oracleB", handle("oracleB", 2));
        registry.deprecate("oracleA").unwrap();

        assert!(before.is_live("oracleA"));
        assert!(!before.contains("oracleB"));
        assert_eq!(registry.snapshot().live_names(), vec!["oracleB"]);
    }

    #[test]
    fn snapshot_name_of() {
        let registry = Registry::from_handles([handle("oracleA", 1), handle("core", 2)]);
        let snap = registry.snapshot();
        assert_eq!(snap.name_of(Address::from_low_u64(2)), Some("core"));
        assert_eq!(snap.name_of(Address::from_low_u64(5)), None);
    }
}
