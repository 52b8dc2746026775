//! Registry merge properties

use proptest::prelude::*;
use std::collections::BTreeMap;
use upgrade_registry::{Address, Registry, RegistryError, ResourceHandle, ResourceKind};

fn handles(entries: &BTreeMap<String, u64>) -> Vec<ResourceHandle> {
    entries
        .iter()
        .map(|(name, n)| ResourceHandle::new(name.clone(), Address::from_low_u64(*n), ResourceKind::External))
        .collect()
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-e][a-z]{0,3}"
}

proptest! {
    #[test]
    fn prop_merge_contains_union_and_incoming_wins(
        base in prop::collection::btree_map(name_strategy(), 1u64..1000, 0..12),
        incoming in prop::collection::btree_map(name_strategy(), 1u64..1000, 0..12),
    ) {
        let mut registry = Registry::from_handles(handles(&base));
        let summary = registry.merge(Registry::from_handles(handles(&incoming)));

        for (name, n) in &incoming {
            prop_assert_eq!(registry.get(name).unwrap().address, Address::from_low_u64(*n));
        }
        for (name, n) in &base {
            if !incoming.contains_key(name) {
                prop_assert_eq!(registry.get(name).unwrap().address, Address::from_low_u64(*n));
            }
        }

        let union: std::collections::BTreeSet<&String> = base.keys().chain(incoming.keys()).collect();
        prop_assert_eq!(registry.len(), union.len());
        prop_assert_eq!(
            summary.inserted.len(),
            incoming.keys().filter(|k| !base.contains_key(*k)).count()
        );
    }

    #[test]
    fn prop_unknown_names_never_resolve(
        base in prop::collection::btree_map(name_strategy(), 1u64..1000, 0..12),
        probe in "[f-z][a-z]{0,3}",
    ) {
        let registry = Registry::from_handles(handles(&base));
        let is_unknown = matches!(
            registry.get(&probe),
            Err(RegistryError::UnknownResource { .. })
        );
        prop_assert!(is_unknown);
    }
}

#[test]
fn sequential_proposals_later_insertion_wins() {
    let mut registry = Registry::new();

    // proposal 1 introduces A -> X
    registry.merge(Registry::from_handles([ResourceHandle::new(
        "A",
        Address::from_low_u64(0x10),
        ResourceKind::Oracle,
    )]));
    // proposal 2 supersedes A -> Y
    registry.merge(Registry::from_handles([ResourceHandle::new(
        "A",
        Address::from_low_u64(0x20),
        ResourceKind::Oracle,
    )]));

    assert_eq!(registry.get("A").unwrap().address, Address::from_low_u64(0x20));
}
