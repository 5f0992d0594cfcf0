use std::collections::HashSet;

use datastores_core::stable_id::SequenceEntropy;
use datastores_core::{Collection, ElementStore, IdAllocator, StableId};

/// Deterministic allocator handing out 1, 2, 3, ...
#[allow(dead_code)]
pub fn seq_allocator() -> IdAllocator {
    IdAllocator::new(Box::new(SequenceEntropy::new(1..=100_000)))
}

/// Runtime-supported collection with a content id, ready for packaging
#[allow(dead_code)]
pub fn packaged_collection(
    ids: &mut IdAllocator,
    name: &str,
    type_name: &str,
    content_id: &str,
) -> Collection {
    Collection::create(ids, name, type_name)
        .unwrap()
        .with_content_id(content_id)
        .with_runtime_supported(true)
}

/// Check the parent/child invariants through the public API.
///
/// Every element appears exactly once in its parent's child list, child lists
/// hold no duplicates, and every parent chain reaches the root.
#[allow(dead_code)]
pub fn assert_store_invariants(store: &ElementStore) {
    let mut seen_as_child: HashSet<StableId> = HashSet::new();

    let top: Vec<StableId> = store.top_level_ids().to_vec();
    let mut all_lists: Vec<Vec<StableId>> = vec![top];
    for element in store.elements() {
        all_lists.push(element.child_ids().to_vec());
    }
    for list in &all_lists {
        let unique: HashSet<&StableId> = list.iter().collect();
        assert_eq!(unique.len(), list.len(), "duplicate child id in {list:?}");
        for id in list {
            assert!(seen_as_child.insert(*id), "{id} listed by two parents");
        }
    }

    for element in store.elements() {
        let siblings: &[StableId] = if element.parent_id().is_invalid() {
            store.top_level_ids()
        } else {
            store.get_element(element.parent_id()).unwrap().child_ids()
        };
        assert_eq!(
            siblings.iter().filter(|c| **c == element.id).count(),
            1,
            "{} not listed exactly once by its parent",
            element.id
        );
        assert!(store.depth_of(element.id).unwrap() < store.len());
    }

    assert_eq!(seen_as_child.len(), store.len());
}
