use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::errors::{DatastoresError, Result};
use crate::model::{Element, ElementPayload, LogicalKind};
use crate::stable_id::{IdAllocator, StableId};

/// Bound on the ancestor walk performed when validating a move.
///
/// A chain longer than this is treated as corruption, not as legitimate depth.
pub const PARENT_WALK_LIMIT: usize = 100;

/// Flat, ordered element store with explicit parent/child links.
///
/// Slot 0 always holds the hidden root sentinel (id [`StableId::INVALID`]);
/// top-level elements are its children. Not thread-safe: mutate from the
/// editing thread only and hand clones to background work.
///
/// Every mutation bumps [`ElementStore::generation`], which derived views use
/// to detect staleness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Element>", into = "Vec<Element>")]
pub struct ElementStore {
    elements: Vec<Element>,
    index: HashMap<StableId, usize>,
    generation: u64,
}

impl Default for ElementStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementStore {
    /// Create a store holding only the root sentinel
    pub fn new() -> Self {
        let mut index = HashMap::new();
        index.insert(StableId::INVALID, 0);
        Self {
            elements: vec![Element::root()],
            index,
            generation: 0,
        }
    }

    /// Rebuild a store from persisted elements (root sentinel included).
    ///
    /// # Errors
    ///
    /// `CorruptStructure` when the elements do not form a valid forest under a
    /// single root sentinel: missing or duplicate root, duplicate ids, dangling
    /// child ids, parent/child disagreement, duplicate children or cycles.
    pub fn from_elements(elements: Vec<Element>) -> Result<Self> {
        let corrupt = |id: StableId, reason: String| DatastoresError::CorruptStructure {
            element_id: id.to_string(),
            reason,
        };

        let mut index = HashMap::with_capacity(elements.len());
        for (slot, element) in elements.iter().enumerate() {
            if index.insert(element.id, slot).is_some() {
                return Err(corrupt(element.id, "duplicate element id".to_string()));
            }
        }

        match index.get(&StableId::INVALID) {
            Some(0) => {}
            Some(_) => {
                return Err(corrupt(
                    StableId::INVALID,
                    "root sentinel must be the first element".to_string(),
                ))
            }
            None => {
                return Err(corrupt(
                    StableId::INVALID,
                    "missing root sentinel".to_string(),
                ))
            }
        }
        if elements[0].payload.kind != LogicalKind::Root {
            return Err(corrupt(
                StableId::INVALID,
                "root sentinel must have root kind".to_string(),
            ));
        }

        // Every non-root element must be listed exactly once by its parent.
        let mut listed_by: HashMap<StableId, StableId> = HashMap::new();
        for element in &elements {
            let mut seen = HashSet::new();
            for child in &element.child_ids {
                if !seen.insert(*child) {
                    return Err(corrupt(element.id, format!("duplicate child id {}", child)));
                }
                if child.is_invalid() || !index.contains_key(child) {
                    return Err(corrupt(element.id, format!("unknown child id {}", child)));
                }
                if listed_by.insert(*child, element.id).is_some() {
                    return Err(corrupt(*child, "listed by more than one parent".to_string()));
                }
            }
        }

        for element in elements.iter().skip(1) {
            match listed_by.get(&element.id) {
                Some(parent) if *parent == element.parent_id => {}
                Some(parent) => {
                    return Err(corrupt(
                        element.id,
                        format!(
                            "parent_id {} disagrees with listing parent {}",
                            element.parent_id, parent
                        ),
                    ))
                }
                None => {
                    return Err(corrupt(
                        element.id,
                        format!("not listed by parent {}", element.parent_id),
                    ))
                }
            }
        }

        let store = Self {
            elements,
            index,
            generation: 0,
        };

        // Links agree, so any element unreachable from the root sits on a cycle.
        let reachable = store.collect_subtree(StableId::INVALID);
        if reachable.len() != store.elements.len() {
            let reachable: HashSet<_> = reachable.into_iter().collect();
            let stray = store
                .elements
                .iter()
                .find(|e| !reachable.contains(&e.id))
                .map(|e| e.id)
                .unwrap_or(StableId::INVALID);
            return Err(corrupt(stray, "element is part of a parent cycle".to_string()));
        }

        Ok(store)
    }

    /// Mutation counter; changes whenever the structure or an element changes
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Visible elements in declaration order (root sentinel excluded)
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().skip(1)
    }

    /// All slots including the root sentinel, for persistence and materialization
    pub(crate) fn raw_elements(&self) -> &[Element] {
        &self.elements
    }

    /// Number of visible elements
    pub fn len(&self) -> usize {
        self.elements.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: StableId) -> bool {
        !id.is_invalid() && self.index.contains_key(&id)
    }

    /// Ids of the top-level elements, in order
    pub fn top_level_ids(&self) -> &[StableId] {
        &self.elements[0].child_ids
    }

    /// Get a visible element by id
    ///
    /// # Errors
    ///
    /// `ElementNotFound` if the id is absent or is the root sentinel.
    pub fn get_element(&self, id: StableId) -> Result<&Element> {
        self.slot_of(id)
            .map(|slot| &self.elements[slot])
            .ok_or_else(|| not_found(id))
    }

    /// Create a new element under `parent_id` (`INVALID` = top level).
    ///
    /// # Errors
    ///
    /// - `ParentNotFound` if `parent_id` is non-invalid and absent
    /// - `AllocationExhausted` if no id could be minted
    /// - `IdCollision` if the allocator minted an id this store already holds;
    ///   the store is unchanged and the id stays live in `ids`, so a retry
    ///   draws a different one
    pub fn add_element(
        &mut self,
        ids: &mut IdAllocator,
        display_name: impl Into<String>,
        payload: ElementPayload,
        parent_id: StableId,
    ) -> Result<StableId> {
        let parent_slot = self.parent_slot(parent_id)?;
        let id = ids.allocate()?;
        if self.index.contains_key(&id) {
            tracing::warn!(
                element_id = %id,
                "allocator minted an id already present in the store"
            );
            return Err(DatastoresError::IdCollision {
                element_id: id.to_string(),
            });
        }

        self.elements
            .push(Element::new(id, display_name, parent_id, payload));
        self.index.insert(id, self.elements.len() - 1);
        self.elements[parent_slot].insert_child_id(id, -1);
        self.generation += 1;

        Ok(id)
    }

    /// Remove `id` and its whole subtree, retiring every removed id.
    ///
    /// The target is unlinked from its parent before anything is removed, so
    /// the live tree never contains a half-removed node. Returns the removed
    /// ids in traversal order.
    ///
    /// # Errors
    ///
    /// `ElementNotFound` if the element is absent.
    pub fn delete_element(&mut self, ids: &mut IdAllocator, id: StableId) -> Result<Vec<StableId>> {
        let slot = self.slot_of(id).ok_or_else(|| not_found(id))?;
        let doomed = self.collect_subtree(id);

        let parent_id = self.elements[slot].parent_id;
        if let Some(parent_slot) = self.index.get(&parent_id).copied() {
            self.elements[parent_slot].remove_child_id(id);
        }

        let doomed_set: HashSet<StableId> = doomed.iter().copied().collect();
        self.elements.retain(|e| !doomed_set.contains(&e.id));
        for removed in &doomed {
            ids.retire(*removed);
        }
        self.reindex();
        self.generation += 1;

        Ok(doomed)
    }

    /// Reparent `id` under `new_parent_id` at `child_index`.
    ///
    /// An out-of-range or negative index appends. Moving within the same parent
    /// reorders.
    ///
    /// # Errors
    ///
    /// - `ElementNotFound` / `ParentNotFound` for unknown ids
    /// - `CyclicMove` if `new_parent_id` is `id` or one of its descendants
    /// - `ParentChainTooDeep` if the ancestor walk exceeds [`PARENT_WALK_LIMIT`]
    ///
    /// The store is unchanged on every error.
    pub fn move_element(
        &mut self,
        id: StableId,
        new_parent_id: StableId,
        child_index: i64,
    ) -> Result<()> {
        let slot = self.slot_of(id).ok_or_else(|| not_found(id))?;
        let new_parent_slot = self.parent_slot(new_parent_id)?;
        self.check_not_ancestor(id, new_parent_id)?;

        let old_parent_id = self.elements[slot].parent_id;
        if let Some(old_parent_slot) = self.index.get(&old_parent_id).copied() {
            self.elements[old_parent_slot].remove_child_id(id);
        }
        self.elements[slot].parent_id = new_parent_id;
        self.elements[new_parent_slot].insert_child_id(id, child_index);
        self.generation += 1;

        Ok(())
    }

    /// Change an element's display name in place.
    ///
    /// # Errors
    ///
    /// `ElementNotFound` if the element is absent.
    pub fn rename_element(&mut self, id: StableId, display_name: impl Into<String>) -> Result<()> {
        let slot = self.slot_of(id).ok_or_else(|| not_found(id))?;
        self.elements[slot].display_name = display_name.into();
        self.generation += 1;
        Ok(())
    }

    /// Replace an element's payload in place.
    ///
    /// # Errors
    ///
    /// `ElementNotFound` if the element is absent.
    pub fn set_payload(&mut self, id: StableId, payload: ElementPayload) -> Result<()> {
        let slot = self.slot_of(id).ok_or_else(|| not_found(id))?;
        self.elements[slot].payload = payload;
        self.generation += 1;
        Ok(())
    }

    /// Mark every element id of this store live in `ids`.
    ///
    /// Call this before minting into a store that was loaded or built with a
    /// different allocator. Returns how many ids were already live.
    pub fn register_ids(&self, ids: &mut IdAllocator) -> usize {
        self.elements()
            .filter(|element| !ids.register(element.id))
            .count()
    }

    /// `id` and all of its descendants, parents before children.
    ///
    /// # Errors
    ///
    /// `ElementNotFound` if the element is absent.
    pub fn subtree_ids(&self, id: StableId) -> Result<Vec<StableId>> {
        self.slot_of(id).ok_or_else(|| not_found(id))?;
        Ok(self.collect_subtree(id))
    }

    /// Number of ancestors between `id` and the root sentinel (top level = 0).
    ///
    /// # Errors
    ///
    /// `ElementNotFound` for unknown ids, `ParentChainTooDeep` past the walk limit.
    pub fn depth_of(&self, id: StableId) -> Result<usize> {
        let mut current = self.get_element(id)?.parent_id;
        let mut depth = 0;
        while !current.is_invalid() {
            depth += 1;
            if depth > self.len() {
                return Err(DatastoresError::ParentChainTooDeep {
                    element_id: id.to_string(),
                    limit: self.len(),
                });
            }
            current = self.get_element(current)?.parent_id;
        }
        Ok(depth)
    }

    fn slot_of(&self, id: StableId) -> Option<usize> {
        if id.is_invalid() {
            return None;
        }
        self.index.get(&id).copied()
    }

    fn parent_slot(&self, parent_id: StableId) -> Result<usize> {
        if parent_id.is_invalid() {
            return Ok(0);
        }
        self.index
            .get(&parent_id)
            .copied()
            .ok_or_else(|| DatastoresError::ParentNotFound {
                parent_id: parent_id.to_string(),
            })
    }

    /// Walk parent pointers upward from `new_parent_id`, failing if `id` is met.
    fn check_not_ancestor(&self, id: StableId, new_parent_id: StableId) -> Result<()> {
        let mut current = new_parent_id;
        let mut steps = 0;
        while !current.is_invalid() {
            if current == id {
                return Err(DatastoresError::CyclicMove {
                    element_id: id.to_string(),
                    new_parent_id: new_parent_id.to_string(),
                });
            }
            if steps == PARENT_WALK_LIMIT {
                return Err(DatastoresError::ParentChainTooDeep {
                    element_id: new_parent_id.to_string(),
                    limit: PARENT_WALK_LIMIT,
                });
            }
            steps += 1;
            current = match self.index.get(&current) {
                Some(slot) => self.elements[*slot].parent_id,
                None => break,
            };
        }
        Ok(())
    }

    /// Iterative pre-order collection; explicit stack keeps deep trees off the call stack.
    fn collect_subtree(&self, id: StableId) -> Vec<StableId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(slot) = self.index.get(&current) {
                stack.extend(self.elements[*slot].child_ids.iter().rev().copied());
            }
        }
        out
    }

    fn reindex(&mut self) {
        self.index = self
            .elements
            .iter()
            .enumerate()
            .map(|(slot, e)| (e.id, slot))
            .collect();
    }
}

fn not_found(id: StableId) -> DatastoresError {
    DatastoresError::ElementNotFound {
        element_id: id.to_string(),
    }
}

impl TryFrom<Vec<Element>> for ElementStore {
    type Error = DatastoresError;

    fn try_from(elements: Vec<Element>) -> Result<Self> {
        ElementStore::from_elements(elements)
    }
}

impl From<ElementStore> for Vec<Element> {
    fn from(store: ElementStore) -> Self {
        store.elements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stable_id::SequenceEntropy;

    fn allocator() -> IdAllocator {
        IdAllocator::new(Box::new(SequenceEntropy::new(1..=1000)))
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = ElementStore::new();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert!(store.top_level_ids().is_empty());
    }

    #[test]
    fn test_root_sentinel_is_not_visible() {
        let store = ElementStore::new();
        assert!(matches!(
            store.get_element(StableId::INVALID),
            Err(DatastoresError::ElementNotFound { .. })
        ));
        assert!(!store.contains(StableId::INVALID));
    }

    #[test]
    fn test_add_links_both_sides() {
        let mut ids = allocator();
        let mut store = ElementStore::new();
        let a = store
            .add_element(&mut ids, "A", ElementPayload::folder(), StableId::INVALID)
            .unwrap();
        let b = store
            .add_element(&mut ids, "B", ElementPayload::folder(), a)
            .unwrap();

        assert_eq!(store.top_level_ids(), &[a]);
        assert_eq!(store.get_element(a).unwrap().child_ids(), &[b]);
        assert_eq!(store.get_element(b).unwrap().parent_id(), a);
        assert_eq!(store.generation(), 2);
    }

    #[test]
    fn test_add_under_missing_parent_fails_without_minting() {
        let mut ids = allocator();
        let mut store = ElementStore::new();
        let err = store
            .add_element(&mut ids, "X", ElementPayload::folder(), StableId::new(-5))
            .unwrap_err();
        assert!(matches!(err, DatastoresError::ParentNotFound { .. }));
        assert_eq!(ids.live_count(), 0);
        assert_eq!(store.generation(), 0);
    }

    #[test]
    fn test_add_rejects_id_already_in_store() {
        let mut first = IdAllocator::new(Box::new(SequenceEntropy::new([1])));
        let mut second = IdAllocator::new(Box::new(SequenceEntropy::new([1, 2])));
        let mut store = ElementStore::new();
        let a = store
            .add_element(&mut first, "A", ElementPayload::folder(), StableId::INVALID)
            .unwrap();
        let before = store.clone();

        let err = store
            .add_element(&mut second, "B", ElementPayload::folder(), StableId::INVALID)
            .unwrap_err();
        assert_eq!(
            err,
            DatastoresError::IdCollision {
                element_id: a.to_string()
            }
        );
        assert_eq!(store, before);
        assert!(second.is_live(a));

        // The colliding id stays reserved, so a retry mints a fresh one
        let b = store
            .add_element(&mut second, "B", ElementPayload::folder(), StableId::INVALID)
            .unwrap();
        assert_eq!(b, StableId::new(2));
        assert_eq!(store.top_level_ids(), &[a, b]);

        let json = serde_json::to_string(&store).unwrap();
        let back: ElementStore = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 2);
    }

    #[test]
    fn test_register_ids_reserves_loaded_elements() {
        let mut ids = allocator();
        let mut store = ElementStore::new();
        let a = store
            .add_element(&mut ids, "A", ElementPayload::folder(), StableId::INVALID)
            .unwrap();
        store
            .add_element(&mut ids, "B", ElementPayload::folder(), a)
            .unwrap();
        let loaded: ElementStore =
            serde_json::from_str(&serde_json::to_string(&store).unwrap()).unwrap();

        let mut fresh = allocator();
        assert_eq!(loaded.register_ids(&mut fresh), 0);
        assert_eq!(fresh.live_count(), 2);
        assert_eq!(fresh.allocate().unwrap(), StableId::new(3));
        assert_eq!(loaded.register_ids(&mut fresh), 2);
    }

    #[test]
    fn test_move_reorders_within_parent() {
        let mut ids = allocator();
        let mut store = ElementStore::new();
        let a = store
            .add_element(&mut ids, "A", ElementPayload::folder(), StableId::INVALID)
            .unwrap();
        let b = store
            .add_element(&mut ids, "B", ElementPayload::folder(), StableId::INVALID)
            .unwrap();
        store.move_element(b, StableId::INVALID, 0).unwrap();
        assert_eq!(store.top_level_ids(), &[b, a]);
    }

    #[test]
    fn test_move_to_self_is_cyclic() {
        let mut ids = allocator();
        let mut store = ElementStore::new();
        let a = store
            .add_element(&mut ids, "A", ElementPayload::folder(), StableId::INVALID)
            .unwrap();
        let before = store.clone();
        assert!(matches!(
            store.move_element(a, a, 0),
            Err(DatastoresError::CyclicMove { .. })
        ));
        assert_eq!(store, before);
    }

    #[test]
    fn test_depth_of() {
        let mut ids = allocator();
        let mut store = ElementStore::new();
        let a = store
            .add_element(&mut ids, "A", ElementPayload::folder(), StableId::INVALID)
            .unwrap();
        let b = store
            .add_element(&mut ids, "B", ElementPayload::folder(), a)
            .unwrap();
        assert_eq!(store.depth_of(a).unwrap(), 0);
        assert_eq!(store.depth_of(b).unwrap(), 1);
    }

    #[test]
    fn test_from_elements_rejects_dangling_child() {
        let mut root = Element::root();
        root.child_ids.push(StableId::new(9));
        let err = ElementStore::from_elements(vec![root]).unwrap_err();
        assert!(matches!(err, DatastoresError::CorruptStructure { .. }));
    }

    #[test]
    fn test_from_elements_rejects_parent_disagreement() {
        let mut root = Element::root();
        root.child_ids.push(StableId::new(1));
        let child = Element::new(
            StableId::new(1),
            "A",
            StableId::new(2),
            ElementPayload::folder(),
        );
        let err = ElementStore::from_elements(vec![root, child]).unwrap_err();
        assert!(matches!(err, DatastoresError::CorruptStructure { .. }));
    }

    #[test]
    fn test_from_elements_rejects_cycle() {
        let root = Element::root();
        let mut a = Element::new(
            StableId::new(1),
            "A",
            StableId::new(2),
            ElementPayload::folder(),
        );
        let mut b = Element::new(
            StableId::new(2),
            "B",
            StableId::new(1),
            ElementPayload::folder(),
        );
        a.child_ids.push(StableId::new(2));
        b.child_ids.push(StableId::new(1));
        let err = ElementStore::from_elements(vec![root, a, b]).unwrap_err();
        match err {
            DatastoresError::CorruptStructure { reason, .. } => {
                assert!(reason.contains("cycle"))
            }
            other => panic!("expected CorruptStructure, got {:?}", other),
        }
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let mut ids = allocator();
        let mut store = ElementStore::new();
        let a = store
            .add_element(&mut ids, "A", ElementPayload::folder(), StableId::INVALID)
            .unwrap();
        store
            .add_element(&mut ids, "B", ElementPayload::item("Weapon"), a)
            .unwrap();

        let json = serde_json::to_string(&store).unwrap();
        let back: ElementStore = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.top_level_ids(), store.top_level_ids());
    }
}
