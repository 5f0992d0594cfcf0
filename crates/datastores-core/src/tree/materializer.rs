use std::collections::HashMap;

use crate::model::Element;
use crate::ops::ElementStore;
use crate::stable_id::StableId;

/// A materialized element with its children.
///
/// `view_index` is dense within one materialization pass and is not stable
/// across rebuilds.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub element: Element,
    pub view_index: usize,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn id(&self) -> StableId {
        self.element.id
    }

    /// Child ids in materialized order
    pub fn child_ids(&self) -> Vec<StableId> {
        self.children.iter().map(TreeNode::id).collect()
    }
}

/// Output of one materialization pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterializedTree {
    pub roots: Vec<TreeNode>,
    pub view_indices: HashMap<StableId, usize>,
}

/// Build the forest for `store` from its flat parent/child links.
///
/// View indices are assigned over top-level elements first, then all others,
/// each in declaration order. Construction runs bottom-up: a traversal stack
/// seeded with the root sentinel feeds a creation-order stack, so popping the
/// latter always sees children before their parent.
pub fn materialize(store: &ElementStore) -> MaterializedTree {
    let raw = store.raw_elements();

    let mut view_indices = HashMap::with_capacity(raw.len());
    let (top_level, nested): (Vec<&Element>, Vec<&Element>) = raw
        .iter()
        .filter(|e| !e.id.is_invalid())
        .partition(|e| e.is_top_level());
    for (counter, element) in top_level.iter().chain(nested.iter()).enumerate() {
        view_indices.insert(element.id, counter);
    }

    let lookup: HashMap<StableId, &Element> = raw.iter().map(|e| (e.id, e)).collect();

    let mut traversal: Vec<&Element> = Vec::new();
    let mut create_order: Vec<&Element> = Vec::new();
    if let Some(root) = lookup.get(&StableId::INVALID) {
        traversal.push(root);
    }
    while let Some(element) = traversal.pop() {
        create_order.push(element);
        for child_id in &element.child_ids {
            match lookup.get(child_id) {
                Some(child) => traversal.push(child),
                None => tracing::warn!(
                    element_id = %element.id,
                    child_id = %child_id,
                    "child id has no element; skipped during materialization"
                ),
            }
        }
    }

    let mut built: HashMap<StableId, TreeNode> = HashMap::with_capacity(create_order.len());
    let mut sentinel_children = Vec::new();
    while let Some(element) = create_order.pop() {
        let children: Vec<TreeNode> = element
            .child_ids
            .iter()
            .filter_map(|child_id| built.remove(child_id))
            .collect();

        if element.is_root_sentinel() {
            sentinel_children = children;
            continue;
        }

        let node = TreeNode {
            element: element.clone(),
            view_index: view_indices.get(&element.id).copied().unwrap_or_default(),
            children,
        };
        built.insert(element.id, node);
    }

    MaterializedTree {
        roots: sentinel_children,
        view_indices,
    }
}

#[derive(Debug, Clone)]
struct CachedTree {
    generation: u64,
    tree: MaterializedTree,
}

/// Lazily rebuilt cache of the materialized forest.
///
/// The cache is keyed on the store's mutation generation, so any mutation
/// makes the next read rebuild. An empty cached forest is also treated as
/// stale. There is no incremental update.
#[derive(Debug, Clone, Default)]
pub struct TreeMaterializer {
    cache: Option<CachedTree>,
}

impl TreeMaterializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the cached forest
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Whether the cache is usable for `store` without a rebuild
    pub fn is_fresh(&self, store: &ElementStore) -> bool {
        matches!(
            &self.cache,
            Some(c) if c.generation == store.generation() && !c.tree.roots.is_empty()
        )
    }

    fn ensure(&mut self, store: &ElementStore) -> &MaterializedTree {
        if !self.is_fresh(store) {
            self.cache = None;
        }
        let cached = self.cache.get_or_insert_with(|| {
            tracing::debug!(
                element_count = store.len(),
                generation = store.generation(),
                "rebuilding materialized tree"
            );
            CachedTree {
                generation: store.generation(),
                tree: materialize(store),
            }
        });
        &cached.tree
    }

    /// Top-level tree nodes (the root sentinel is never surfaced)
    pub fn get_roots(&mut self, store: &ElementStore) -> &[TreeNode] {
        &self.ensure(store).roots
    }

    /// Find the materialized node for `id`
    pub fn get_tree_node(&mut self, store: &ElementStore, id: StableId) -> Option<&TreeNode> {
        let mut stack: Vec<&TreeNode> = self.ensure(store).roots.iter().rev().collect();
        while let Some(node) = stack.pop() {
            if node.id() == id {
                return Some(node);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Every materialized element, depth-first pre-order
    pub fn get_all_elements(&mut self, store: &ElementStore) -> Vec<&Element> {
        let mut out = Vec::new();
        let mut stack: Vec<&TreeNode> = self.ensure(store).roots.iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(&node.element);
            stack.extend(node.children.iter().rev());
        }
        out
    }
}
