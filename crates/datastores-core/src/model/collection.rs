//! A top-level content element owning its own element hierarchy.
//!
//! ## Logging Ownership
//!
//! `Collection` owns lifecycle logging for element mutations:
//! `log_op_start!` at entry, `log_op_end!` on success and `log_op_error!`
//! on failure. The store and materializer below it only use `tracing::debug!`
//! and `tracing::warn!`.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::model::{Element, ElementPayload};
use crate::ops::ElementStore;
use crate::stable_id::{IdAllocator, StableId};
use crate::tree::{TreeMaterializer, TreeNode};
use crate::{log_op_end, log_op_error, log_op_start};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub id: StableId,
    pub display_name: String,
    /// Collection kind; becomes a label on the collection's owner asset
    pub type_name: String,
    /// Content identifier of the collection's own asset
    #[serde(default)]
    pub content_id: String,
    /// Only runtime-supported collections opt into packaging
    #[serde(default)]
    pub runtime_supported: bool,
    #[serde(default)]
    store: ElementStore,
    #[serde(skip)]
    tree: TreeMaterializer,
}

impl Collection {
    /// Create an empty collection with a freshly minted id.
    ///
    /// # Errors
    ///
    /// `AllocationExhausted` if no id could be minted.
    pub fn create(
        ids: &mut IdAllocator,
        display_name: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Result<Self> {
        let id = ids.allocate()?;
        Ok(Self::with_id(id, display_name, type_name))
    }

    /// Build a collection around an existing id without touching an allocator
    pub fn with_id(
        id: StableId,
        display_name: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            type_name: type_name.into(),
            content_id: String::new(),
            runtime_supported: false,
            store: ElementStore::new(),
            tree: TreeMaterializer::new(),
        }
    }

    pub fn with_content_id(mut self, content_id: impl Into<String>) -> Self {
        self.content_id = content_id.into();
        self
    }

    pub fn with_runtime_supported(mut self, supported: bool) -> Self {
        self.runtime_supported = supported;
        self
    }

    /// Replace the element store, e.g. after hydrating it from disk
    pub fn with_store(mut self, store: ElementStore) -> Self {
        self.store = store;
        self.tree.invalidate();
        self
    }

    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    pub fn get_element(&self, id: StableId) -> Result<&Element> {
        self.store.get_element(id)
    }

    /// Add an element under `parent_id` (`StableId::INVALID` for top level).
    ///
    /// # Errors
    ///
    /// `ParentNotFound` or `AllocationExhausted`; the store is unchanged.
    pub fn add_element(
        &mut self,
        ids: &mut IdAllocator,
        display_name: impl Into<String>,
        payload: ElementPayload,
        parent_id: StableId,
    ) -> Result<StableId> {
        log_op_start!(
            "add_element",
            collection_id = %self.id,
            parent_id = %parent_id
        );
        let start = Instant::now();

        let id = self
            .store
            .add_element(ids, display_name, payload, parent_id)
            .map_err(|e| {
                log_op_error!(
                    "add_element",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64
                );
                e
            })?;

        log_op_end!(
            "add_element",
            duration_ms = start.elapsed().as_millis() as u64,
            element_id = %id
        );
        Ok(id)
    }

    /// Delete `id` and its whole subtree, retiring every removed id.
    ///
    /// # Errors
    ///
    /// `ElementNotFound`; the store is unchanged.
    pub fn delete_element(&mut self, ids: &mut IdAllocator, id: StableId) -> Result<Vec<StableId>> {
        log_op_start!("delete_element", collection_id = %self.id, element_id = %id);
        let start = Instant::now();

        let removed = self.store.delete_element(ids, id).map_err(|e| {
            log_op_error!(
                "delete_element",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "delete_element",
            duration_ms = start.elapsed().as_millis() as u64,
            element_count = removed.len()
        );
        Ok(removed)
    }

    /// Reparent `id` under `new_parent_id` at `child_index`.
    ///
    /// # Errors
    ///
    /// `ElementNotFound`, `ParentNotFound`, `CyclicMove` or
    /// `ParentChainTooDeep`; the store is unchanged.
    pub fn move_element(
        &mut self,
        id: StableId,
        new_parent_id: StableId,
        child_index: i64,
    ) -> Result<()> {
        log_op_start!(
            "move_element",
            collection_id = %self.id,
            element_id = %id,
            parent_id = %new_parent_id
        );
        let start = Instant::now();

        self.store
            .move_element(id, new_parent_id, child_index)
            .map_err(|e| {
                log_op_error!(
                    "move_element",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64
                );
                e
            })?;

        log_op_end!(
            "move_element",
            duration_ms = start.elapsed().as_millis() as u64
        );
        Ok(())
    }

    /// # Errors
    ///
    /// `ElementNotFound`.
    pub fn rename_element(&mut self, id: StableId, display_name: impl Into<String>) -> Result<()> {
        log_op_start!("rename_element", collection_id = %self.id, element_id = %id);
        let start = Instant::now();

        self.store.rename_element(id, display_name).map_err(|e| {
            log_op_error!(
                "rename_element",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "rename_element",
            duration_ms = start.elapsed().as_millis() as u64
        );
        Ok(())
    }

    /// Replace an element's kind and bundle assets.
    ///
    /// # Errors
    ///
    /// `ElementNotFound`.
    pub fn set_payload(&mut self, id: StableId, payload: ElementPayload) -> Result<()> {
        log_op_start!(
            "set_payload",
            collection_id = %self.id,
            element_id = %id,
            asset_count = payload.bundle_assets.len()
        );
        let start = Instant::now();

        self.store.set_payload(id, payload).map_err(|e| {
            log_op_error!(
                "set_payload",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "set_payload",
            duration_ms = start.elapsed().as_millis() as u64
        );
        Ok(())
    }

    pub fn get_roots(&mut self) -> &[TreeNode] {
        self.tree.get_roots(&self.store)
    }

    pub fn get_tree_node(&mut self, id: StableId) -> Option<&TreeNode> {
        self.tree.get_tree_node(&self.store, id)
    }

    /// All elements, depth-first pre-order over the materialized forest
    pub fn get_all_elements(&mut self) -> Vec<&Element> {
        self.tree.get_all_elements(&self.store)
    }

    /// Element ids in tree pre-order, without materializing
    pub fn element_ids_preorder(&self) -> Vec<StableId> {
        let mut out = Vec::with_capacity(self.store.len());
        for &top in self.store.top_level_ids() {
            if let Ok(ids) = self.store.subtree_ids(top) {
                out.extend(ids);
            }
        }
        out
    }
}
