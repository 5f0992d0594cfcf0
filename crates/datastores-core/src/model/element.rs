use serde::{Deserialize, Serialize};

use super::payload::ElementPayload;
use crate::stable_id::StableId;

/// A node of authored content.
///
/// The parent link and child list are maintained together by
/// [`crate::ops::ElementStore`] mutations and are read-only to everyone else,
/// so the two sides of the link cannot be set independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: StableId,
    pub display_name: String,
    pub(crate) parent_id: StableId,
    #[serde(default)]
    pub(crate) child_ids: Vec<StableId>,
    pub payload: ElementPayload,
}

impl Element {
    pub(crate) fn new(
        id: StableId,
        display_name: impl Into<String>,
        parent_id: StableId,
        payload: ElementPayload,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            parent_id,
            child_ids: Vec::new(),
            payload,
        }
    }

    pub(crate) fn root() -> Self {
        Self::new(
            StableId::INVALID,
            "Root",
            StableId::INVALID,
            ElementPayload::root(),
        )
    }

    /// Parent id; [`StableId::INVALID`] for elements at the top level
    pub fn parent_id(&self) -> StableId {
        self.parent_id
    }

    pub fn child_ids(&self) -> &[StableId] {
        &self.child_ids
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_invalid()
    }

    pub(crate) fn is_root_sentinel(&self) -> bool {
        self.id.is_invalid()
    }

    /// Insert `child` at `index`, or append when `index` is out of range or negative.
    pub(crate) fn insert_child_id(&mut self, child: StableId, index: i64) {
        if self.child_ids.contains(&child) {
            return;
        }
        match usize::try_from(index) {
            Ok(i) if i <= self.child_ids.len() => self.child_ids.insert(i, child),
            _ => self.child_ids.push(child),
        }
    }

    pub(crate) fn remove_child_id(&mut self, child: StableId) -> bool {
        let before = self.child_ids.len();
        self.child_ids.retain(|c| *c != child);
        before != self.child_ids.len()
    }
}
