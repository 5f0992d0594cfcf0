//! Desired packaging layout and reconcile action types.
//!
//! Collections use `BTreeSet`/`BTreeMap` and ordered `Vec`s so that serialized
//! output and digests are deterministic.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use crate::errors::DatastoresError;
use crate::stable_id::StableId;

/// One asset the layout should contain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredAsset {
    pub content_id: String,
    /// Addressable name
    pub address: String,
    pub labels: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredGroup {
    pub name: String,
    /// Collection the group was derived from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<StableId>,
    pub members: Vec<DesiredAsset>,
}

impl DesiredGroup {
    pub fn new(name: impl Into<String>, owner_id: Option<StableId>) -> Self {
        Self {
            name: name.into(),
            owner_id,
            members: Vec::new(),
        }
    }

    pub fn member(&self, content_id: &str) -> Option<&DesiredAsset> {
        self.members.iter().find(|m| m.content_id == content_id)
    }
}

/// Packaging layout computed purely from current content.
///
/// `issues` are non-fatal: the groups are still usable, but an operator
/// should resolve them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesiredState {
    pub groups: Vec<DesiredGroup>,
    pub issues: Vec<DatastoresError>,
}

impl DesiredState {
    pub fn group(&self, name: &str) -> Option<&DesiredGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Every desired content id across all groups
    pub fn content_ids(&self) -> BTreeSet<&str> {
        self.groups
            .iter()
            .flat_map(|g| g.members.iter())
            .map(|m| m.content_id.as_str())
            .collect()
    }

    pub fn member_count(&self) -> usize {
        self.groups.iter().map(|g| g.members.len()).sum()
    }

    /// SHA-256 (hex) of the canonical JSON of the groups.
    ///
    /// Issues are not part of the digest.
    pub fn digest(&self) -> String {
        let canonical = serde_json::to_string(&self.groups).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Classification of a [`ReconcileAction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOp {
    Add,
    Remove,
    Move,
    Rename,
    RelabelOnly,
}

/// A single unit of change toward the desired layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReconcileAction {
    AddGroup {
        group: String,
    },
    RemoveGroup {
        group: String,
    },
    AddAsset {
        content_id: String,
        address: String,
        group: String,
        labels: BTreeSet<String>,
    },
    RenameAsset {
        content_id: String,
        from_address: String,
        address: String,
        group: String,
        labels: BTreeSet<String>,
    },
    MoveAsset {
        content_id: String,
        address: String,
        from_group: String,
        group: String,
        labels: BTreeSet<String>,
    },
    RelabelAsset {
        content_id: String,
        address: String,
        group: String,
        labels: BTreeSet<String>,
    },
    RemoveAsset {
        content_id: String,
        address: String,
        group: String,
    },
}

impl ReconcileAction {
    pub fn op(&self) -> ActionOp {
        match self {
            ReconcileAction::AddGroup { .. } | ReconcileAction::AddAsset { .. } => ActionOp::Add,
            ReconcileAction::RemoveGroup { .. } | ReconcileAction::RemoveAsset { .. } => {
                ActionOp::Remove
            }
            ReconcileAction::RenameAsset { .. } => ActionOp::Rename,
            ReconcileAction::MoveAsset { .. } => ActionOp::Move,
            ReconcileAction::RelabelAsset { .. } => ActionOp::RelabelOnly,
        }
    }

    pub fn is_group_action(&self) -> bool {
        matches!(
            self,
            ReconcileAction::AddGroup { .. } | ReconcileAction::RemoveGroup { .. }
        )
    }

    /// Group name for group actions, content id for asset actions
    pub fn target(&self) -> &str {
        match self {
            ReconcileAction::AddGroup { group } | ReconcileAction::RemoveGroup { group } => group,
            ReconcileAction::AddAsset { content_id, .. }
            | ReconcileAction::RenameAsset { content_id, .. }
            | ReconcileAction::MoveAsset { content_id, .. }
            | ReconcileAction::RelabelAsset { content_id, .. }
            | ReconcileAction::RemoveAsset { content_id, .. } => content_id,
        }
    }

    /// Group the action lands in (for removals, the group it leaves)
    pub fn group(&self) -> &str {
        match self {
            ReconcileAction::AddGroup { group }
            | ReconcileAction::RemoveGroup { group }
            | ReconcileAction::AddAsset { group, .. }
            | ReconcileAction::RenameAsset { group, .. }
            | ReconcileAction::MoveAsset { group, .. }
            | ReconcileAction::RelabelAsset { group, .. }
            | ReconcileAction::RemoveAsset { group, .. } => group,
        }
    }
}

/// Output of a diff: the ordered actions plus any non-fatal issues
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
    pub actions: Vec<ReconcileAction>,
    pub issues: Vec<DatastoresError>,
}

impl ReconcilePlan {
    /// True when no action is needed
    pub fn is_converged(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn count_by_op(&self) -> BTreeMap<ActionOp, usize> {
        let mut counts = BTreeMap::new();
        for action in &self.actions {
            *counts.entry(action.op()).or_insert(0) += 1;
        }
        counts
    }

    /// Actions touching `content_id` (asset actions only)
    pub fn actions_for(&self, content_id: &str) -> Vec<&ReconcileAction> {
        self.actions
            .iter()
            .filter(|a| !a.is_group_action() && a.target() == content_id)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedAction {
    pub action: ReconcileAction,
    pub reason: String,
}

/// Outcome of applying a plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub applied: Vec<ReconcileAction>,
    pub skipped: Vec<SkippedAction>,
}

impl ApplyReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}
