//! Workspace file: every collection with its element hierarchy, as JSON.
//!
//! Element stores are validated while decoding (a store that breaks the
//! parent/child invariants fails to load). Saving stamps `saved_at` and goes
//! through [`atomic_write`].

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use datastores_core::{Collection, StableId};
use serde::{Deserialize, Serialize};

use crate::atomic::atomic_write;
use crate::errors::{invalid_file, io_error, parse_error, Result};

/// Current on-disk format
pub const WORKSPACE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceFile {
    pub format_version: u32,
    /// Time of the last successful save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub collections: Vec<Collection>,
}

impl Default for WorkspaceFile {
    fn default() -> Self {
        Self {
            format_version: WORKSPACE_FORMAT_VERSION,
            saved_at: None,
            collections: Vec::new(),
        }
    }
}

impl WorkspaceFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection(&self, id: StableId) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id == id)
    }

    pub fn collection_mut(&mut self, id: StableId) -> Option<&mut Collection> {
        self.collections.iter_mut().find(|c| c.id == id)
    }

    /// Collection whose store contains element `id`
    pub fn owner_of(&self, element: StableId) -> Option<StableId> {
        self.collections
            .iter()
            .find(|c| c.store().contains(element))
            .map(|c| c.id)
    }

    pub fn element_count(&self) -> usize {
        self.collections.iter().map(|c| c.store().len()).sum()
    }
}

/// Load and validate a workspace file.
///
/// # Errors
///
/// `Io` if the file cannot be read, `Serialization` if it does not decode
/// (including element stores that violate the hierarchy invariants) and
/// `InvalidInput` for an unsupported format version or duplicate collection
/// ids.
pub fn load_workspace(path: &Path) -> Result<WorkspaceFile> {
    let text = fs::read_to_string(path).map_err(|e| io_error("load_workspace", path, e))?;
    let workspace: WorkspaceFile =
        serde_json::from_str(&text).map_err(|e| parse_error("load_workspace", path, e))?;

    if workspace.format_version != WORKSPACE_FORMAT_VERSION {
        return Err(invalid_file(
            "load_workspace",
            path,
            format!(
                "unsupported format_version {}; expected {}",
                workspace.format_version, WORKSPACE_FORMAT_VERSION
            ),
        ));
    }

    let mut ids = BTreeSet::new();
    for collection in &workspace.collections {
        if !ids.insert(collection.id) {
            return Err(invalid_file(
                "load_workspace",
                path,
                format!("duplicate collection id {}", collection.id),
            ));
        }
    }

    tracing::debug!(
        path = %path.display(),
        collection_count = workspace.collections.len(),
        element_count = workspace.element_count(),
        "Loaded workspace"
    );
    Ok(workspace)
}

/// Load `path`, or start an empty workspace if the file does not exist yet.
///
/// # Errors
///
/// As [`load_workspace`] for an existing file.
pub fn load_or_default(path: &Path) -> Result<WorkspaceFile> {
    if path.exists() {
        load_workspace(path)
    } else {
        Ok(WorkspaceFile::new())
    }
}

/// Stamp `saved_at` and write the workspace atomically.
///
/// # Errors
///
/// `Serialization` if encoding fails, `Io` if the write fails. On failure the
/// previous file is left in place.
pub fn save_workspace(path: &Path, workspace: &mut WorkspaceFile) -> Result<DateTime<Utc>> {
    let saved_at = Utc::now();
    workspace.saved_at = Some(saved_at);

    let json = serde_json::to_vec_pretty(workspace)
        .map_err(|e| parse_error("save_workspace", path, e))?;
    atomic_write(path, &json)?;

    tracing::debug!(
        path = %path.display(),
        size_bytes = json.len(),
        collection_count = workspace.collections.len(),
        "Saved workspace"
    );
    Ok(saved_at)
}
