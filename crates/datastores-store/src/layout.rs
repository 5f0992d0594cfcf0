//! Packaging layout persisted as a JSON file.
//!
//! [`FsLayoutStore`] loads the whole layout into an [`InMemoryLayout`],
//! serves the reconciler's reads and writes from memory, and writes the file
//! back only on [`FsLayoutStore::save`].

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use datastores_core::bundle::{InMemoryLayout, LayoutReader, LayoutWriter, PersistedEntry};
use datastores_core::errors::Result as CoreResult;

use crate::atomic::atomic_write;
use crate::errors::{io_error, parse_error, Result};

#[derive(Debug)]
pub struct FsLayoutStore {
    path: PathBuf,
    layout: InMemoryLayout,
    dirty: bool,
}

impl FsLayoutStore {
    /// Load the layout at `path`.
    ///
    /// A missing file starts an empty layout that already offers `template`,
    /// so the first apply can create groups.
    ///
    /// # Errors
    ///
    /// `Io` if an existing file cannot be read, `Serialization` if it does
    /// not decode.
    pub fn open(path: impl Into<PathBuf>, template: &str) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No layout file; starting empty");
            return Ok(Self {
                path,
                layout: InMemoryLayout::new().with_template(template),
                dirty: false,
            });
        }

        let text = fs::read_to_string(&path).map_err(|e| io_error("load_layout", &path, e))?;
        let layout: InMemoryLayout =
            serde_json::from_str(&text).map_err(|e| parse_error("load_layout", &path, e))?;
        tracing::debug!(
            path = %path.display(),
            group_count = layout.group_count(),
            entry_count = layout.entry_count(),
            "Loaded layout"
        );
        Ok(Self {
            path,
            layout,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> &InMemoryLayout {
        &self.layout
    }

    /// True when a write happened since the last load or save
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the layout back atomically.
    ///
    /// # Errors
    ///
    /// `Serialization` if encoding fails, `Io` if the write fails.
    pub fn save(&mut self) -> Result<()> {
        let json = serde_json::to_vec_pretty(&self.layout)
            .map_err(|e| parse_error("save_layout", &self.path, e))?;
        atomic_write(&self.path, &json)?;
        self.dirty = false;
        tracing::debug!(
            path = %self.path.display(),
            size_bytes = json.len(),
            "Saved layout"
        );
        Ok(())
    }

    fn touched<T>(&mut self, outcome: CoreResult<T>) -> CoreResult<T> {
        if outcome.is_ok() {
            self.dirty = true;
        }
        outcome
    }
}

impl LayoutReader for FsLayoutStore {
    fn find_asset_entry(&self, content_id: &str) -> Option<PersistedEntry> {
        self.layout.find_asset_entry(content_id)
    }

    fn list_groups(&self) -> Vec<String> {
        self.layout.list_groups()
    }

    fn group_entries(&self, group: &str) -> Vec<PersistedEntry> {
        self.layout.group_entries(group)
    }

    fn has_template(&self, template: &str) -> bool {
        self.layout.has_template(template)
    }
}

impl LayoutWriter for FsLayoutStore {
    fn create_group(&mut self, name: &str, template: &str) -> CoreResult<()> {
        let outcome = self.layout.create_group(name, template);
        self.touched(outcome)
    }

    fn remove_group(&mut self, name: &str) -> CoreResult<()> {
        let outcome = self.layout.remove_group(name);
        self.touched(outcome)
    }

    fn create_or_move_entry(
        &mut self,
        content_id: &str,
        group: &str,
        address: &str,
    ) -> CoreResult<()> {
        let outcome = self.layout.create_or_move_entry(content_id, group, address);
        self.touched(outcome)
    }

    fn remove_entry(&mut self, content_id: &str) -> CoreResult<bool> {
        let outcome = self.layout.remove_entry(content_id);
        self.touched(outcome)
    }

    fn set_labels(&mut self, content_id: &str, labels: &BTreeSet<String>) -> CoreResult<()> {
        let outcome = self.layout.set_labels(content_id, labels);
        self.touched(outcome)
    }
}
