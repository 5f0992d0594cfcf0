//! Packaging backend interfaces and an in-memory implementation.
//!
//! The reconciler reads the persisted layout through [`LayoutReader`] and
//! changes it only through [`LayoutWriter`]. Implementations must return
//! results in a deterministic order.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::errors::{DatastoresError, Result};

/// A persisted asset entry as the packaging backend reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedEntry {
    pub content_id: String,
    pub address: String,
    pub group: String,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    /// Entries nested inside another asset are never removed by the reconciler
    #[serde(default)]
    pub is_sub_asset: bool,
}

impl PersistedEntry {
    pub fn new(
        content_id: impl Into<String>,
        address: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            content_id: content_id.into(),
            address: address.into(),
            group: group.into(),
            labels: BTreeSet::new(),
            is_sub_asset: false,
        }
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn as_sub_asset(mut self) -> Self {
        self.is_sub_asset = true;
        self
    }
}

/// Read side of the persisted packaging layout
pub trait LayoutReader {
    fn find_asset_entry(&self, content_id: &str) -> Option<PersistedEntry>;

    /// Every group name, sorted
    fn list_groups(&self) -> Vec<String>;

    /// Entries of `group`, sorted by content id
    fn group_entries(&self, group: &str) -> Vec<PersistedEntry>;

    fn has_template(&self, template: &str) -> bool;

    /// Groups whose name starts with the managed `prefix`
    fn list_managed_groups(&self, prefix: &str) -> Vec<String> {
        self.list_groups()
            .into_iter()
            .filter(|g| g.starts_with(prefix))
            .collect()
    }
}

/// Write side of the persisted packaging layout
pub trait LayoutWriter: LayoutReader {
    /// # Errors
    ///
    /// `Backend` if the group exists or the template is unknown.
    fn create_group(&mut self, name: &str, template: &str) -> Result<()>;

    /// Remove a group together with the entries still in it.
    ///
    /// # Errors
    ///
    /// `Backend` if the backend rejects the removal.
    fn remove_group(&mut self, name: &str) -> Result<()>;

    /// Create the entry or move it into `group`, and set its address.
    ///
    /// # Errors
    ///
    /// `Backend` if `group` does not exist.
    fn create_or_move_entry(&mut self, content_id: &str, group: &str, address: &str)
        -> Result<()>;

    /// Returns `false` when there was no entry to remove.
    ///
    /// # Errors
    ///
    /// `Backend` if the backend rejects the removal.
    fn remove_entry(&mut self, content_id: &str) -> Result<bool>;

    /// Replace the entry's label set.
    ///
    /// # Errors
    ///
    /// `Backend` if there is no entry for `content_id`.
    fn set_labels(&mut self, content_id: &str, labels: &BTreeSet<String>) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    #[serde(default)]
    pub template: String,
}

/// Map-backed packaging layout.
///
/// Uses `BTreeMap`/`BTreeSet` for deterministic iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryLayout {
    #[serde(default)]
    templates: BTreeSet<String>,
    #[serde(default)]
    groups: BTreeMap<String, GroupRecord>,
    /// Entries keyed by content id
    #[serde(default)]
    entries: BTreeMap<String, PersistedEntry>,
}

impl InMemoryLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.templates.insert(template.into());
        self
    }

    pub fn with_group(mut self, name: impl Into<String>) -> Self {
        self.groups.entry(name.into()).or_default();
        self
    }

    /// Insert an entry, creating its group if needed
    pub fn with_entry(mut self, entry: PersistedEntry) -> Self {
        self.groups.entry(entry.group.clone()).or_default();
        self.entries.insert(entry.content_id.clone(), entry);
        self
    }

    pub fn add_template(&mut self, template: impl Into<String>) {
        self.templates.insert(template.into());
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn entries(&self) -> impl Iterator<Item = &PersistedEntry> {
        self.entries.values()
    }
}

fn backend_error(op: &str, target: &str, reason: impl Into<String>) -> DatastoresError {
    DatastoresError::Backend {
        op: op.to_string(),
        target: target.to_string(),
        reason: reason.into(),
    }
}

impl LayoutReader for InMemoryLayout {
    fn find_asset_entry(&self, content_id: &str) -> Option<PersistedEntry> {
        self.entries.get(content_id).cloned()
    }

    fn list_groups(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }

    fn group_entries(&self, group: &str) -> Vec<PersistedEntry> {
        self.entries
            .values()
            .filter(|e| e.group == group)
            .cloned()
            .collect()
    }

    fn has_template(&self, template: &str) -> bool {
        self.templates.contains(template)
    }
}

impl LayoutWriter for InMemoryLayout {
    fn create_group(&mut self, name: &str, template: &str) -> Result<()> {
        if self.groups.contains_key(name) {
            return Err(backend_error("create_group", name, "group already exists"));
        }
        if !self.templates.contains(template) {
            return Err(backend_error(
                "create_group",
                name,
                format!("unknown template '{template}'"),
            ));
        }
        self.groups.insert(
            name.to_string(),
            GroupRecord {
                template: template.to_string(),
            },
        );
        Ok(())
    }

    fn remove_group(&mut self, name: &str) -> Result<()> {
        if self.groups.remove(name).is_some() {
            self.entries.retain(|_, e| e.group != name);
        }
        Ok(())
    }

    fn create_or_move_entry(
        &mut self,
        content_id: &str,
        group: &str,
        address: &str,
    ) -> Result<()> {
        if !self.groups.contains_key(group) {
            return Err(backend_error(
                "create_or_move_entry",
                content_id,
                format!("group '{group}' does not exist"),
            ));
        }
        let entry = self
            .entries
            .entry(content_id.to_string())
            .or_insert_with(|| PersistedEntry::new(content_id, address, group));
        entry.group = group.to_string();
        entry.address = address.to_string();
        Ok(())
    }

    fn remove_entry(&mut self, content_id: &str) -> Result<bool> {
        Ok(self.entries.remove(content_id).is_some())
    }

    fn set_labels(&mut self, content_id: &str, labels: &BTreeSet<String>) -> Result<()> {
        let entry = self
            .entries
            .get_mut(content_id)
            .ok_or_else(|| backend_error("set_labels", content_id, "no entry"))?;
        entry.labels = labels.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_group_requires_known_template() {
        let mut layout = InMemoryLayout::new().with_template("Packed Assets");
        assert!(layout.create_group("G", "Packed Assets").is_ok());
        assert!(layout.create_group("G", "Packed Assets").is_err());
        let err = layout.create_group("H", "Other").unwrap_err();
        assert!(matches!(err, DatastoresError::Backend { .. }));
    }

    #[test]
    fn test_create_or_move_keeps_labels() {
        let mut layout = InMemoryLayout::new()
            .with_group("G2")
            .with_entry(PersistedEntry::new("y", "old", "G1").with_labels(["a"]));

        layout.create_or_move_entry("y", "G2", "old").unwrap();
        let entry = layout.find_asset_entry("y").unwrap();
        assert_eq!(entry.group, "G2");
        assert!(entry.labels.contains("a"));
    }

    #[test]
    fn test_remove_group_drops_its_entries() {
        let mut layout = InMemoryLayout::new()
            .with_entry(PersistedEntry::new("a", "A", "G1"))
            .with_entry(PersistedEntry::new("b", "B", "G2"));

        layout.remove_group("G1").unwrap();
        assert_eq!(layout.list_groups(), vec!["G2".to_string()]);
        assert!(layout.find_asset_entry("a").is_none());
        assert!(layout.find_asset_entry("b").is_some());
    }

    #[test]
    fn test_managed_groups_filter_by_prefix() {
        let layout = InMemoryLayout::new()
            .with_group("[Managed] one")
            .with_group("Default Local Group");
        assert_eq!(
            layout.list_managed_groups("[Managed] "),
            vec!["[Managed] one".to_string()]
        );
    }

    #[test]
    fn test_set_labels_on_missing_entry_fails() {
        let mut layout = InMemoryLayout::new();
        assert!(layout.set_labels("nope", &BTreeSet::new()).is_err());
        assert!(!layout.remove_entry("nope").unwrap());
    }
}
