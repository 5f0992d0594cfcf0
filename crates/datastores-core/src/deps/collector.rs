//! Bundle asset collection with pass-wide deduplication.
//!
//! One collector spans one reconciliation pass. The first occurrence of a
//! content id decides which group it lands in; later occurrences only merge
//! the referencing element's id into its label set. Dependency cycles end at
//! the dedup check.

use std::collections::{BTreeMap, BTreeSet};

use super::graph::DependencyGraph;
use crate::config::ReconcilerConfig;
use crate::errors::DatastoresError;
use crate::model::{Collection, Element};
use crate::stable_id::{display_form, IdAllocator, StableId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetOrigin {
    /// The collection's own asset
    Owner,
    /// Declared directly by an element
    Bundled,
    /// Reached through the dependency walk
    Dependency,
}

/// A deduplicated packagable asset with the labels accumulated so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRef {
    pub content_id: String,
    pub origin: AssetOrigin,
    pub labels: BTreeSet<String>,
}

pub struct DependencyCollector<'a> {
    graph: &'a dyn DependencyGraph,
    config: &'a ReconcilerConfig,
    ids: Option<&'a IdAllocator>,
    seen: BTreeMap<String, BTreeSet<String>>,
    issues: Vec<DatastoresError>,
}

impl<'a> DependencyCollector<'a> {
    pub fn new(graph: &'a dyn DependencyGraph, config: &'a ReconcilerConfig) -> Self {
        Self {
            graph,
            config,
            ids: None,
            seen: BTreeMap::new(),
            issues: Vec::new(),
        }
    }

    /// Read id labels from the allocator's memo instead of re-encoding them
    pub fn with_ids(mut self, ids: &'a IdAllocator) -> Self {
        self.ids = Some(ids);
        self
    }

    /// The collection's own asset followed by its transitive dependencies.
    ///
    /// Returns nothing when the collection has no content id, or when another
    /// collection already claimed that asset; the collection id is merged into
    /// its labels in that case.
    pub fn collect_owner_asset(&mut self, collection: &Collection) -> Vec<ContentRef> {
        let mut out = Vec::new();
        let content_id = collection.content_id.as_str();
        if content_id.trim().is_empty() {
            return out;
        }
        if self.merge_label(content_id, collection.id) {
            return out;
        }

        let labels = BTreeSet::from([collection.type_name.clone()]);
        if self.record(collection.id, content_id, AssetOrigin::Owner, labels, &mut out) {
            self.walk_dependencies(collection.id, content_id, collection.id, &mut out);
        }
        out
    }

    /// Assets declared by `element` plus their transitive dependencies.
    ///
    /// `owner` is the collection whose group receives first-seen assets.
    /// Assets already seen in this pass are not returned again; the element
    /// id is merged into their labels instead.
    pub fn collect_bundle_assets(&mut self, owner: StableId, element: &Element) -> Vec<ContentRef> {
        let mut out = Vec::new();

        for asset in element.payload.assets_to_bundle() {
            if self.merge_label(&asset.content_id, element.id) {
                continue;
            }

            let mut labels =
                BTreeSet::from([self.config.bundled_prefix.clone(), self.id_label(element.id)]);
            labels.extend(asset.labels.iter().cloned());
            if self.record(owner, &asset.content_id, AssetOrigin::Bundled, labels, &mut out) {
                self.walk_dependencies(owner, &asset.content_id, element.id, &mut out);
            }
        }
        out
    }

    /// Labels accumulated for `content_id` in this pass
    pub fn labels_for(&self, content_id: &str) -> Option<&BTreeSet<String>> {
        self.seen.get(content_id)
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Non-fatal problems met while walking
    pub fn issues(&self) -> &[DatastoresError] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<DatastoresError> {
        self.issues
    }

    fn id_label(&self, id: StableId) -> String {
        display_form(self.ids, id).into_owned()
    }

    /// Add `referencing` to the labels of an already seen asset.
    /// Returns `false` if the asset is new to this pass.
    fn merge_label(&mut self, content_id: &str, referencing: StableId) -> bool {
        if !self.seen.contains_key(content_id) {
            return false;
        }
        let label = self.id_label(referencing);
        if let Some(labels) = self.seen.get_mut(content_id) {
            labels.insert(label);
        }
        true
    }

    /// Register a first-seen asset. Returns `false` if it was already known.
    fn record(
        &mut self,
        owner: StableId,
        content_id: &str,
        origin: AssetOrigin,
        mut labels: BTreeSet<String>,
        out: &mut Vec<ContentRef>,
    ) -> bool {
        if self.seen.contains_key(content_id) {
            return false;
        }
        labels.insert(self.id_label(owner));
        self.seen.insert(content_id.to_string(), labels.clone());
        out.push(ContentRef {
            content_id: content_id.to_string(),
            origin,
            labels,
        });
        true
    }

    fn walk_dependencies(
        &mut self,
        owner: StableId,
        root: &str,
        referencing: StableId,
        out: &mut Vec<ContentRef>,
    ) {
        let referencing_label = self.id_label(referencing);
        let mut stack: Vec<(String, usize)> = vec![(root.to_string(), 0)];

        while let Some((current, depth)) = stack.pop() {
            let dependencies = self.graph.direct_dependencies(&current);
            if dependencies.is_empty() {
                continue;
            }
            if depth >= self.config.max_walk_depth {
                tracing::warn!(
                    content_id = %current,
                    limit = self.config.max_walk_depth,
                    "dependency walk truncated"
                );
                self.issues.push(DatastoresError::DependencyWalkTruncated {
                    content_id: current,
                    limit: self.config.max_walk_depth,
                });
                continue;
            }

            let mut next = Vec::new();
            for dependency in dependencies {
                if dependency.trim().is_empty() || self.graph.is_source(&dependency) {
                    continue;
                }
                if let Some(labels) = self.seen.get_mut(&dependency) {
                    labels.insert(referencing_label.clone());
                    continue;
                }
                if self.graph.content_size(&dependency) < self.config.minimum_content_size {
                    tracing::debug!(content_id = %dependency, "dependency below size threshold; inlined");
                    continue;
                }

                let labels = BTreeSet::from([
                    self.config.dependency_prefix.clone(),
                    referencing_label.clone(),
                ]);
                self.record(owner, &dependency, AssetOrigin::Dependency, labels, out);
                next.push((dependency, depth + 1));
            }
            stack.extend(next.into_iter().rev());
        }
    }
}
