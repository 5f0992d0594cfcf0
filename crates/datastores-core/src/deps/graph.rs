use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// File-level dependency lookup supplied by the host.
pub trait DependencyGraph {
    /// Content ids referenced directly by `content_id`, in a stable order
    fn direct_dependencies(&self, content_id: &str) -> Vec<String>;

    /// Size of the content in bytes; unknown content reports 0
    fn content_size(&self, content_id: &str) -> u64;

    /// Source and code files are never bundled
    fn is_source(&self, _content_id: &str) -> bool {
        false
    }
}

/// One node of an [`InMemoryGraph`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentNode {
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub source: bool,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Map-backed dependency graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InMemoryGraph {
    nodes: BTreeMap<String, ContentNode>,
}

impl InMemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, content_id: impl Into<String>, node: ContentNode) {
        self.nodes.insert(content_id.into(), node);
    }

    /// Add a content node of `size` bytes depending on `dependencies`
    pub fn with_content(mut self, content_id: &str, size: u64, dependencies: &[&str]) -> Self {
        self.insert(
            content_id,
            ContentNode {
                size,
                source: false,
                dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            },
        );
        self
    }

    pub fn with_source(mut self, content_id: &str) -> Self {
        self.insert(
            content_id,
            ContentNode {
                source: true,
                ..ContentNode::default()
            },
        );
        self
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Dependency ids that have no node of their own
    pub fn dangling_references(&self) -> BTreeSet<&str> {
        self.nodes
            .values()
            .flat_map(|n| n.dependencies.iter())
            .filter(|d| !self.nodes.contains_key(d.as_str()))
            .map(String::as_str)
            .collect()
    }
}

impl DependencyGraph for InMemoryGraph {
    fn direct_dependencies(&self, content_id: &str) -> Vec<String> {
        self.nodes
            .get(content_id)
            .map(|n| n.dependencies.clone())
            .unwrap_or_default()
    }

    fn content_size(&self, content_id: &str) -> u64 {
        self.nodes.get(content_id).map(|n| n.size).unwrap_or(0)
    }

    fn is_source(&self, content_id: &str) -> bool {
        self.nodes.get(content_id).is_some_and(|n| n.source)
    }
}
