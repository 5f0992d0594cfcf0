//! Dependency manifest loaded from YAML.
//!
//! ```yaml
//! schema_version: 1
//! content:
//!   sword-mesh:
//!     size: 2048
//!     dependencies: [steel-tex]
//!   steel-tex:
//!     size: 4096
//!   sword.cs:
//!     source: true
//! ```

use std::fs;
use std::path::Path;

use datastores_core::deps::{DependencyGraph, InMemoryGraph};
use serde::{Deserialize, Serialize};

use crate::errors::{io_error, parse_error, Result};

pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ManifestFile {
    schema_version: u32,
    #[serde(default)]
    content: InMemoryGraph,
}

/// File-level dependency graph read from a manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestGraph {
    graph: InMemoryGraph,
}

impl ManifestGraph {
    /// # Errors
    ///
    /// `Io` if the file cannot be read; otherwise as [`ManifestGraph::from_yaml_str`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| io_error("load_manifest", path, e))?;
        Self::parse(&text, path)
    }

    /// # Errors
    ///
    /// `Serialization` for malformed YAML or an unsupported schema version.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Self::parse(text, Path::new("<inline>"))
    }

    fn parse(text: &str, origin: &Path) -> Result<Self> {
        let manifest: ManifestFile =
            serde_yaml::from_str(text).map_err(|e| parse_error("load_manifest", origin, e))?;
        if manifest.schema_version != MANIFEST_SCHEMA_VERSION {
            return Err(parse_error(
                "load_manifest",
                origin,
                format!(
                    "unsupported schema_version {}; expected {}",
                    manifest.schema_version, MANIFEST_SCHEMA_VERSION
                ),
            ));
        }

        let dangling = manifest.content.dangling_references();
        if !dangling.is_empty() {
            tracing::warn!(
                path = %origin.display(),
                dangling_count = dangling.len(),
                "Manifest references content it does not describe; treated as size 0"
            );
        }

        Ok(Self {
            graph: manifest.content,
        })
    }

    pub fn graph(&self) -> &InMemoryGraph {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }
}

impl DependencyGraph for ManifestGraph {
    fn direct_dependencies(&self, content_id: &str) -> Vec<String> {
        self.graph.direct_dependencies(content_id)
    }

    fn content_size(&self, content_id: &str) -> u64 {
        self.graph.content_size(content_id)
    }

    fn is_source(&self, content_id: &str) -> bool {
        self.graph.is_source(content_id)
    }
}
