//! Datastores Store - file-backed collaborators for the core
//!
//! Provides:
//! - Workspace file holding every collection and its elements (JSON)
//! - Dependency manifest loaded into a `DependencyGraph` (YAML)
//! - Persisted packaging layout behind `LayoutReader`/`LayoutWriter` (JSON)
//! - Atomic temp→rename writes for all of the above

pub mod atomic;
pub mod errors;
pub mod layout;
pub mod manifest;
pub mod workspace;

pub use errors::Result;
pub use layout::FsLayoutStore;
pub use manifest::ManifestGraph;
pub use workspace::{load_workspace, save_workspace, WorkspaceFile};
