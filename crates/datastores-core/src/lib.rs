//! Datastores Core - hierarchical element registry and bundle reconciler
//!
//! This crate provides the in-memory kernel of Datastores, including:
//! - Stable element identity with a compact base-62 text form
//! - A flat element store with parent/child integrity and cycle prevention
//! - A lazily rebuilt, read-only tree view over each store
//! - Transitive asset dependency collection with pass-wide deduplication
//! - Declarative bundle reconciliation: desired state, diff and apply
//!
//! File formats and the command line live in `datastores-store` and
//! `datastores-cli`.

pub mod bundle;
pub mod config;
pub mod context;
pub mod deps;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod ops;
pub mod registry;
pub mod stable_id;
pub mod tree;

pub use datastores_core_types as core_types;

// Re-export commonly used types
pub use bundle::{BundleReconciler, DesiredState, ReconcileAction, ReconcilePlan};
pub use config::ReconcilerConfig;
pub use context::EditorContext;
pub use errors::{DatastoresError, ExError, ExErrorKind, Result};
pub use model::{Collection, Element, ElementPayload, LogicalKind};
pub use ops::ElementStore;
pub use stable_id::{IdAllocator, StableId};
pub use tree::{TreeMaterializer, TreeNode};
