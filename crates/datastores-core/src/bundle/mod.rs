//! Declarative bundle reconciler.
//!
//! Computes the desired packaging layout from collections and their asset
//! dependencies, diffs it against the persisted layout and applies the
//! resulting actions through a packaging backend.
//!
//! ## Entry point
//!
//! ```
//! use datastores_core::bundle::{BundleReconciler, InMemoryLayout};
//! use datastores_core::config::ReconcilerConfig;
//! use datastores_core::deps::InMemoryGraph;
//!
//! let reconciler = BundleReconciler::new(ReconcilerConfig::default());
//! let desired = reconciler.compute_desired_state(&[], &InMemoryGraph::new());
//! let plan = reconciler.diff(&desired, &InMemoryLayout::new());
//! assert!(plan.is_converged());
//! ```
//!
//! ## Guarantees
//!
//! - **Purity**: desired-state computation and diff never touch the backend's
//!   write side.
//! - **Convergence**: applying a plan and diffing again against the same
//!   desired state yields no actions.

pub mod apply;
pub mod backend;
pub mod desired;
pub mod diff;
pub mod model;
pub mod reconciler;
pub mod summary;

pub use backend::{InMemoryLayout, LayoutReader, LayoutWriter, PersistedEntry};
pub use model::{
    ActionOp, ApplyReport, DesiredAsset, DesiredGroup, DesiredState, ReconcileAction,
    ReconcilePlan, SkippedAction,
};
pub use reconciler::BundleReconciler;
pub use summary::render_plan_summary;
