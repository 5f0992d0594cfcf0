//! Materialized, read-only tree view over an [`crate::ops::ElementStore`].

pub mod materializer;

pub use materializer::{materialize, MaterializedTree, TreeMaterializer, TreeNode};
