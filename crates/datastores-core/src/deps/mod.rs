//! Transitive asset dependency collection.

pub mod collector;
pub mod graph;

pub use collector::{AssetOrigin, ContentRef, DependencyCollector};
pub use graph::{DependencyGraph, InMemoryGraph};
