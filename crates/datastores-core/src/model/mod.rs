pub mod collection;
pub mod element;
pub mod payload;

pub use collection::Collection;
pub use element::Element;
pub use payload::{BundleAssetConfig, ElementPayload, LogicalKind};
