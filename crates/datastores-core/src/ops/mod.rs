pub mod store;

pub use store::{ElementStore, PARENT_WALK_LIMIT};
