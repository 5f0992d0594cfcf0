//! Host-owned editor context.
//!
//! Holds the lookups that would otherwise be process-wide singletons: the
//! stable id allocator and the element kind registry. The host constructs
//! it, calls [`EditorContext::init`] with the loaded collections and passes
//! it to whatever needs it. [`EditorContext::teardown`] releases everything.

use crate::model::Collection;
use crate::registry::KindRegistry;
use crate::stable_id::{EntropySource, IdAllocator};

#[derive(Debug, Default)]
pub struct EditorContext {
    pub ids: IdAllocator,
    pub kinds: KindRegistry,
    initialized: bool,
}

/// Outcome of [`EditorContext::init`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitReport {
    pub registered: usize,
    /// Ids seen more than once; the first occurrence stays live
    pub duplicates: usize,
}

impl EditorContext {
    pub fn new(kinds: KindRegistry) -> Self {
        Self {
            ids: IdAllocator::default(),
            kinds,
            initialized: false,
        }
    }

    pub fn with_entropy(kinds: KindRegistry, entropy: Box<dyn EntropySource>) -> Self {
        Self {
            ids: IdAllocator::new(entropy),
            kinds,
            initialized: false,
        }
    }

    /// Register every collection id and element id as live.
    ///
    /// Duplicates are logged and counted, not rejected. Calling `init` again
    /// first clears the live set.
    pub fn init(&mut self, collections: &[Collection]) -> InitReport {
        if self.initialized {
            self.ids.clear();
        }

        let mut report = InitReport::default();
        for collection in collections {
            if self.ids.register(collection.id) {
                report.registered += 1;
            } else {
                report.duplicates += 1;
            }
            let store = collection.store();
            let duplicates = store.register_ids(&mut self.ids);
            report.registered += store.len() - duplicates;
            report.duplicates += duplicates;
        }

        self.initialized = true;
        tracing::debug!(
            registered = report.registered,
            duplicates = report.duplicates,
            "editor context initialized"
        );
        report
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Forget every live id and registered kind
    pub fn teardown(&mut self) {
        self.ids.clear();
        self.kinds.clear();
        self.initialized = false;
    }
}
