//! Stable id allocation against a live-id set.
//!
//! The allocator is owned by the host's [`crate::context::EditorContext`]
//! and passed explicitly to the mutations that mint or retire ids. It is the
//! single critical section for the live set; nothing else mutates it.

use std::borrow::Cow;
use std::collections::{HashMap, VecDeque};

use rand::Rng;

use super::{StableId, ID_PREFIX};
use crate::errors::{DatastoresError, Result};

/// Probe bound for [`IdAllocator::allocate`].
pub const MAX_ALLOCATION_ATTEMPTS: usize = 100;

/// Source of candidate id values.
pub trait EntropySource {
    fn next_i32(&mut self) -> i32;
}

/// Production entropy source backed by the thread-local RNG.
#[derive(Debug, Default)]
pub struct RandEntropy;

impl EntropySource for RandEntropy {
    fn next_i32(&mut self) -> i32 {
        rand::rng().random()
    }
}

/// Replays a fixed sequence, then yields `0` forever.
///
/// Useful for deterministic hosts and tests; an exhausted sequence makes
/// every further allocation fail with `AllocationExhausted`.
#[derive(Debug, Default)]
pub struct SequenceEntropy {
    values: VecDeque<i32>,
}

impl SequenceEntropy {
    pub fn new(values: impl IntoIterator<Item = i32>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }
}

impl EntropySource for SequenceEntropy {
    fn next_i32(&mut self) -> i32 {
        self.values.pop_front().unwrap_or(0)
    }
}

/// Mints ids that are neither invalid nor live, and memoizes their encodings.
pub struct IdAllocator {
    entropy: Box<dyn EntropySource>,
    /// Live ids mapped to their memoized bare encoding
    live: HashMap<StableId, String>,
}

impl std::fmt::Debug for IdAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdAllocator")
            .field("live", &self.live.len())
            .finish()
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new(Box::new(RandEntropy))
    }
}

impl IdAllocator {
    pub fn new(entropy: Box<dyn EntropySource>) -> Self {
        Self {
            entropy,
            live: HashMap::new(),
        }
    }

    /// Draw a fresh id and mark it live.
    ///
    /// # Errors
    ///
    /// `AllocationExhausted` when [`MAX_ALLOCATION_ATTEMPTS`] probes all hit the
    /// invalid sentinel or a live id. Treat as fatal: it means the id space is
    /// nearly exhausted or the entropy source is broken.
    pub fn allocate(&mut self) -> Result<StableId> {
        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let candidate = StableId::new(self.entropy.next_i32());
            if candidate.is_invalid() || self.live.contains_key(&candidate) {
                continue;
            }

            if attempt > 1 {
                tracing::warn!(
                    attempts = attempt,
                    element_id = %candidate,
                    "stable id allocation needed more than one probe"
                );
            }
            self.live.insert(candidate, candidate.to_string());
            return Ok(candidate);
        }

        Err(DatastoresError::AllocationExhausted {
            attempts: MAX_ALLOCATION_ATTEMPTS,
        })
    }

    /// Mark an existing id (e.g. from a loaded workspace) as live.
    ///
    /// Returns `false` if the id is invalid or already live; duplicates are
    /// logged rather than treated as errors.
    pub fn register(&mut self, id: StableId) -> bool {
        if id.is_invalid() {
            return false;
        }
        if self.live.contains_key(&id) {
            tracing::warn!(element_id = %id, "duplicate stable id found while registering");
            return false;
        }
        self.live.insert(id, id.to_string());
        true
    }

    /// Remove an id from the live set, making it eligible for reissue.
    ///
    /// Callers must only retire ids with no remaining references.
    pub fn retire(&mut self, id: StableId) -> bool {
        self.live.remove(&id).is_some()
    }

    pub fn is_live(&self, id: StableId) -> bool {
        self.live.contains_key(&id)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Memoized bare encoding for live ids; computed on the fly otherwise.
    pub fn encoded(&self, id: StableId) -> Cow<'_, str> {
        match self.live.get(&id) {
            Some(text) => Cow::Borrowed(&text[ID_PREFIX.len()..]),
            None => Cow::Owned(id.encode()),
        }
    }

    /// Memoized display form for live ids; computed on the fly otherwise.
    pub fn display(&self, id: StableId) -> Cow<'_, str> {
        match self.live.get(&id) {
            Some(text) => Cow::Borrowed(text.as_str()),
            None => Cow::Owned(id.to_string()),
        }
    }

    /// Forget every live id.
    pub fn clear(&mut self) {
        self.live.clear();
    }
}

/// Display form of `id`, read from the allocator's memo when one is given.
pub fn display_form(ids: Option<&IdAllocator>, id: StableId) -> Cow<'_, str> {
    match ids {
        Some(ids) => ids.display(id),
        None => Cow::Owned(id.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocator(values: Vec<i32>) -> IdAllocator {
        IdAllocator::new(Box::new(SequenceEntropy::new(values)))
    }

    #[test]
    fn test_allocate_skips_invalid_and_live() {
        let mut ids = allocator(vec![0, 7, 7, 0, 9]);
        assert_eq!(ids.allocate().unwrap(), StableId::new(7));
        assert_eq!(ids.allocate().unwrap(), StableId::new(9));
        assert_eq!(ids.live_count(), 2);
    }

    #[test]
    fn test_allocate_exhausted() {
        let mut ids = allocator(vec![]);
        let err = ids.allocate().unwrap_err();
        assert_eq!(
            err,
            DatastoresError::AllocationExhausted {
                attempts: MAX_ALLOCATION_ATTEMPTS
            }
        );
    }

    #[test]
    fn test_exhaustion_bound_is_exact() {
        // 99 collisions then a fresh value: still within the bound
        let mut values = vec![5];
        values.extend(std::iter::repeat(5).take(98));
        values.push(6);
        let mut ids = allocator(values);
        assert_eq!(ids.allocate().unwrap(), StableId::new(5));
        assert_eq!(ids.allocate().unwrap(), StableId::new(6));
    }

    #[test]
    fn test_retire_allows_reissue() {
        let mut ids = allocator(vec![3, 3]);
        let id = ids.allocate().unwrap();
        assert!(ids.retire(id));
        assert!(!ids.is_live(id));
        assert_eq!(ids.allocate().unwrap(), id);
    }

    #[test]
    fn test_register_reports_duplicates() {
        let mut ids = allocator(vec![]);
        assert!(ids.register(StableId::new(11)));
        assert!(!ids.register(StableId::new(11)));
        assert!(!ids.register(StableId::INVALID));
        assert_eq!(ids.live_count(), 1);
    }

    #[test]
    fn test_encoded_is_memoized_for_live_ids() {
        let mut ids = allocator(vec![42]);
        let id = ids.allocate().unwrap();
        assert!(matches!(ids.encoded(id), Cow::Borrowed(_)));
        assert_eq!(ids.encoded(id), id.encode());
        assert!(matches!(ids.display(id), Cow::Borrowed(_)));
        assert_eq!(ids.display(id), id.to_string());
        assert!(matches!(ids.encoded(StableId::new(1)), Cow::Owned(_)));
    }

    #[test]
    fn test_memo_follows_register_and_retire() {
        let mut ids = allocator(vec![]);
        let loaded = StableId::new(-77);
        assert!(matches!(ids.display(loaded), Cow::Owned(_)));

        ids.register(loaded);
        assert!(matches!(ids.display(loaded), Cow::Borrowed(_)));
        assert_eq!(ids.encoded(loaded), loaded.encode());

        ids.retire(loaded);
        assert!(matches!(ids.display(loaded), Cow::Owned(_)));
        assert!(matches!(ids.encoded(loaded), Cow::Owned(_)));
        assert_eq!(ids.display(loaded), loaded.to_string());
    }

    #[test]
    fn test_display_form_without_allocator_computes() {
        let mut ids = allocator(vec![8]);
        let id = ids.allocate().unwrap();
        assert!(matches!(display_form(Some(&ids), id), Cow::Borrowed(_)));
        assert!(matches!(display_form(None, id), Cow::Owned(_)));
        assert_eq!(display_form(None, id), display_form(Some(&ids), id));
    }
}
