// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Union result cache
//!
//! Stores one `UnionResult` per `SourceKey`. Each key owns a `OnceCell`, so
//! concurrent callers asking for the same key wait on one computation instead
//! of racing to store their own. The number of entries is bounded; the least
//! recently used entry goes first.

use ahash::AHashMap;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;
use zipcover_structures::{SourceKey, UnionResult};

/// Default number of cached unions
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

type Slot = Arc<OnceCell<Arc<UnionResult>>>;

struct Entry {
    slot: Slot,
    last_used: u64,
}

#[derive(Default)]
struct CacheState {
    entries: AHashMap<SourceKey, Entry>,
    generation: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Single-flight, LRU-bounded union cache
pub struct UnionCache {
    state: Mutex<CacheState>,
    capacity: usize,
}

impl UnionCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// `capacity` of 0 means unbounded
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Return the cached result for `key`, computing and storing it on a miss
    ///
    /// `compute` runs at most once per key while the entry lives. If it
    /// panics the slot stays empty and the next caller computes again.
    pub fn get_or_compute<F>(&self, key: &SourceKey, compute: F) -> Arc<UnionResult>
    where
        F: FnOnce() -> UnionResult,
    {
        let slot = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            state.generation += 1;
            let generation = state.generation;

            if let Some(entry) = state.entries.get_mut(key) {
                entry.last_used = generation;
                let slot = Arc::clone(&entry.slot);
                state.hits += 1;
                slot
            } else {
                state.misses += 1;
                let slot: Slot = Arc::new(OnceCell::new());
                state.entries.insert(
                    key.clone(),
                    Entry {
                        slot: Arc::clone(&slot),
                        last_used: generation,
                    },
                );
                self.evict_overflow(state, key);
                slot
            }
        };

        // Lock released: other keys stay available while this one computes
        Arc::clone(slot.get_or_init(|| {
            trace!(target: "zipcover-union", "Computing union for {}", key);
            Arc::new(compute())
        }))
    }

    /// Cached result, if present and computed
    pub fn get(&self, key: &SourceKey) -> Option<Arc<UnionResult>> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.generation += 1;
        let generation = state.generation;
        let entry = state.entries.get_mut(key)?;
        let value = entry.slot.get().cloned()?;
        entry.last_used = generation;
        Some(value)
    }

    pub fn contains(&self, key: &SourceKey) -> bool {
        self.state
            .lock()
            .entries
            .get(key)
            .is_some_and(|e| e.slot.get().is_some())
    }

    pub fn remove(&self, key: &SourceKey) -> bool {
        self.state.lock().entries.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry; counters are kept
    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            entries: state.entries.len(),
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
        }
    }

    fn evict_overflow(&self, state: &mut CacheState, keep: &SourceKey) {
        if self.capacity == 0 {
            return;
        }
        while state.entries.len() > self.capacity {
            let oldest = state
                .entries
                .iter()
                .filter(|(k, _)| *k != keep)
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    state.entries.remove(&k);
                    state.evictions += 1;
                    trace!(target: "zipcover-union", "Evicted union {}", k);
                }
                None => break,
            }
        }
    }
}

impl Default for UnionCache {
    fn default() -> Self {
        Self::new()
    }
}
