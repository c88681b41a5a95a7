// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# zipcover-union

Merging regions into territory outlines.

## Modules
- **engine**: `UnionJob` step machine (sequential fold or pairwise reduction)
- **simplify**: topology-preserving simplification scaled by feature count
- **cache**: single-flight, LRU-bounded `UnionCache` keyed by `SourceKey`
- **territory**: per-entity unions and the `TerritoryBuilder` step machine
- **driver**: tokio drivers yielding between steps (feature `async-tokio`)

The step machines never sleep or spawn; whoever calls `step()` decides what
happens between steps.
*/

pub mod cache;
pub mod engine;
pub mod error;
pub mod simplify;
pub mod territory;

#[cfg(feature = "async-tokio")]
pub mod driver;

pub use cache::{CacheStats, UnionCache, DEFAULT_CACHE_CAPACITY};
pub use engine::{
    union_all, union_all_with, UnionJob, UnionLimits, UnionOutcome, UnionProgress, UnionStep,
    UnionStrategy, DEFAULT_SELECTION_CHUNK_SIZE, DEFAULT_TERRITORY_CHUNK_SIZE,
};
pub use error::UnionError;
pub use simplify::{simplify, simplify_with, Simplified, SimplifyParams};
pub use territory::{
    build_all, compute_entity_union, compute_union, EntityUnion, Territory, TerritoryBuilder,
    TerritoryProgress, TerritoryStep, UnionSettings,
};

#[cfg(feature = "async-tokio")]
pub use driver::{build_all_async, union_all_async};
