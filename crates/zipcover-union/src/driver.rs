//! Tokio drivers for the union and territory step machines
//!
//! Each driver calls `tokio::task::yield_now()` between steps so a long union
//! shares the runtime with other tasks. There is no cancellation: dropping
//! the future abandons the job between steps.

use std::sync::Arc;
use zipcover_spatial::RegionCatalog;
use zipcover_structures::{Entity, Region};

use crate::cache::UnionCache;
use crate::engine::{UnionJob, UnionOutcome, UnionStep, UnionStrategy};
use crate::territory::{Territory, TerritoryBuilder, TerritoryProgress, TerritoryStep, UnionSettings};

/// Union `regions`, yielding to the runtime every `chunk_size` merges
pub async fn union_all_async(regions: &[Arc<Region>], chunk_size: usize, strategy: UnionStrategy) -> UnionOutcome {
    let mut job = UnionJob::from_regions(regions, chunk_size, strategy);
    while let UnionStep::Pending(_) = job.step() {
        tokio::task::yield_now().await;
    }
    job.into_outcome()
}

/// Build all territories, reporting progress and yielding after each entity
pub async fn build_all_async<F>(
    catalog: &RegionCatalog,
    cache: &UnionCache,
    entities: &[Entity],
    settings: UnionSettings,
    mut on_progress: F,
) -> Vec<Territory>
where
    F: FnMut(&TerritoryProgress),
{
    let mut builder = TerritoryBuilder::new(catalog, cache, entities, settings);
    loop {
        match builder.step() {
            TerritoryStep::Pending(progress) => {
                on_progress(&progress);
                tokio::task::yield_now().await;
            }
            TerritoryStep::Done(progress) => {
                on_progress(&progress);
                break;
            }
        }
    }
    builder.into_territories()
}
