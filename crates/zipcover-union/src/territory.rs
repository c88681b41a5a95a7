// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Territory set building.

Every entity's codes are resolved against the catalog, merged, simplified and
cached under the entity's `SourceKey`. `TerritoryBuilder` does one entity per
`step()` so a progress reporter can show "Building <name>" between entities.
*/

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use zipcover_spatial::RegionCatalog;
use zipcover_structures::{Entity, Region, SourceKey, UnionResult};

use crate::cache::UnionCache;
use crate::engine::{
    UnionJob, UnionLimits, UnionStrategy, DEFAULT_SELECTION_CHUNK_SIZE,
    DEFAULT_TERRITORY_CHUNK_SIZE,
};
use crate::simplify::{simplify_with, SimplifyParams};

/// Everything that shapes a union besides its input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnionSettings {
    pub chunk_size: usize,
    pub strategy: UnionStrategy,
    pub limits: UnionLimits,
    pub simplify: SimplifyParams,
}

impl UnionSettings {
    pub fn for_selection() -> Self {
        Self {
            chunk_size: DEFAULT_SELECTION_CHUNK_SIZE,
            strategy: UnionStrategy::Sequential,
            limits: UnionLimits::unlimited(),
            simplify: SimplifyParams::default(),
        }
    }

    pub fn for_territory() -> Self {
        Self {
            chunk_size: DEFAULT_TERRITORY_CHUNK_SIZE,
            ..Self::for_selection()
        }
    }
}

impl Default for UnionSettings {
    fn default() -> Self {
        Self::for_selection()
    }
}

/// Merge and simplify `regions` into a `UnionResult` tagged with `source_key`
///
/// Regions are merged in code order, and the feature cap keeps the lowest
/// codes, so the result depends only on the code set (as the key does).
/// Not cached; callers go through `UnionCache::get_or_compute`.
pub fn compute_union(regions: &[Arc<Region>], source_key: SourceKey, settings: &UnionSettings) -> UnionResult {
    let mut ordered = regions.to_vec();
    ordered.sort_by(|a, b| a.code.cmp(&b.code));
    ordered.dedup_by(|a, b| a.code == b.code);
    let features = settings.limits.apply(&ordered);
    if features.len() < regions.len() {
        debug!(
            target: "zipcover-union",
            "Union capped at {} of {} features",
            features.len(),
            regions.len()
        );
    }
    if features.is_empty() {
        return UnionResult::empty(source_key);
    }

    let outcome = UnionJob::from_regions(features, settings.chunk_size, settings.strategy).finish();
    let feature_count = features.len();

    match outcome.geometry {
        Some(geometry) => {
            let simplified = simplify_with(geometry, feature_count, &settings.simplify);
            UnionResult {
                geometry: Some(simplified.geometry),
                source_key,
                simplified: simplified.simplified,
                feature_count,
                fault_count: outcome.faults,
            }
        }
        None => UnionResult::empty(source_key),
    }
}

/// One entity's cached union plus the codes the catalog did not know
#[derive(Debug, Clone)]
pub struct EntityUnion {
    pub result: Arc<UnionResult>,
    pub missing: Vec<String>,
}

/// Union for a single entity, through the cache
pub fn compute_entity_union(
    catalog: &RegionCatalog,
    cache: &UnionCache,
    entity: &Entity,
    settings: &UnionSettings,
) -> EntityUnion {
    let key = SourceKey::for_entity(entity);
    let resolution = catalog.resolve(&entity.codes);
    let result = cache.get_or_compute(&key, || compute_union(&resolution.found, key.clone(), settings));
    EntityUnion {
        result,
        missing: resolution.missing,
    }
}

/// A built territory
#[derive(Debug, Clone)]
pub struct Territory {
    pub entity: Entity,
    pub result: Arc<UnionResult>,
    pub missing: Vec<String>,
    /// Position of the entity in the input list (palette colour index)
    pub palette_index: usize,
}

/// Progress of a `TerritoryBuilder`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerritoryProgress {
    pub completed: usize,
    pub total: usize,
    /// Territories with geometry so far
    pub built: usize,
    /// Entities with no resolvable codes
    pub skipped: usize,
    /// Name of the entity handled by the last step
    pub current: Option<String>,
}

impl TerritoryProgress {
    /// Status text for the progress reporter
    pub fn message(&self) -> String {
        match &self.current {
            Some(name) if self.completed < self.total => format!("Building {}", name),
            _ => format!("Built {} territories", self.built),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerritoryStep {
    Pending(TerritoryProgress),
    Done(TerritoryProgress),
}

impl TerritoryStep {
    pub fn is_done(&self) -> bool {
        matches!(self, TerritoryStep::Done(_))
    }
}

/// Builds territories one entity per step
pub struct TerritoryBuilder<'a> {
    catalog: &'a RegionCatalog,
    cache: &'a UnionCache,
    entities: &'a [Entity],
    settings: UnionSettings,
    next: usize,
    territories: Vec<Territory>,
    progress: TerritoryProgress,
    started: Instant,
}

impl<'a> TerritoryBuilder<'a> {
    pub fn new(
        catalog: &'a RegionCatalog,
        cache: &'a UnionCache,
        entities: &'a [Entity],
        settings: UnionSettings,
    ) -> Self {
        Self {
            catalog,
            cache,
            entities,
            settings,
            next: 0,
            territories: Vec::with_capacity(entities.len()),
            progress: TerritoryProgress {
                total: entities.len(),
                ..TerritoryProgress::default()
            },
            started: Instant::now(),
        }
    }

    pub fn progress(&self) -> &TerritoryProgress {
        &self.progress
    }

    pub fn is_done(&self) -> bool {
        self.next >= self.entities.len()
    }

    /// Build the next entity's territory
    pub fn step(&mut self) -> TerritoryStep {
        if let Some(entity) = self.entities.get(self.next) {
            let union = compute_entity_union(self.catalog, self.cache, entity, &self.settings);
            if union.result.is_empty() {
                debug!(
                    target: "zipcover-union",
                    "No resolvable codes for {}; skipping",
                    entity.name
                );
                self.progress.skipped += 1;
            } else {
                self.territories.push(Territory {
                    entity: entity.clone(),
                    result: union.result,
                    missing: union.missing,
                    palette_index: self.next,
                });
                self.progress.built += 1;
            }
            self.progress.current = Some(entity.name.clone());
            self.next += 1;
            self.progress.completed = self.next;
        }

        if self.is_done() {
            TerritoryStep::Done(self.progress.clone())
        } else {
            TerritoryStep::Pending(self.progress.clone())
        }
    }

    /// Drive all remaining steps
    pub fn finish(mut self) -> Vec<Territory> {
        while !self.step().is_done() {}
        self.into_territories()
    }

    /// Territories built so far, in input order
    pub fn into_territories(self) -> Vec<Territory> {
        info!(
            target: "zipcover-union",
            "✅ Territories: {} built, {} skipped in {}ms",
            self.progress.built,
            self.progress.skipped,
            self.started.elapsed().as_millis()
        );
        self.territories
    }
}

/// Build every entity's territory synchronously
pub fn build_all(
    catalog: &RegionCatalog,
    cache: &UnionCache,
    entities: &[Entity],
    settings: &UnionSettings,
) -> Vec<Territory> {
    TerritoryBuilder::new(catalog, cache, entities, *settings).finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::MultiPolygon;
    use zipcover_spatial::FeedFeature;
    use zipcover_structures::BoundingBox;

    fn catalog() -> RegionCatalog {
        let square = |code: &str, x: f64| FeedFeature {
            code: code.to_string(),
            label: "Town".to_string(),
            admin_area: "IL".to_string(),
            geometry: Some(MultiPolygon::new(vec![
                BoundingBox::new(x, 0.0, x + 0.05, 0.05).to_polygon()
            ])),
        };
        RegionCatalog::build(vec![square("60452", 0.0), square("60453", 0.05), square("60462", 0.5)])
    }

    #[test]
    fn test_entity_union_reports_missing() {
        let catalog = catalog();
        let cache = UnionCache::new();
        let entity = Entity::with_codes(1u64, "Alex", ["60452", "99999", "60453"]);

        let union = compute_entity_union(&catalog, &cache, &entity, &UnionSettings::for_territory());
        assert_eq!(union.missing, vec!["99999"]);
        assert_eq!(union.result.feature_count, 2);
        assert_eq!(union.result.source_key.as_str(), "entity/1:60452|60453|99999");
        assert!(union.result.geometry.is_some());
    }

    #[test]
    fn test_unknown_only_is_empty() {
        let catalog = catalog();
        let cache = UnionCache::new();
        let entity = Entity::with_codes(2u64, "Nobody", ["99999"]);
        let union = compute_entity_union(&catalog, &cache, &entity, &UnionSettings::default());
        assert!(union.result.is_empty());
        assert_eq!(union.missing, vec!["99999"]);
    }

    #[test]
    fn test_builder_skips_and_keeps_order() {
        let catalog = catalog();
        let cache = UnionCache::new();
        let entities = vec![
            Entity::with_codes(1u64, "A", ["60462"]),
            Entity::with_codes(2u64, "B", ["99999"]),
            Entity::with_codes(3u64, "C", ["60452"]),
        ];

        let mut builder = TerritoryBuilder::new(&catalog, &cache, &entities, UnionSettings::for_territory());
        let first = builder.step();
        assert!(matches!(&first, TerritoryStep::Pending(p) if p.message() == "Building A"));
        builder.step();
        assert!(builder.step().is_done());

        let territories = builder.into_territories();
        let names: Vec<&str> = territories.iter().map(|t| t.entity.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
        assert_eq!(territories[1].palette_index, 2);
    }

    #[test]
    fn test_build_all_reuses_cache() {
        let catalog = catalog();
        let cache = UnionCache::new();
        let entities = vec![Entity::with_codes(1u64, "A", ["60452", "60453"])];

        let first = build_all(&catalog, &cache, &entities, &UnionSettings::for_territory());
        let second = build_all(&catalog, &cache, &entities, &UnionSettings::for_territory());
        assert!(Arc::ptr_eq(&first[0].result, &second[0].result));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_max_features_cap() {
        let catalog = catalog();
        let regions = catalog.resolve(["60452", "60453", "60462"]).found;
        let settings = UnionSettings {
            limits: UnionLimits { max_features: 2 },
            ..UnionSettings::default()
        };
        let result = compute_union(&regions, SourceKey::for_selection(["60452"]), &settings);
        assert_eq!(result.feature_count, 2);
    }

    #[test]
    fn test_capped_union_ignores_code_order() {
        let catalog = catalog();
        let settings = UnionSettings {
            limits: UnionLimits { max_features: 1 },
            simplify: SimplifyParams::disabled(),
            ..UnionSettings::default()
        };
        let forward = catalog.resolve(["60452", "60453"]).found;
        let reversed = catalog.resolve(["60453", "60452"]).found;

        let a = compute_union(&forward, SourceKey::for_selection(["60452", "60453"]), &settings);
        let b = compute_union(&reversed, SourceKey::for_selection(["60453", "60452"]), &settings);
        assert_eq!(a, b);
        let bounds = b.bounds().unwrap();
        assert!(bounds.min_x.abs() < 1e-9 && (bounds.max_x - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_empty_entities_done_immediately() {
        let catalog = catalog();
        let cache = UnionCache::new();
        let mut builder = TerritoryBuilder::new(&catalog, &cache, &[], UnionSettings::default());
        assert!(builder.step().is_done());
        assert!(builder.into_territories().is_empty());
    }
}
