// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Coverage context.

`CoverageContext` owns everything one session needs: the read-only region
catalog, the union cache, the entity roster and the settings. Front ends call
its operations and draw the returned `RenderPlan`s.
*/

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use zipcover_config::{validate_config, ZipcoverConfig};
use zipcover_spatial::{load_feeds, RegionCatalog, SelectOptions, Selector};
use zipcover_structures::{BoundingBox, Entity, EntityId, SelectionResult, SourceKey, UnionResult};
use zipcover_union::{
    build_all, compute_union, CacheStats, SimplifyParams, Territory, TerritoryBuilder,
    TerritoryStep, UnionCache, UnionLimits, UnionSettings, UnionStrategy, DEFAULT_CACHE_CAPACITY,
};

use crate::error::{ServiceError, ServiceResult};
use crate::render::{PlanKind, RenderPlan, RenderSink};
use crate::roster::filter_entities;
use crate::store::{EntityStore, InMemoryEntityStore, JsonFileEntityStore};

/// Default region count above which per-region edges are not drawn
pub const DEFAULT_EDGE_THRESHOLD: usize = 180;

/// Knobs for one context
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextSettings {
    pub select: SelectOptions,
    pub selection_union: UnionSettings,
    pub territory_union: UnionSettings,
    pub edge_threshold: usize,
    /// 0 = unbounded
    pub cache_capacity: usize,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            select: SelectOptions::default(),
            selection_union: UnionSettings::for_selection(),
            territory_union: UnionSettings::for_territory(),
            edge_threshold: DEFAULT_EDGE_THRESHOLD,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl ContextSettings {
    /// Settings from a validated configuration
    pub fn from_config(config: &ZipcoverConfig) -> ServiceResult<Self> {
        validate_config(config)?;

        let strategy: UnionStrategy = config.union.strategy.parse()?;
        let limits = UnionLimits {
            max_features: config.union.max_features,
        };
        let simplify = SimplifyParams {
            enabled: config.simplify.enabled,
            base_tolerance: config.simplify.base_tolerance,
            tolerance_scale: config.simplify.tolerance_scale,
            max_tolerance: config.simplify.max_tolerance,
        };

        Ok(Self {
            select: SelectOptions {
                parallel_threshold: config.selection.parallel_threshold,
            },
            selection_union: UnionSettings {
                chunk_size: config.union.selection_chunk_size,
                strategy,
                limits,
                simplify,
            },
            territory_union: UnionSettings {
                chunk_size: config.union.territory_chunk_size,
                strategy,
                limits,
                simplify,
            },
            edge_threshold: config.render.edge_threshold,
            cache_capacity: config.cache.capacity,
        })
    }
}

/// Result of a rectangle selection
#[derive(Debug, Clone)]
pub struct SelectionView {
    pub selection: SelectionResult,
    pub union: Arc<UnionResult>,
    pub plan: RenderPlan,
}

/// Result of highlighting one entity
#[derive(Debug, Clone)]
pub struct EntityView {
    pub entity: Entity,
    pub union: Arc<UnionResult>,
    /// Assigned codes the catalog does not know
    pub missing: Vec<String>,
    pub plan: RenderPlan,
}

/// One entry of the territory overview
#[derive(Debug, Clone)]
pub struct TerritoryView {
    pub territory: Territory,
    pub plan: RenderPlan,
}

/// Session state: catalog, union cache, roster and settings
pub struct CoverageContext {
    catalog: Arc<RegionCatalog>,
    cache: UnionCache,
    selector: Selector,
    store: Box<dyn EntityStore>,
    entities: RwLock<Vec<Entity>>,
    settings: ContextSettings,
}

impl CoverageContext {
    /// Create a context, loading the roster from `store`
    pub fn new(
        catalog: Arc<RegionCatalog>,
        store: Box<dyn EntityStore>,
        settings: ContextSettings,
    ) -> ServiceResult<Self> {
        let entities = store.load()?;
        Ok(Self {
            catalog,
            cache: UnionCache::with_capacity(settings.cache_capacity),
            selector: Selector::new(settings.select),
            store,
            entities: RwLock::new(entities),
            settings,
        })
    }

    /// Load feeds, build the catalog and open the roster store named by `config`
    ///
    /// Feeds that fail to load are logged and skipped; the catalog keeps
    /// whatever the other feeds provided.
    pub fn from_config(config: &ZipcoverConfig) -> ServiceResult<Self> {
        let settings = ContextSettings::from_config(config)?;

        let start = Instant::now();
        let report = load_feeds(&config.catalog.feeds);
        if report.has_failures() {
            warn!(
                target: "zipcover-services",
                "⚠️ {} of {} feeds failed to load; continuing with partial data",
                report.failed_feeds.len(),
                config.catalog.feeds.len()
            );
        }
        let catalog = RegionCatalog::build_with_resolution(report.features, config.catalog.grid_resolution);
        info!(
            target: "zipcover-services",
            "✅ Catalog ready: {} regions in {}ms",
            catalog.len(),
            start.elapsed().as_millis()
        );

        let store: Box<dyn EntityStore> = match &config.entities.store_path {
            Some(path) => Box::new(JsonFileEntityStore::new(path)),
            None => Box::new(InMemoryEntityStore::default()),
        };

        Self::new(Arc::new(catalog), store, settings)
    }

    pub fn catalog(&self) -> &RegionCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &ContextSettings {
        &self.settings
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Regions touching `rect`, their union and the plan to draw them
    pub fn select_rectangle(&self, rect: &BoundingBox) -> SelectionView {
        let selection = self.selector.select(&self.catalog, rect);
        let key = SourceKey::for_selection(&selection.codes);

        let union = if selection.is_empty() {
            Arc::new(UnionResult::empty(key))
        } else {
            self.cache.get_or_compute(&key, || {
                compute_union(&selection.features, key.clone(), &self.settings.selection_union)
            })
        };
        debug!(
            target: "zipcover-services",
            "Selection {}: {} regions, {} faults",
            union.source_key,
            selection.len(),
            selection.faults
        );

        let plan = RenderPlan::for_selection(&selection, &union, self.settings.edge_threshold);
        SelectionView { selection, union, plan }
    }

    /// `select_rectangle` from raw edges, rejecting non-finite input
    pub fn select_wsen(&self, west: f64, south: f64, east: f64, north: f64) -> ServiceResult<SelectionView> {
        let rect = BoundingBox::from_wsen(west, south, east, north)?;
        Ok(self.select_rectangle(&rect))
    }

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    /// Union and plan for one entity
    pub fn highlight_entity(&self, id: &EntityId) -> ServiceResult<EntityView> {
        let (entity, palette_index) = {
            let entities = self.entities.read();
            let index = entities
                .iter()
                .position(|e| &e.id == id)
                .ok_or_else(|| not_found(id))?;
            (entities[index].clone(), index)
        };

        let key = SourceKey::for_entity(&entity);
        let resolution = self.catalog.resolve(&entity.codes);
        let union = self.cache.get_or_compute(&key, || {
            compute_union(&resolution.found, key.clone(), &self.settings.territory_union)
        });

        let plan = RenderPlan::for_entity(
            PlanKind::Entity,
            &entity.name,
            &union,
            Some(resolution.found.as_slice()),
            palette_index,
            self.settings.edge_threshold,
        );
        Ok(EntityView {
            entity,
            union,
            missing: resolution.missing,
            plan,
        })
    }

    /// Codes assigned to `entity` that the catalog does not know
    pub fn missing_codes(&self, entity: &Entity) -> Vec<String> {
        self.catalog.resolve(&entity.codes).missing
    }

    /// Snapshot of the roster
    pub fn entities(&self) -> Vec<Entity> {
        self.entities.read().clone()
    }

    /// Roster entries matching `query` by name or code
    pub fn search_entities(&self, query: &str) -> Vec<Entity> {
        filter_entities(&self.entities.read(), query)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Replace the roster and persist it
    pub fn replace_entities(&self, entities: Vec<Entity>) -> ServiceResult<()> {
        let mut current = self.entities.write();
        self.store.save(&entities)?;
        *current = entities;
        Ok(())
    }

    /// Validate operator input and append a new entity
    pub fn add_entity(&self, name: &str, contact: &str, codes_text: &str) -> ServiceResult<Entity> {
        let entity = Entity::new(name, contact, codes_text)?;
        let mut current = self.entities.write();
        let mut next = current.clone();
        next.push(entity.clone());
        self.store.save(&next)?;
        *current = next;
        info!(target: "zipcover-services", "Added {} ({} codes)", entity.name, entity.codes.len());
        Ok(entity)
    }

    /// Replace an entity's name, contact and codes, keeping its id and position
    pub fn update_entity(
        &self,
        id: &EntityId,
        name: &str,
        contact: &str,
        codes_text: &str,
    ) -> ServiceResult<Entity> {
        let mut updated = Entity::new(name, contact, codes_text)?;
        updated.id = id.clone();

        let mut current = self.entities.write();
        let index = current.iter().position(|e| &e.id == id).ok_or_else(|| not_found(id))?;
        let mut next = current.clone();
        next[index] = updated.clone();
        self.store.save(&next)?;
        *current = next;
        Ok(updated)
    }

    pub fn remove_entity(&self, id: &EntityId) -> ServiceResult<Entity> {
        let mut current = self.entities.write();
        let index = current.iter().position(|e| &e.id == id).ok_or_else(|| not_found(id))?;
        let mut next = current.clone();
        let removed = next.remove(index);
        self.store.save(&next)?;
        *current = next;
        Ok(removed)
    }

    /// Restore the store's seed roster
    pub fn reset_entities(&self) -> ServiceResult<Vec<Entity>> {
        let mut current = self.entities.write();
        let seed = self.store.reset()?;
        *current = seed.clone();
        Ok(seed)
    }

    // ------------------------------------------------------------------
    // Territory overview
    // ------------------------------------------------------------------

    /// Every entity's territory, in roster order, skipping entities with no
    /// resolvable codes
    pub fn build_all_territories(&self) -> Vec<TerritoryView> {
        let entities = self.entities();
        let territories = build_all(&self.catalog, &self.cache, &entities, &self.settings.territory_union);
        self.territory_views(territories)
    }

    /// Build the overview, reporting progress and drawing each territory
    ///
    /// Returns the number of territories drawn.
    pub fn build_all_territories_into(&self, sink: &mut dyn RenderSink) -> usize {
        let entities = self.entities();
        let mut builder = TerritoryBuilder::new(&self.catalog, &self.cache, &entities, self.settings.territory_union);

        sink.progress("Building territories");
        loop {
            match builder.step() {
                TerritoryStep::Pending(progress) => sink.progress(&progress.message()),
                TerritoryStep::Done(progress) => {
                    sink.progress(&progress.message());
                    break;
                }
            }
        }

        let views = self.territory_views(builder.into_territories());
        for view in &views {
            sink.render(&view.plan);
        }
        views.len()
    }

    /// `build_all_territories` on a tokio runtime, yielding between entities
    #[cfg(feature = "async-tokio")]
    pub async fn build_all_territories_async<F>(&self, on_progress: F) -> Vec<TerritoryView>
    where
        F: FnMut(&zipcover_union::TerritoryProgress),
    {
        let entities = self.entities();
        let territories = zipcover_union::driver::build_all_async(
            &self.catalog,
            &self.cache,
            &entities,
            self.settings.territory_union,
            on_progress,
        )
        .await;
        self.territory_views(territories)
    }

    fn territory_views(&self, territories: Vec<Territory>) -> Vec<TerritoryView> {
        territories
            .into_iter()
            .map(|territory| {
                let plan = RenderPlan::for_entity(
                    PlanKind::Territory,
                    &territory.entity.name,
                    &territory.result,
                    None,
                    territory.palette_index,
                    self.settings.edge_threshold,
                );
                TerritoryView { territory, plan }
            })
            .collect()
    }

    /// Drop every cached union
    pub fn clear_cache(&self) {
        self.cache.clear();
        debug!(target: "zipcover-services", "Union cache cleared");
    }
}

fn not_found(id: &EntityId) -> ServiceError {
    ServiceError::NotFound {
        resource: "Entity".to_string(),
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zipcover_spatial::FeedFeature;
    use zipcover_structures::geo::MultiPolygon;

    fn square(code: &str, x: f64) -> FeedFeature {
        FeedFeature {
            code: code.to_string(),
            label: "Oak Forest".to_string(),
            admin_area: "IL".to_string(),
            geometry: Some(MultiPolygon::new(vec![
                BoundingBox::new(x, 0.0, x + 0.05, 0.05).to_polygon()
            ])),
        }
    }

    fn context(roster: Vec<Entity>) -> CoverageContext {
        let catalog = RegionCatalog::build(vec![
            square("60452", 0.0),
            square("60453", 0.05),
            square("60462", 1.0),
        ]);
        CoverageContext::new(
            Arc::new(catalog),
            Box::new(InMemoryEntityStore::new(roster)),
            ContextSettings::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_select_rectangle_caches_union() {
        let ctx = context(vec![]);
        let rect = BoundingBox::new(0.01, 0.01, 0.07, 0.02);

        let first = ctx.select_rectangle(&rect);
        assert_eq!(first.selection.codes, vec!["60452", "60453"]);
        assert_eq!(first.union.source_key.as_str(), "selection:60452|60453");
        assert_eq!(first.plan.label.as_ref().map(|l| l.text.as_str()), Some("Selection (2)"));

        let second = ctx.select_rectangle(&rect);
        assert!(Arc::ptr_eq(&first.union, &second.union));
        assert_eq!(ctx.cache_stats().hits, 1);
    }

    #[test]
    fn test_entity_id_cannot_shadow_selection_union() {
        let catalog = RegionCatalog::build(vec![square("60452", 0.0), square("60453", 0.05)]);
        let mut settings = ContextSettings::default();
        settings.selection_union.limits = UnionLimits { max_features: 1 };
        settings.territory_union.limits = UnionLimits { max_features: 1 };
        let ctx = CoverageContext::new(
            Arc::new(catalog),
            Box::new(InMemoryEntityStore::new(vec![Entity::with_codes(
                "selection",
                "Odd Id",
                ["60453", "60452"],
            )])),
            settings,
        )
        .unwrap();

        let entity = ctx.highlight_entity(&EntityId::from("selection")).unwrap();
        let view = ctx.select_rectangle(&BoundingBox::new(0.01, 0.01, 0.07, 0.02));
        assert!(!Arc::ptr_eq(&entity.union, &view.union));
        assert_eq!(ctx.cache_stats().entries, 2);

        // capped to the lowest code either way
        let bounds = view.union.bounds().unwrap();
        assert!(bounds.min_x.abs() < 1e-6 && (bounds.max_x - 0.05).abs() < 1e-6);
        assert_eq!(entity.union.bounds(), view.union.bounds());
    }

    #[test]
    fn test_empty_selection_is_not_cached() {
        let ctx = context(vec![]);
        let view = ctx.select_rectangle(&BoundingBox::new(5.0, 5.0, 6.0, 6.0));
        assert!(view.selection.is_empty());
        assert!(view.union.is_empty());
        assert!(view.plan.is_blank());
        assert_eq!(ctx.cache_stats().entries, 0);
    }

    #[test]
    fn test_select_wsen_rejects_non_finite() {
        let ctx = context(vec![]);
        let err = ctx.select_wsen(f64::NAN, 0.0, 1.0, 1.0).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[test]
    fn test_highlight_entity() {
        let ctx = context(vec![
            Entity::with_codes(1u64, "Alex", ["60462"]),
            Entity::with_codes(2u64, "Morgan", ["60453", "99999", "60452"]),
        ]);

        let view = ctx.highlight_entity(&EntityId::from(2u64)).unwrap();
        assert_eq!(view.missing, vec!["99999"]);
        assert_eq!(view.plan.codes, vec!["60452", "60453"]);
        assert_eq!(view.plan.color, crate::render::palette_color(1));
        assert_eq!(view.plan.label.as_ref().map(|l| l.text.as_str()), Some("Morgan"));
        assert!(view.plan.edges.is_some());

        let err = ctx.highlight_entity(&EntityId::from("nope")).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[test]
    fn test_roster_edits() {
        let ctx = context(vec![Entity::with_codes(1u64, "Alex", ["60462"])]);

        let added = ctx.add_entity("Riley", "", "60452, 60453-1234").unwrap();
        assert_eq!(added.codes, vec!["60452", "60453"]);
        assert_eq!(ctx.entities().len(), 2);

        let err = ctx.add_entity("", "", "60452").unwrap_err();
        assert_eq!(err.to_string(), "Name is required.");

        let updated = ctx.update_entity(&added.id, "Riley K", "(312) 555-0100", "60462").unwrap();
        assert_eq!(updated.id, added.id);
        assert_eq!(ctx.entities()[1].name, "Riley K");

        ctx.remove_entity(&EntityId::from(1u64)).unwrap();
        assert_eq!(ctx.search_entities("riley").len(), 1);
        assert!(ctx.remove_entity(&EntityId::from(1u64)).is_err());

        let seed = ctx.reset_entities().unwrap();
        assert_eq!(seed.len(), 1);
        assert_eq!(ctx.entities()[0].name, "Alex");
    }

    #[test]
    fn test_territories_into_sink() {
        let ctx = context(vec![
            Entity::with_codes(1u64, "Alex", ["60462"]),
            Entity::with_codes(2u64, "Nobody", ["99999"]),
            Entity::with_codes(3u64, "Morgan", ["60452", "60453"]),
        ]);

        let mut sink: Vec<RenderPlan> = Vec::new();
        assert_eq!(ctx.build_all_territories_into(&mut sink), 2);
        let labels: Vec<&str> = sink
            .iter()
            .filter_map(|p| p.label.as_ref().map(|l| l.text.as_str()))
            .collect();
        assert_eq!(labels, vec!["Alex", "Morgan"]);
        assert_eq!(sink[1].color, crate::render::palette_color(2));
        assert!(sink.iter().all(|p| p.kind == PlanKind::Territory && p.edges.is_none()));

        ctx.clear_cache();
        assert_eq!(ctx.cache_stats().entries, 0);
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = ZipcoverConfig::default();
        config.union.strategy = "pairwise".to_string();
        config.union.max_features = 400;
        config.render.edge_threshold = 50;

        let settings = ContextSettings::from_config(&config).unwrap();
        assert_eq!(settings.selection_union.strategy, UnionStrategy::Pairwise);
        assert_eq!(settings.selection_union.chunk_size, 40);
        assert_eq!(settings.territory_union.chunk_size, 30);
        assert_eq!(settings.territory_union.limits.max_features, 400);
        assert_eq!(settings.edge_threshold, 50);

        config.union.strategy = "divide".to_string();
        assert!(matches!(ContextSettings::from_config(&config), Err(ServiceError::Config(_))));
    }

    #[cfg(feature = "async-tokio")]
    #[tokio::test]
    async fn test_async_overview_matches_sync() {
        let ctx = context(vec![
            Entity::with_codes(1u64, "Alex", ["60462"]),
            Entity::with_codes(3u64, "Morgan", ["60452", "60453"]),
        ]);
        let mut messages = Vec::new();
        let views = ctx.build_all_territories_async(|p| messages.push(p.message())).await;
        assert_eq!(views.len(), 2);
        assert_eq!(messages.last().map(String::as_str), Some("Built 2 territories"));

        let sync = ctx.build_all_territories();
        assert!(Arc::ptr_eq(&views[1].territory.result, &sync[1].territory.result));
    }
}
