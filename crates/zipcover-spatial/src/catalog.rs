// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Region catalog.

Built once from feed features, then read-only. Malformed features are skipped
and counted; they never make the build fail.
*/

use ahash::AHashMap;
use std::sync::Arc;
use tracing::{info, warn};
use zipcover_structures::geometry::is_finite;
use zipcover_structures::{BoundingBox, Region, RegionCode};

use crate::feed::FeedFeature;
use crate::grid::{GridStats, RegionGridIndex, DEFAULT_GRID_RESOLUTION};

/// Counts of features accepted and skipped while building a catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogLoadReport {
    pub accepted: usize,
    pub missing_geometry: usize,
    pub empty_geometry: usize,
    pub non_finite: usize,
    pub invalid_code: usize,
    /// Repeats of an already-loaded code (first occurrence wins)
    pub duplicate_code: usize,
}

impl CatalogLoadReport {
    pub fn skipped(&self) -> usize {
        self.missing_geometry
            + self.empty_geometry
            + self.non_finite
            + self.invalid_code
            + self.duplicate_code
    }
}

/// Codes split into resolvable regions and unknown codes
#[derive(Debug, Clone, Default)]
pub struct CodeResolution {
    /// In input order, each code once
    pub found: Vec<Arc<Region>>,
    pub missing: Vec<String>,
}

/// Validated, indexed store of regions keyed by code
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    regions: Vec<Arc<Region>>,
    by_code: AHashMap<String, usize>,
    grid: Option<RegionGridIndex>,
    bounds: Option<BoundingBox>,
    report: CatalogLoadReport,
}

impl RegionCatalog {
    /// Build with the default grid resolution
    pub fn build(features: impl IntoIterator<Item = FeedFeature>) -> Self {
        Self::build_with_resolution(features, DEFAULT_GRID_RESOLUTION)
    }

    pub fn build_with_resolution(
        features: impl IntoIterator<Item = FeedFeature>,
        grid_resolution: u16,
    ) -> Self {
        let mut regions: Vec<Arc<Region>> = Vec::new();
        let mut by_code = AHashMap::new();
        let mut report = CatalogLoadReport::default();

        for feature in features {
            let Some(geometry) = feature.geometry else {
                report.missing_geometry += 1;
                continue;
            };
            let code = match RegionCode::new(&feature.code) {
                Ok(code) => code,
                Err(_) => {
                    report.invalid_code += 1;
                    continue;
                }
            };
            if by_code.contains_key(code.as_str()) {
                report.duplicate_code += 1;
                continue;
            }
            if geometry.0.iter().all(|p| p.exterior().0.is_empty()) {
                report.empty_geometry += 1;
                continue;
            }
            // bounding_rect skips NaN, so check every vertex
            if !is_finite(&geometry) {
                report.non_finite += 1;
                continue;
            }
            match Region::new(code, feature.label, feature.admin_area, geometry) {
                Ok(region) => {
                    by_code.insert(region.code.to_string(), regions.len());
                    regions.push(Arc::new(region));
                }
                Err(_) => report.non_finite += 1,
            }
        }
        report.accepted = regions.len();

        let bounds = regions
            .iter()
            .map(|r| r.bbox)
            .reduce(|acc, b| acc.expand(&b));
        let grid = bounds.map(|extent| {
            let boxes: Vec<BoundingBox> = regions.iter().map(|r| r.bbox).collect();
            RegionGridIndex::build(&boxes, extent, grid_resolution)
        });

        info!(
            target: "zipcover-spatial",
            "✅ Region catalog built: {} regions ({} skipped)",
            report.accepted,
            report.skipped()
        );
        if report.skipped() > 0 {
            warn!(
                target: "zipcover-spatial",
                "Skipped features: {} without geometry, {} empty, {} non-finite, {} bad code, {} duplicate",
                report.missing_geometry,
                report.empty_geometry,
                report.non_finite,
                report.invalid_code,
                report.duplicate_code
            );
        }

        Self {
            regions,
            by_code,
            grid,
            bounds,
            report,
        }
    }

    pub fn lookup(&self, code: &str) -> Option<&Arc<Region>> {
        self.by_code.get(code.trim()).map(|&i| &self.regions[i])
    }

    /// All regions in load order; each call starts a fresh iterator
    pub fn all(&self) -> impl Iterator<Item = &Arc<Region>> + '_ {
        self.regions.iter()
    }

    pub fn region(&self, index: usize) -> Option<&Arc<Region>> {
        self.regions.get(index)
    }

    /// Resolve codes in input order, reporting unknown ones as missing
    pub fn resolve<I, S>(&self, codes: I) -> CodeResolution
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = ahash::AHashSet::new();
        let mut resolution = CodeResolution::default();

        for code in codes {
            let code = code.as_ref().trim();
            if !seen.insert(code.to_string()) {
                continue;
            }
            match self.lookup(code) {
                Some(region) => resolution.found.push(Arc::clone(region)),
                None => resolution.missing.push(code.to_string()),
            }
        }

        resolution
    }

    /// Total extent of all regions
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }

    /// Indices of regions that may overlap `rect`, ascending
    pub fn candidates(&self, rect: &BoundingBox) -> Vec<usize> {
        match &self.grid {
            Some(grid) => grid.query(rect).iter().map(|i| i as usize).collect(),
            None => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn report(&self) -> &CatalogLoadReport {
        &self.report
    }

    pub fn grid_stats(&self) -> Option<GridStats> {
        self.grid.as_ref().map(RegionGridIndex::get_stats)
    }
}
