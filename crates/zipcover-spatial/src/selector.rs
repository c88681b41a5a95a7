// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Rectangle selection.

Candidates from the grid index are first rejected on bbox overlap, then tested
exactly against the rectangle polygon. A region whose exact test fails is
logged, counted as a fault, and left out of the result.
*/

use geo::{Intersects, Polygon};
use std::sync::Arc;
use tracing::{debug, warn};
use zipcover_structures::geometry::{guarded, is_finite};
use zipcover_structures::{BoundingBox, Region, SelectionResult};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::catalog::RegionCatalog;

/// Candidate count at which exact tests move to the rayon pool
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOptions {
    /// Only used with the `parallel` feature
    pub parallel_threshold: usize,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

enum Hit {
    Match(Arc<Region>),
    Miss,
    Fault,
}

/// Rectangle selector with its options
#[derive(Debug, Clone, Default)]
pub struct Selector {
    options: SelectOptions,
}

impl Selector {
    pub fn new(options: SelectOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> SelectOptions {
        self.options
    }

    /// Regions intersecting `rect`, sorted by code
    pub fn select(&self, catalog: &RegionCatalog, rect: &BoundingBox) -> SelectionResult {
        let candidates: Vec<&Arc<Region>> = catalog
            .candidates(rect)
            .into_iter()
            .filter_map(|i| catalog.region(i))
            .collect();
        self.select_from(&candidates, rect)
    }

    /// Bbox reject then exact test over an explicit candidate list
    fn select_from(&self, candidates: &[&Arc<Region>], rect: &BoundingBox) -> SelectionResult {
        let candidates: Vec<&Arc<Region>> = candidates
            .iter()
            .copied()
            .filter(|r| r.bbox.overlaps(rect))
            .collect();
        let rect_polygon = rect.to_polygon();

        let hits = self.test_all(&candidates, &rect_polygon);

        let mut faults = 0;
        let mut matches = Vec::new();
        for hit in hits {
            match hit {
                Hit::Match(region) => matches.push(region),
                Hit::Fault => faults += 1,
                Hit::Miss => {}
            }
        }

        let result = SelectionResult::from_matches(matches, faults);
        debug!(
            target: "zipcover-spatial",
            "Selection: {} candidates, {} matched, {} faults",
            candidates.len(),
            result.len(),
            faults
        );
        result
    }

    #[cfg(feature = "parallel")]
    fn test_all(&self, candidates: &[&Arc<Region>], rect_polygon: &Polygon<f64>) -> Vec<Hit> {
        if candidates.len() >= self.options.parallel_threshold {
            candidates
                .par_iter()
                .map(|r| exact_test(r, rect_polygon))
                .collect()
        } else {
            candidates.iter().map(|r| exact_test(r, rect_polygon)).collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn test_all(&self, candidates: &[&Arc<Region>], rect_polygon: &Polygon<f64>) -> Vec<Hit> {
        candidates.iter().map(|r| exact_test(r, rect_polygon)).collect()
    }
}

/// Select with default options
pub fn select(catalog: &RegionCatalog, rect: &BoundingBox) -> SelectionResult {
    Selector::default().select(catalog, rect)
}

fn exact_test(region: &Arc<Region>, rect_polygon: &Polygon<f64>) -> Hit {
    if !is_finite(&region.geometry) {
        warn!(
            target: "zipcover-spatial",
            "Skipping region {}: non-finite coordinates",
            region.code
        );
        return Hit::Fault;
    }

    match guarded(|| region.geometry.intersects(rect_polygon)) {
        Ok(true) => Hit::Match(Arc::clone(region)),
        Ok(false) => Hit::Miss,
        Err(reason) => {
            warn!(
                target: "zipcover-spatial",
                "Skipping region {}: intersection test failed: {}",
                region.code,
                reason
            );
            Hit::Fault
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedFeature;
    use geo::{LineString, MultiPolygon};

    fn square(code: &str, x: f64, y: f64, size: f64) -> FeedFeature {
        FeedFeature {
            code: code.to_string(),
            label: "Town".to_string(),
            admin_area: "IL".to_string(),
            geometry: Some(MultiPolygon::new(vec![
                BoundingBox::new(x, y, x + size, y + size).to_polygon()
            ])),
        }
    }

    #[test]
    fn test_select_overlapping_only() {
        let catalog = RegionCatalog::build(vec![
            square("60452", -87.80, 41.58, 0.05),
            square("90210", -118.45, 34.07, 0.05),
        ]);
        let rect = BoundingBox::from_wsen(-87.9, 41.5, -87.7, 41.7).unwrap();
        let result = select(&catalog, &rect);
        assert_eq!(result.codes, vec!["60452"]);
        assert_eq!(result.faults, 0);
    }

    #[test]
    fn test_touching_edge_counts() {
        let catalog = RegionCatalog::build(vec![square("60452", 0.0, 0.0, 1.0)]);
        let rect = BoundingBox::new(1.0, 0.2, 2.0, 0.8);
        assert_eq!(select(&catalog, &rect).codes, vec!["60452"]);
    }

    #[test]
    fn test_bbox_overlap_but_no_intersection() {
        // L-shaped region whose bbox covers the query corner but whose area does not
        let l_shape = LineString::from(vec![
            (0.0, 0.0),
            (2.0, 0.0),
            (2.0, 1.0),
            (1.0, 1.0),
            (1.0, 2.0),
            (0.0, 2.0),
            (0.0, 0.0),
        ]);
        let catalog = RegionCatalog::build(vec![FeedFeature {
            code: "60453".to_string(),
            label: "Oak Lawn".to_string(),
            admin_area: "IL".to_string(),
            geometry: Some(MultiPolygon::new(vec![Polygon::new(l_shape, vec![])])),
        }]);
        let rect = BoundingBox::new(1.5, 1.5, 1.9, 1.9);
        assert!(select(&catalog, &rect).is_empty());
    }

    #[test]
    fn test_empty_rect_result() {
        let catalog = RegionCatalog::build(vec![square("60452", 0.0, 0.0, 1.0)]);
        let result = select(&catalog, &BoundingBox::new(5.0, 5.0, 6.0, 6.0));
        assert!(result.is_empty());
        assert_eq!(result.summary(), "");
    }

    #[test]
    fn test_failed_exact_test_is_counted_and_excluded() {
        let good = Arc::new(
            Region::new(
                "60452".try_into().unwrap(),
                "Oak Forest",
                "IL",
                MultiPolygon::new(vec![BoundingBox::new(0.0, 0.0, 1.0, 1.0).to_polygon()]),
            )
            .unwrap(),
        );
        // NaN is invisible to the bbox, so this region still reaches the exact test
        let nan_vertex = Arc::new(
            Region::new(
                "60453".try_into().unwrap(),
                "Oak Lawn",
                "IL",
                MultiPolygon::new(vec![Polygon::new(
                    LineString::from(vec![(1.0, 0.0), (2.0, 0.0), (f64::NAN, 1.0), (1.0, 1.0), (1.0, 0.0)]),
                    vec![],
                )]),
            )
            .unwrap(),
        );

        let rect = BoundingBox::new(0.5, 0.2, 1.5, 0.8);
        for threshold in [1, usize::MAX] {
            let selector = Selector::new(SelectOptions { parallel_threshold: threshold });
            let result = selector.select_from(&[&nan_vertex, &good], &rect);
            assert_eq!(result.codes, vec!["60452"]);
            assert_eq!(result.faults, 1);
        }
    }

    #[test]
    fn test_parallel_path_matches_sequential() {
        let mut features = Vec::new();
        for i in 0..30 {
            for j in 0..30 {
                features.push(square(&format!("{:05}", 10000 + i * 30 + j), i as f64, j as f64, 1.0));
            }
        }
        let catalog = RegionCatalog::build(features);
        let rect = BoundingBox::new(3.5, 3.5, 20.5, 12.5);

        let parallel = Selector::new(SelectOptions { parallel_threshold: 1 }).select(&catalog, &rect);
        let serial = Selector::new(SelectOptions { parallel_threshold: usize::MAX }).select(&catalog, &rect);
        assert_eq!(parallel.codes, serial.codes);
        assert_eq!(parallel.len(), 18 * 10);
    }
}
