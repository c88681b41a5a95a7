// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Geometry helpers shared by the selector, the union engine, and render output.

The geometry kernel may panic on degenerate input. `guarded` turns such a
panic into an error string so one bad region never takes down a selection or
a union.
*/

use geo::{Area, Centroid, InteriorPoint, LineString, MultiLineString, MultiPolygon, Point, Polygon};
use std::panic::{self, AssertUnwindSafe};

/// Run a geometry operation, converting a panic into `Err(message)`
pub fn guarded<T>(op: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(op)).map_err(|payload| {
        if let Some(msg) = payload.downcast_ref::<&str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "geometry kernel panicked".to_string()
        }
    })
}

/// True if every coordinate of every ring is finite
pub fn is_finite(geometry: &MultiPolygon<f64>) -> bool {
    geometry.0.iter().all(polygon_is_finite)
}

fn polygon_is_finite(polygon: &Polygon<f64>) -> bool {
    ring_is_finite(polygon.exterior()) && polygon.interiors().iter().all(ring_is_finite)
}

fn ring_is_finite(ring: &LineString<f64>) -> bool {
    ring.0.iter().all(|c| c.x.is_finite() && c.y.is_finite())
}

/// A geometry is degenerate when it is empty, not finite, or every polygon
/// has an exterior ring too short to enclose area
pub fn is_degenerate(geometry: &MultiPolygon<f64>) -> bool {
    geometry.0.is_empty()
        || !is_finite(geometry)
        || geometry.0.iter().all(|p| p.exterior().0.len() < 4)
}

/// Boundary rings as lines (exteriors and holes), for outline rendering
pub fn boundary_lines(geometry: &MultiPolygon<f64>) -> MultiLineString<f64> {
    let mut lines = Vec::new();
    for polygon in &geometry.0 {
        lines.push(polygon.exterior().clone());
        lines.extend(polygon.interiors().iter().cloned());
    }
    MultiLineString::new(lines)
}

/// Representative interior point for label placement
///
/// Falls back to the centroid when no interior point can be derived.
pub fn label_point(geometry: &MultiPolygon<f64>) -> Option<Point<f64>> {
    guarded(|| geometry.interior_point().or_else(|| geometry.centroid()))
        .ok()
        .flatten()
}

/// Planar area in square degrees
pub fn area(geometry: &MultiPolygon<f64>) -> f64 {
    geometry.unsigned_area()
}
