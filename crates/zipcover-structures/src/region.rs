// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Region data model.

A region is one polygon-shaped postal area keyed by its ZIP code. Regions are
immutable once the catalog is built and are shared as `Arc<Region>`.
*/

use geo::{MultiLineString, MultiPolygon, Point};

use crate::bbox::BoundingBox;
use crate::codes::RegionCode;
use crate::error::{StructureError, StructureResult};
use crate::geometry;

/// One postal-code area
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Canonical 5-digit code, unique within a catalog
    pub code: RegionCode,

    /// Place name (post office / city)
    pub label: String,

    /// State or other administrative area
    pub admin_area: String,

    pub geometry: MultiPolygon<f64>,

    /// Cached bounds of `geometry`
    pub bbox: BoundingBox,
}

impl Region {
    /// Create a region, computing its bounding box
    ///
    /// # Errors
    ///
    /// Returns `StructureError::InvalidGeometry` if the geometry is empty or
    /// its bounds are not finite
    pub fn new(
        code: RegionCode,
        label: impl Into<String>,
        admin_area: impl Into<String>,
        geometry: MultiPolygon<f64>,
    ) -> StructureResult<Self> {
        let bbox = BoundingBox::of_geometry(&geometry).ok_or_else(|| {
            StructureError::InvalidGeometry {
                code: code.to_string(),
                reason: if geometry.0.is_empty() {
                    "empty geometry".to_string()
                } else {
                    "non-finite bounds".to_string()
                },
            }
        })?;

        Ok(Self {
            code,
            label: label.into(),
            admin_area: admin_area.into(),
            geometry,
            bbox,
        })
    }

    pub fn code(&self) -> &str {
        self.code.as_str()
    }

    /// Display line used by result panels: `60452 - Oak Forest (IL)`
    pub fn display_line(&self) -> String {
        format!("{} - {} ({})", self.code, self.label, self.admin_area)
    }

    /// Per-region boundary lines
    pub fn boundary_lines(&self) -> MultiLineString<f64> {
        geometry::boundary_lines(&self.geometry)
    }

    /// Label anchor for the code text at high zoom
    pub fn label_point(&self) -> Option<Point<f64>> {
        geometry::label_point(&self.geometry)
    }
}
