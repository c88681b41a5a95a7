use geo::{BoundingRect, LineString, MultiPolygon, Polygon, Rect};
use serde::{Deserialize, Serialize};

use crate::error::{StructureError, StructureResult};

/// Axis-aligned box in geographic degrees (x = longitude, y = latitude)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a box, normalizing swapped edges
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            min_x: x1.min(x2),
            min_y: y1.min(y2),
            max_x: x1.max(x2),
            max_y: y1.max(y2),
        }
    }

    /// Create a box from a drawn rectangle `(west, south, east, north)`
    ///
    /// # Errors
    ///
    /// Returns `StructureError::InvalidRectangle` if any edge is NaN or infinite
    pub fn from_wsen(west: f64, south: f64, east: f64, north: f64) -> StructureResult<Self> {
        if ![west, south, east, north].iter().all(|v| v.is_finite()) {
            return Err(StructureError::InvalidRectangle(format!(
                "non-finite edge in ({}, {}, {}, {})",
                west, south, east, north
            )));
        }
        Ok(Self::new(west, south, east, north))
    }

    /// Bounding box of a geometry, or `None` if it is empty or not finite
    pub fn of_geometry(geometry: &MultiPolygon<f64>) -> Option<Self> {
        let rect = geometry.bounding_rect()?;
        let bbox = Self::from(rect);
        bbox.is_finite().then_some(bbox)
    }

    pub fn is_finite(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
    }

    /// Inclusive overlap test: boxes that only touch still overlap
    #[inline]
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        !(self.max_x < other.min_x
            || self.min_x > other.max_x
            || self.max_y < other.min_y
            || self.min_y > other.max_y)
    }

    /// True if `other` lies entirely inside (or on the edge of) this box
    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && self.max_x >= other.max_x
            && self.max_y >= other.max_y
    }

    /// Smallest box covering both
    pub fn expand(&self, other: &BoundingBox) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Closed counter-clockwise ring polygon, used for exact intersection tests
    pub fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (self.min_x, self.min_y),
                (self.max_x, self.min_y),
                (self.max_x, self.max_y),
                (self.min_x, self.max_y),
                (self.min_x, self.min_y),
            ]),
            vec![],
        )
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(rect: Rect<f64>) -> Self {
        Self {
            min_x: rect.min().x,
            min_y: rect.min().y,
            max_x: rect.max().x,
            max_y: rect.max().y,
        }
    }
}
