use geo::MultiPolygon;

use crate::bbox::BoundingBox;
use crate::geometry;
use crate::source_key::SourceKey;

/// Output of merging a set of regions, as stored in the union cache
#[derive(Debug, Clone, PartialEq)]
pub struct UnionResult {
    /// `None` iff no feature entered the union
    pub geometry: Option<MultiPolygon<f64>>,
    pub source_key: SourceKey,
    /// Whether `geometry` is the simplified form
    pub simplified: bool,
    /// Features that entered the union
    pub feature_count: usize,
    /// Features dropped by failed pairwise merges
    pub fault_count: usize,
}

impl UnionResult {
    pub fn empty(source_key: SourceKey) -> Self {
        Self {
            geometry: None,
            source_key,
            simplified: false,
            feature_count: 0,
            fault_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.geometry.is_none()
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        self.geometry.as_ref().and_then(BoundingBox::of_geometry)
    }

    /// Planar area in square degrees, zero when empty
    pub fn area(&self) -> f64 {
        self.geometry.as_ref().map(geometry::area).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result() {
        let r = UnionResult::empty(SourceKey::for_selection(["99999"]));
        assert!(r.is_empty());
        assert_eq!(r.bounds(), None);
        assert_eq!(r.area(), 0.0);
    }

    #[test]
    fn test_bounds_and_area() {
        let b = BoundingBox::new(0.0, 0.0, 2.0, 1.0);
        let r = UnionResult {
            geometry: Some(MultiPolygon::new(vec![b.to_polygon()])),
            source_key: SourceKey::new("1", ["60452"]),
            simplified: false,
            feature_count: 1,
            fault_count: 0,
        };
        assert_eq!(r.bounds(), Some(b));
        assert!((r.area() - 2.0).abs() < 1e-12);
    }
}
