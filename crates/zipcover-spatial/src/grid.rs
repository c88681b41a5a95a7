/*!
Grid index over region bounding boxes.

The catalog extent is cut into `resolution x resolution` cells. Each occupied
cell, keyed by its Morton code, holds a Roaring bitmap of the indices of the
regions whose bbox touches it. Queries OR the bitmaps of the covered cells, so
the result is always a superset of the regions whose bbox overlaps the query.
*/

use ahash::AHashMap;
use roaring::RoaringBitmap;
use zipcover_structures::BoundingBox;

use crate::morton::{morton_encode_2d, morton_encode_region_2d};

/// Default cells per axis
pub const DEFAULT_GRID_RESOLUTION: u16 = 64;

/// Upper bound on cells per axis; a finer grid only inflates bitmap unions
pub const MAX_GRID_RESOLUTION: u16 = 1024;

/// Morton-keyed grid of region bitmaps
#[derive(Debug, Clone)]
pub struct RegionGridIndex {
    extent: BoundingBox,
    resolution: u16,
    cells: AHashMap<u32, RoaringBitmap>,
    len: u32,
}

impl RegionGridIndex {
    /// Index `bboxes` (position = region index) over `extent`
    pub fn build(bboxes: &[BoundingBox], extent: BoundingBox, resolution: u16) -> Self {
        let resolution = resolution.clamp(1, MAX_GRID_RESOLUTION);
        let mut index = Self {
            extent,
            resolution,
            cells: AHashMap::new(),
            len: bboxes.len() as u32,
        };

        for (i, bbox) in bboxes.iter().enumerate() {
            if let Some((x1, y1, x2, y2)) = index.cell_range(bbox) {
                for y in y1..=y2 {
                    for x in x1..=x2 {
                        index
                            .cells
                            .entry(morton_encode_2d(x, y))
                            .or_insert_with(RoaringBitmap::new)
                            .insert(i as u32);
                    }
                }
            }
        }

        index
    }

    /// Candidate region indices for `rect`
    pub fn query(&self, rect: &BoundingBox) -> RoaringBitmap {
        if rect.contains(&self.extent) {
            let mut all = RoaringBitmap::new();
            all.insert_range(0..self.len);
            return all;
        }

        let mut result = RoaringBitmap::new();
        if let Some((x1, y1, x2, y2)) = self.cell_range(rect) {
            for code in morton_encode_region_2d(x1, y1, x2, y2) {
                if let Some(bitmap) = self.cells.get(&code) {
                    result |= bitmap;
                }
            }
        }
        result
    }

    pub fn resolution(&self) -> u16 {
        self.resolution
    }

    pub fn extent(&self) -> BoundingBox {
        self.extent
    }

    pub fn get_stats(&self) -> GridStats {
        GridStats {
            resolution: self.resolution,
            occupied_cells: self.cells.len(),
            total_entries: self.cells.values().map(|b| b.len() as usize).sum(),
        }
    }

    /// Inclusive cell range covered by `bbox`, or `None` if it misses the extent
    fn cell_range(&self, bbox: &BoundingBox) -> Option<(u16, u16, u16, u16)> {
        if !bbox.is_finite() || !bbox.overlaps(&self.extent) {
            return None;
        }
        let x1 = self.cell_of(bbox.min_x, self.extent.min_x, self.extent.width());
        let x2 = self.cell_of(bbox.max_x, self.extent.min_x, self.extent.width());
        let y1 = self.cell_of(bbox.min_y, self.extent.min_y, self.extent.height());
        let y2 = self.cell_of(bbox.max_y, self.extent.min_y, self.extent.height());
        Some((x1, y1, x2, y2))
    }

    fn cell_of(&self, value: f64, origin: f64, span: f64) -> u16 {
        if span <= 0.0 {
            return 0;
        }
        let max_cell = f64::from(self.resolution - 1);
        let cell = ((value - origin) / span * f64::from(self.resolution)).floor();
        cell.clamp(0.0, max_cell) as u16
    }
}

/// Statistics about the grid index
#[derive(Debug, Clone)]
pub struct GridStats {
    pub resolution: u16,
    pub occupied_cells: usize,
    pub total_entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_boxes(n: usize) -> Vec<BoundingBox> {
        let mut boxes = Vec::new();
        for row in 0..n {
            for col in 0..n {
                let (x, y) = (col as f64, row as f64);
                boxes.push(BoundingBox::new(x, y, x + 1.0, y + 1.0));
            }
        }
        boxes
    }

    #[test]
    fn test_query_superset_of_overlaps() {
        let boxes = grid_boxes(10);
        let index = RegionGridIndex::build(&boxes, BoundingBox::new(0.0, 0.0, 10.0, 10.0), 4);

        let rect = BoundingBox::new(2.5, 2.5, 3.5, 3.5);
        let hits = index.query(&rect);
        for (i, b) in boxes.iter().enumerate() {
            if b.overlaps(&rect) {
                assert!(hits.contains(i as u32), "missing overlapping box {}", i);
            }
        }
        assert!((hits.len() as usize) < boxes.len());
    }

    #[test]
    fn test_query_outside_extent_is_empty() {
        let boxes = grid_boxes(3);
        let index = RegionGridIndex::build(&boxes, BoundingBox::new(0.0, 0.0, 3.0, 3.0), 8);
        assert!(index.query(&BoundingBox::new(10.0, 10.0, 11.0, 11.0)).is_empty());
    }

    #[test]
    fn test_query_covering_extent_returns_all() {
        let boxes = grid_boxes(3);
        let index = RegionGridIndex::build(&boxes, BoundingBox::new(0.0, 0.0, 3.0, 3.0), 8);
        assert_eq!(index.query(&BoundingBox::new(-1.0, -1.0, 4.0, 4.0)).len(), 9);
    }

    #[test]
    fn test_degenerate_extent_single_cell() {
        let boxes = vec![BoundingBox::new(1.0, 1.0, 1.0, 1.0)];
        let index = RegionGridIndex::build(&boxes, boxes[0], 64);
        assert_eq!(index.get_stats().occupied_cells, 1);
        assert!(index.query(&BoundingBox::new(0.0, 0.0, 1.0, 1.0)).contains(0));
    }

    #[test]
    fn test_resolution_clamped() {
        let index = RegionGridIndex::build(&[], BoundingBox::new(0.0, 0.0, 1.0, 1.0), 0);
        assert_eq!(index.resolution(), 1);
        let index = RegionGridIndex::build(&[], BoundingBox::new(0.0, 0.0, 1.0, 1.0), u16::MAX);
        assert_eq!(index.resolution(), MAX_GRID_RESOLUTION);
    }
}
