use std::sync::Arc;

use crate::region::Region;

/// Regions matched by a rectangle
///
/// `codes` is sorted and duplicate-free; `features[i]` is the region for
/// `codes[i]`.
#[derive(Debug, Clone, Default)]
pub struct SelectionResult {
    pub codes: Vec<String>,
    pub features: Vec<Arc<Region>>,
    /// Regions skipped because the exact intersection test failed
    pub faults: usize,
}

impl SelectionResult {
    /// Build a result from unordered matches, sorting by code and dropping
    /// repeats
    pub fn from_matches(mut matches: Vec<Arc<Region>>, faults: usize) -> Self {
        matches.sort_by(|a, b| a.code.cmp(&b.code));
        matches.dedup_by(|a, b| a.code == b.code);
        let codes = matches.iter().map(|r| r.code.to_string()).collect();
        Self {
            codes,
            features: matches,
            faults,
        }
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// `"<code> - <label> (<admin>)"` per matched region
    pub fn display_lines(&self) -> Vec<String> {
        self.features.iter().map(|r| r.display_line()).collect()
    }

    /// Status line shown after a rectangle completes; empty when nothing matched
    pub fn summary(&self) -> String {
        match self.len() {
            0 => String::new(),
            1 => "Found 1 ZIP.".to_string(),
            n => format!("Found {} ZIPs.", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoundingBox, RegionCode};
    use geo::MultiPolygon;

    fn region(code: &str) -> Arc<Region> {
        let geometry = MultiPolygon::new(vec![BoundingBox::new(0.0, 0.0, 1.0, 1.0).to_polygon()]);
        Arc::new(Region::new(RegionCode::new(code).unwrap(), "Town", "IL", geometry).unwrap())
    }

    #[test]
    fn test_from_matches_sorts_and_dedups() {
        let result = SelectionResult::from_matches(
            vec![region("60453"), region("60452"), region("60453")],
            1,
        );
        assert_eq!(result.codes, vec!["60452", "60453"]);
        assert_eq!(result.features.len(), 2);
        assert_eq!(result.features[0].code(), "60452");
        assert_eq!(result.faults, 1);
        assert_eq!(result.summary(), "Found 2 ZIPs.");
        assert_eq!(result.display_lines()[1], "60453 - Town (IL)");
    }

    #[test]
    fn test_empty() {
        let result = SelectionResult::from_matches(vec![], 0);
        assert!(result.is_empty());
        assert_eq!(result.summary(), "");
    }
}
