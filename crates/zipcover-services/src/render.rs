/*!
Render plans.

The engine does not draw. For each operation it produces a `RenderPlan`
describing what a map front end should show, and hands it to a `RenderSink`.
*/

use std::sync::Arc;
use zipcover_structures::geo::{MultiLineString, MultiPolygon, Point};
use zipcover_structures::geometry::{boundary_lines, label_point};
use zipcover_structures::{BoundingBox, Region, SelectionResult, UnionResult};

/// Territory palette, indexed by entity position
pub const COLORS: [&str; 12] = [
    "#e11d48", "#22c55e", "#3b82f6", "#a855f7", "#f59e0b", "#ec4899", "#14b8a6", "#f97316",
    "#84cc16", "#06b6d4", "#8b5cf6", "#ef4444",
];

/// Rectangle selection colour
pub const SELECTION_COLOR: &str = "#7dd3fc";

/// Palette colour for the entity at `index`
pub fn palette_color(index: usize) -> &'static str {
    COLORS[index % COLORS.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
    /// Rectangle selection
    Selection,
    /// One highlighted entity
    Entity,
    /// One entry of the territory overview
    Territory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub point: Point<f64>,
    pub text: String,
}

/// Everything a map needs to show one operation's result
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub kind: PlanKind,
    /// Per-region boundary lines; `None` when skipped (nothing matched or
    /// more regions than the edge threshold)
    pub edges: Option<MultiLineString<f64>>,
    /// Union fill
    pub fill: Option<MultiPolygon<f64>>,
    /// Union outline (exterior and hole rings)
    pub outline: Option<MultiLineString<f64>>,
    pub label: Option<Label>,
    /// Matched codes, sorted
    pub codes: Vec<String>,
    /// `"<code> - <label> (<admin>)"` per matched region
    pub display_lines: Vec<String>,
    /// Viewport to fit
    pub bounds: Option<BoundingBox>,
    pub color: &'static str,
}

impl RenderPlan {
    /// Plan for a rectangle selection and its union
    pub fn for_selection(selection: &SelectionResult, union: &UnionResult, edge_threshold: usize) -> Self {
        let text = format!("Selection ({})", selection.len());
        let mut plan = Self::from_union(PlanKind::Selection, union, text, SELECTION_COLOR);
        plan.edges = edge_lines(&selection.features, edge_threshold);
        plan.codes = selection.codes.clone();
        plan.display_lines = selection.display_lines();
        plan
    }

    /// Plan for one entity's territory
    ///
    /// `regions` are the entity's resolved regions; pass `None` to skip
    /// per-region edges (the overview draws outlines only).
    pub fn for_entity(
        kind: PlanKind,
        name: &str,
        union: &UnionResult,
        regions: Option<&[Arc<Region>]>,
        palette_index: usize,
        edge_threshold: usize,
    ) -> Self {
        let mut plan = Self::from_union(kind, union, name.to_string(), palette_color(palette_index));
        if let Some(regions) = regions {
            let mut sorted: Vec<&Arc<Region>> = regions.iter().collect();
            sorted.sort_by(|a, b| a.code().cmp(b.code()));
            plan.edges = edge_lines(regions, edge_threshold);
            plan.codes = sorted.iter().map(|r| r.code().to_string()).collect();
            plan.display_lines = sorted.iter().map(|r| r.display_line()).collect();
        }
        plan
    }

    fn from_union(kind: PlanKind, union: &UnionResult, label_text: String, color: &'static str) -> Self {
        let geometry = union.geometry.as_ref();
        Self {
            kind,
            edges: None,
            fill: geometry.cloned(),
            outline: geometry.map(boundary_lines),
            label: geometry.and_then(label_point).map(|point| Label {
                point,
                text: label_text,
            }),
            codes: Vec::new(),
            display_lines: Vec::new(),
            bounds: union.bounds(),
            color,
        }
    }

    /// True when there is no union to draw
    pub fn is_blank(&self) -> bool {
        self.fill.is_none()
    }
}

fn edge_lines(regions: &[Arc<Region>], edge_threshold: usize) -> Option<MultiLineString<f64>> {
    if regions.is_empty() || regions.len() > edge_threshold {
        return None;
    }
    let lines = regions.iter().flat_map(|r| r.boundary_lines().0).collect();
    Some(MultiLineString::new(lines))
}

/// Front end that draws plans
pub trait RenderSink {
    fn render(&mut self, plan: &RenderPlan);

    /// Busy indicator text between steps of a long operation
    fn progress(&mut self, _message: &str) {}
}

/// Collects plans in order
impl RenderSink for Vec<RenderPlan> {
    fn render(&mut self, plan: &RenderPlan) {
        self.push(plan.clone());
    }
}
