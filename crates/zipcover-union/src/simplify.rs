/*!
Union outline simplification.

Tolerance grows with the number of merged features (bigger territories are
drawn at lower zoom) and is capped. Topology-preserving Visvalingam-Whyatt is
used; its threshold is a triangle area, so the distance tolerance is squared.
*/

use geo::{MultiPolygon, SimplifyVwPreserve};
use tracing::{debug, warn};
use zipcover_structures::geometry::guarded;

pub const DEFAULT_BASE_TOLERANCE: f64 = 0.0006;
pub const DEFAULT_TOLERANCE_SCALE: f64 = 0.000004;
pub const DEFAULT_MAX_TOLERANCE: f64 = 0.002;

/// Tolerance curve, in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplifyParams {
    pub enabled: bool,
    pub base_tolerance: f64,
    /// Added per merged feature
    pub tolerance_scale: f64,
    pub max_tolerance: f64,
}

impl Default for SimplifyParams {
    fn default() -> Self {
        Self {
            enabled: true,
            base_tolerance: DEFAULT_BASE_TOLERANCE,
            tolerance_scale: DEFAULT_TOLERANCE_SCALE,
            max_tolerance: DEFAULT_MAX_TOLERANCE,
        }
    }
}

impl SimplifyParams {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// `min(max, base + n * scale)`
    pub fn tolerance(&self, feature_count: usize) -> f64 {
        self.max_tolerance
            .min(self.base_tolerance + feature_count as f64 * self.tolerance_scale)
    }
}

/// Simplification output
#[derive(Debug, Clone, PartialEq)]
pub struct Simplified {
    pub geometry: MultiPolygon<f64>,
    /// False when simplification was disabled or fell back to the input
    pub simplified: bool,
}

/// Simplify with the default tolerance curve
pub fn simplify(geometry: MultiPolygon<f64>, feature_count: usize) -> Simplified {
    simplify_with(geometry, feature_count, &SimplifyParams::default())
}

/// Simplify, returning the input unchanged if anything goes wrong
pub fn simplify_with(geometry: MultiPolygon<f64>, feature_count: usize, params: &SimplifyParams) -> Simplified {
    if !params.enabled {
        return Simplified {
            geometry,
            simplified: false,
        };
    }

    let tolerance = params.tolerance(feature_count);
    let area_threshold = tolerance * tolerance;

    match guarded(|| geometry.simplify_vw_preserve(&area_threshold)) {
        Ok(result) if is_usable(&result) => {
            debug!(
                target: "zipcover-union",
                "Simplified {} features at tolerance {:.6}",
                feature_count,
                tolerance
            );
            Simplified {
                geometry: result,
                simplified: true,
            }
        }
        Ok(_) => {
            warn!(target: "zipcover-union", "Simplification collapsed the outline; keeping original");
            Simplified {
                geometry,
                simplified: false,
            }
        }
        Err(reason) => {
            warn!(target: "zipcover-union", "Simplification failed: {}; keeping original", reason);
            Simplified {
                geometry,
                simplified: false,
            }
        }
    }
}

fn is_usable(geometry: &MultiPolygon<f64>) -> bool {
    !geometry.0.is_empty() && geometry.0.iter().all(|p| p.exterior().0.len() >= 4)
}
