// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Union engine.

`UnionJob` merges a list of region geometries into one `MultiPolygon`, at most
`chunk_size` pairwise merges per `step()`. A merge that fails (degenerate
operand, kernel panic, or an empty result from non-empty inputs) is logged and
counted, and the job continues without that operand.

Floating-point polygon union is not associative: the two strategies give
geometrically equivalent outlines that are not bit-identical.
*/

use geo::{BooleanOps, MultiPolygon};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};
use zipcover_structures::geometry::{guarded, is_degenerate};
use zipcover_structures::Region;

use crate::error::UnionError;

/// Merges per step for rectangle selections
pub const DEFAULT_SELECTION_CHUNK_SIZE: usize = 40;

/// Merges per step for territory builds
pub const DEFAULT_TERRITORY_CHUNK_SIZE: usize = 30;

/// Order in which operands are merged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnionStrategy {
    /// Left fold in input order
    #[default]
    Sequential,
    /// Neighbours merged level by level
    Pairwise,
}

impl UnionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnionStrategy::Sequential => "sequential",
            UnionStrategy::Pairwise => "pairwise",
        }
    }
}

impl fmt::Display for UnionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnionStrategy {
    type Err = UnionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(UnionStrategy::Sequential),
            "pairwise" => Ok(UnionStrategy::Pairwise),
            other => Err(UnionError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Optional cap on the number of features entering one union
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnionLimits {
    /// 0 = no cap
    pub max_features: usize,
}

impl UnionLimits {
    pub fn unlimited() -> Self {
        Self { max_features: 0 }
    }

    pub fn apply<'a, T>(&self, features: &'a [T]) -> &'a [T] {
        if self.max_features > 0 && features.len() > self.max_features {
            &features[..self.max_features]
        } else {
            features
        }
    }
}

/// Progress of a `UnionJob`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnionProgress {
    /// Merge attempts completed, including skipped operands
    pub processed: usize,
    /// Merge attempts needed (features - 1)
    pub total: usize,
    pub faults: usize,
}

impl UnionProgress {
    /// Progress percentage (0-100)
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.processed.min(self.total) * 100) / self.total) as u8
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnionStep {
    Pending(UnionProgress),
    Done(UnionProgress),
}

impl UnionStep {
    pub fn is_done(&self) -> bool {
        matches!(self, UnionStep::Done(_))
    }

    pub fn progress(&self) -> UnionProgress {
        match self {
            UnionStep::Pending(p) | UnionStep::Done(p) => *p,
        }
    }
}

/// Final output of a `UnionJob`
#[derive(Debug, Clone, PartialEq)]
pub struct UnionOutcome {
    /// `None` iff the job had no input
    pub geometry: Option<MultiPolygon<f64>>,
    /// Features that contributed to `geometry`
    pub merged: usize,
    /// Features dropped by failed merges
    pub faults: usize,
}

enum JobState {
    Sequential {
        acc: Option<MultiPolygon<f64>>,
        next: usize,
    },
    Pairwise {
        /// Operands with the number of features each one covers
        level: Vec<(MultiPolygon<f64>, usize)>,
        next_level: Vec<(MultiPolygon<f64>, usize)>,
        cursor: usize,
        seeded: bool,
    },
    Finished {
        geometry: Option<MultiPolygon<f64>>,
    },
}

/// Incremental union of a fixed list of geometries
pub struct UnionJob<'a> {
    features: Vec<&'a MultiPolygon<f64>>,
    chunk_size: usize,
    state: JobState,
    progress: UnionProgress,
}

impl<'a> UnionJob<'a> {
    /// `chunk_size` of zero is treated as one
    pub fn new(features: Vec<&'a MultiPolygon<f64>>, chunk_size: usize, strategy: UnionStrategy) -> Self {
        let state = if features.is_empty() {
            JobState::Finished { geometry: None }
        } else {
            match strategy {
                UnionStrategy::Sequential => JobState::Sequential { acc: None, next: 0 },
                UnionStrategy::Pairwise => JobState::Pairwise {
                    level: Vec::new(),
                    next_level: Vec::new(),
                    cursor: 0,
                    seeded: false,
                },
            }
        };
        let progress = UnionProgress {
            processed: 0,
            total: features.len().saturating_sub(1),
            faults: 0,
        };
        Self {
            features,
            chunk_size: chunk_size.max(1),
            state,
            progress,
        }
    }

    pub fn from_regions(regions: &'a [Arc<Region>], chunk_size: usize, strategy: UnionStrategy) -> Self {
        Self::new(regions.iter().map(|r| &r.geometry).collect(), chunk_size, strategy)
    }

    pub fn progress(&self) -> UnionProgress {
        self.progress
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, JobState::Finished { .. })
    }

    /// Perform at most `chunk_size` merges
    pub fn step(&mut self) -> UnionStep {
        let state = std::mem::replace(&mut self.state, JobState::Finished { geometry: None });
        self.state = match state {
            JobState::Sequential { acc, next } => self.step_sequential(acc, next),
            JobState::Pairwise {
                level,
                next_level,
                cursor,
                seeded,
            } => self.step_pairwise(level, next_level, cursor, seeded),
            finished => finished,
        };

        if self.is_done() {
            UnionStep::Done(self.progress)
        } else {
            UnionStep::Pending(self.progress)
        }
    }

    /// Drive the job to completion
    pub fn finish(mut self) -> UnionOutcome {
        while !self.step().is_done() {}
        self.into_outcome()
    }

    /// Outcome of the job in its current state; unfinished jobs yield `None`
    pub fn into_outcome(self) -> UnionOutcome {
        let geometry = match self.state {
            JobState::Finished { geometry } => geometry,
            _ => None,
        };
        let merged = if geometry.is_some() {
            self.features.len().saturating_sub(self.progress.faults)
        } else {
            0
        };
        UnionOutcome {
            geometry,
            merged,
            faults: self.progress.faults,
        }
    }

    fn step_sequential(&mut self, acc: Option<MultiPolygon<f64>>, mut next: usize) -> JobState {
        let mut acc = match acc {
            Some(acc) => acc,
            None => {
                // Seed with the first usable geometry; leading degenerate ones are faults
                let seed = self
                    .features
                    .iter()
                    .position(|g| !is_degenerate(g))
                    .unwrap_or(0);
                for skipped in 0..seed {
                    self.record_fault(skipped, "degenerate geometry");
                }
                next = seed + 1;
                self.features[seed].clone()
            }
        };

        let end = (next + self.chunk_size).min(self.features.len());
        while next < end {
            match merge_pair(&acc, self.features[next]) {
                Ok(merged) => {
                    acc = merged;
                    self.progress.processed += 1;
                }
                Err(reason) => self.record_fault(next, &reason),
            }
            next += 1;
        }

        if next >= self.features.len() {
            JobState::Finished { geometry: Some(acc) }
        } else {
            JobState::Sequential {
                acc: Some(acc),
                next,
            }
        }
    }

    fn step_pairwise(
        &mut self,
        mut level: Vec<(MultiPolygon<f64>, usize)>,
        mut next_level: Vec<(MultiPolygon<f64>, usize)>,
        mut cursor: usize,
        seeded: bool,
    ) -> JobState {
        if !seeded {
            // A degenerate operand would poison its whole subtree
            let all_degenerate = self.features.iter().all(|g| is_degenerate(g));
            let mut skipped = Vec::new();
            for (i, g) in self.features.iter().enumerate() {
                if !is_degenerate(g) || (all_degenerate && i == 0) {
                    level.push(((*g).clone(), 1));
                } else {
                    skipped.push(i);
                }
            }
            for i in skipped {
                self.record_fault(i, "degenerate geometry");
            }
        }

        let mut merges = 0;
        while merges < self.chunk_size {
            if level.len() <= 1 && next_level.is_empty() {
                break;
            }
            if cursor >= level.len() {
                level = std::mem::take(&mut next_level);
                cursor = 0;
                continue;
            }
            if cursor + 1 == level.len() {
                // Odd operand out moves up unchanged
                next_level.push(take_operand(&mut level[cursor]));
                cursor += 1;
                continue;
            }

            let (left, left_count) = take_operand(&mut level[cursor]);
            let (right, right_count) = &level[cursor + 1];
            match merge_pair(&left, right) {
                Ok(merged) => {
                    next_level.push((merged, left_count + right_count));
                    self.progress.processed += 1;
                }
                Err(reason) => {
                    self.progress.faults += right_count;
                    self.progress.processed += 1;
                    warn!(
                        target: "zipcover-union",
                        "Pairwise merge failed, dropping {} feature(s): {}",
                        right_count,
                        reason
                    );
                    next_level.push((left, left_count));
                }
            }
            cursor += 2;
            merges += 1;
        }

        if level.len() <= 1 && next_level.is_empty() {
            JobState::Finished {
                geometry: level.pop().map(|(geometry, _)| geometry),
            }
        } else {
            JobState::Pairwise {
                level,
                next_level,
                cursor,
                seeded: true,
            }
        }
    }

    fn record_fault(&mut self, index: usize, reason: &str) {
        self.progress.faults += 1;
        self.progress.processed += 1;
        warn!(
            target: "zipcover-union",
            "Skipping feature #{} in union: {}",
            index,
            reason
        );
    }
}

fn take_operand(slot: &mut (MultiPolygon<f64>, usize)) -> (MultiPolygon<f64>, usize) {
    std::mem::replace(slot, (MultiPolygon::new(Vec::new()), 0))
}

/// Merge two geometries, reporting any failure instead of panicking
fn merge_pair(acc: &MultiPolygon<f64>, feature: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>, String> {
    if is_degenerate(feature) {
        return Err("degenerate geometry".to_string());
    }
    let merged = guarded(|| acc.union(feature))?;
    if merged.0.is_empty() && !acc.0.is_empty() {
        return Err("empty union result".to_string());
    }
    Ok(merged)
}

/// Sequential union of region geometries
///
/// Returns `None` for empty input; a single feature is returned unchanged.
pub fn union_all(features: &[Arc<Region>], chunk_size: usize) -> Option<MultiPolygon<f64>> {
    union_all_with(features, chunk_size, UnionStrategy::Sequential).geometry
}

pub fn union_all_with(features: &[Arc<Region>], chunk_size: usize, strategy: UnionStrategy) -> UnionOutcome {
    let outcome = UnionJob::from_regions(features, chunk_size, strategy).finish();
    debug!(
        target: "zipcover-union",
        "Union ({}) of {} features: {} merged, {} faults",
        strategy,
        features.len(),
        outcome.merged,
        outcome.faults
    );
    outcome
}
