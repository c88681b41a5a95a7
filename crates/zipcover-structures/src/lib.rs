// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The core crate for zipcover. Defines the data types used throughout the
//! workspace: regions keyed by ZIP code, service entities, bounding boxes,
//! and the results produced by selection and union.
//!
//! Geometry is always carried as `geo::MultiPolygon<f64>` in geographic
//! degrees; single polygons are promoted at ingestion.

mod bbox;
mod codes;
mod entity;
mod error;
pub mod geometry;
mod region;
mod selection;
mod source_key;
mod union_result;

pub use bbox::BoundingBox;
pub use codes::{parse_codes, RegionCode};
pub use entity::{Entity, EntityId};
pub use error::{StructureError, StructureResult};
pub use region::Region;
pub use selection::SelectionResult;
pub use source_key::SourceKey;
pub use union_result::UnionResult;

/// Re-export so downstream crates agree on one geometry kernel version
pub use geo;
