// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # zipcover - ZIP-code service territory engine
//!
//! Select the postal-code areas a rectangle touches, and merge any set of
//! areas (a selection, or a technician's assigned ZIPs) into one outline.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! zipcover = "0.3"  # Default: parallel selection + tokio drivers
//! ```
//!
//! ## Feature Flags
//!
//! - **`parallel`** (default): exact intersection tests on a rayon pool for
//!   large candidate sets
//! - **`async-tokio`** (default): tokio drivers for the union and territory
//!   step machines
//! - **`file-logging`**: per-run rolling JSON log files
//!
//! ## Usage
//!
//! ```rust,no_run
//! use zipcover::prelude::*;
//!
//! let config = load_config(None, None)?;
//! let ctx = CoverageContext::from_config(&config)?;
//!
//! let view = ctx.select_rectangle(&BoundingBox::from_wsen(-87.9, 41.5, -87.6, 41.7)?);
//! println!("{}", view.selection.summary());
//! for line in view.selection.display_lines() {
//!     println!("{}", line);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: zipcover-structures, zipcover-config       │
//! │  (Region, Entity, BoundingBox, results, settings)       │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Algorithms: zipcover-spatial, zipcover-union           │
//! │  (catalog, selection, union, simplify, cache)           │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Services: zipcover-services                            │
//! │  (coverage context, roster store, render plans)         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

// Re-export foundation
pub use zipcover_config as config;
pub use zipcover_structures as structures;

// Re-export infrastructure
pub use zipcover_observability as observability;

// Re-export algorithms
pub use zipcover_spatial as spatial;
pub use zipcover_union as union;

// Re-export service layer
pub use zipcover_services as services;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::structures::{
        parse_codes, BoundingBox, Entity, EntityId, Region, RegionCode, SelectionResult, SourceKey,
        UnionResult,
    };

    pub use crate::config::{load_config, validate_config, ZipcoverConfig};

    pub use crate::spatial::{load_feeds, select, RegionCatalog, SelectOptions, Selector};

    pub use crate::union::{
        build_all, compute_entity_union, simplify, union_all, Territory, TerritoryBuilder,
        UnionCache, UnionJob, UnionSettings, UnionStrategy,
    };

    pub use crate::services::{
        copy_codes, export_codes, filter_entities, ContextSettings, CoverageContext, EntityStore,
        InMemoryEntityStore, JsonFileEntityStore, RenderPlan, RenderSink, ServiceError,
        ServiceResult,
    };

    #[cfg(feature = "async-tokio")]
    pub use crate::union::driver::{build_all_async, union_all_async};
}
