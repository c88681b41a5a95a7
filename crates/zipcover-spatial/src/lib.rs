// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# zipcover-spatial

Region feeds, the region catalog, and rectangle selection.

## Modules
- **feed**: GeoJSON feed parsing; the only place property aliases are resolved
- **catalog**: validated, indexed, read-only region store
- **grid**: Morton-keyed grid of Roaring bitmaps used to pre-select candidates
- **selector**: bbox pre-filter followed by an exact intersection test

The catalog is `Send + Sync` and never mutated after `build`, so one instance
can serve any number of concurrent selections.
*/

pub mod catalog;
pub mod error;
pub mod feed;
pub mod grid;
pub mod morton;
pub mod selector;

pub use catalog::{CatalogLoadReport, CodeResolution, RegionCatalog};
pub use error::{SpatialError, SpatialResult};
pub use feed::{load_feeds, parse_feed, read_feed, FeedFeature, FeedLoadReport};
pub use grid::{GridStats, RegionGridIndex};
pub use selector::{select, SelectOptions, Selector};
