//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `zipcover_configuration.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ZipcoverConfig {
    pub catalog: CatalogConfig,
    pub selection: SelectionConfig,
    pub union: UnionConfig,
    pub simplify: SimplifyConfig,
    pub cache: CacheConfig,
    pub render: RenderConfig,
    pub entities: EntitiesConfig,
    pub logging: LoggingConfig,
}

/// Region feeds and catalog indexing
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// GeoJSON feed files, loaded in order
    pub feeds: Vec<PathBuf>,
    /// Grid index cells per axis (1-1024)
    pub grid_resolution: u16,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            feeds: Vec::new(),
            grid_resolution: 64,
        }
    }
}

/// Rectangle selection
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Candidate count at which exact tests run in parallel
    pub parallel_threshold: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: 256,
        }
    }
}

/// Union engine
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UnionConfig {
    pub selection_chunk_size: usize,
    pub territory_chunk_size: usize,
    /// `sequential` or `pairwise`
    pub strategy: String,
    /// 0 = no cap
    pub max_features: usize,
}

impl Default for UnionConfig {
    fn default() -> Self {
        Self {
            selection_chunk_size: 40,
            territory_chunk_size: 30,
            strategy: "sequential".to_string(),
            max_features: 0,
        }
    }
}

/// Outline simplification (degrees)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimplifyConfig {
    pub enabled: bool,
    pub base_tolerance: f64,
    pub tolerance_scale: f64,
    pub max_tolerance: f64,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_tolerance: 0.0006,
            tolerance_scale: 0.000004,
            max_tolerance: 0.002,
        }
    }
}

/// Union cache
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum cached unions (0 = unbounded)
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

/// Render plan output
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Per-region boundary lines are emitted only up to this many regions
    pub edge_threshold: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { edge_threshold: 180 }
    }
}

/// Entity roster persistence
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EntitiesConfig {
    /// JSON roster file; `None` keeps the roster in memory
    pub store_path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_dir: PathBuf,
    pub file_logging: bool,
    /// Delete run folders older than this many days (0 = keep)
    pub retention_days: u64,
    /// Keep at most this many run folders (0 = keep all)
    pub retention_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("./logs"),
            file_logging: false,
            retention_days: 7,
            retention_runs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ZipcoverConfig = toml::from_str(
            r#"
            [catalog]
            feeds = ["data/il.geojson", "data/in.geojson"]

            [union]
            strategy = "pairwise"
            "#,
        )
        .unwrap();

        assert_eq!(config.catalog.feeds.len(), 2);
        assert_eq!(config.catalog.grid_resolution, 64);
        assert_eq!(config.union.strategy, "pairwise");
        assert_eq!(config.union.selection_chunk_size, 40);
        assert_eq!(config.render.edge_threshold, 180);
        assert_eq!(config.entities.store_path, None);
    }

    #[test]
    fn test_store_path_optional() {
        let config: ZipcoverConfig = toml::from_str(
            r#"
            [entities]
            store_path = "techs.json"
            "#,
        )
        .unwrap();
        assert_eq!(config.entities.store_path, Some(PathBuf::from("techs.json")));
    }
}
