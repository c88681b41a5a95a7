//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, ZipcoverConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "zipcover_configuration.toml";

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "ZIPCOVER_CONFIG_PATH";

/// Find the zipcover configuration file
///
/// Search order:
/// 1. `ZIPCOVER_CONFIG_PATH` environment variable
/// 2. Current working directory: `./zipcover_configuration.toml`
/// 3. Parent directories (searches up to 5 levels)
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        } else {
            return Err(ConfigError::FileNotFound(format!(
                "Config file specified by {} not found: {}",
                CONFIG_PATH_ENV,
                path.display()
            )));
        }
    }

    let mut search_paths = Vec::new();

    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join(CONFIG_FILE_NAME));
                current = parent.to_path_buf();
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "zipcover configuration file '{}' not found in any of these locations:\n{}\n\nSet {} environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_ENV
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found or contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<ZipcoverConfig> {
    let config_file = if let Some(path) = config_path {
        path.to_path_buf()
    } else {
        find_config_file()?
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: ZipcoverConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

fn parse_bool(value: &str) -> bool {
    let value = value.to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

fn parse_feeds(value: &str) -> Vec<PathBuf> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `ZIPCOVER_FEEDS` -> `catalog.feeds` (comma-separated)
/// - `ZIPCOVER_GRID_RESOLUTION` -> `catalog.grid_resolution`
/// - `ZIPCOVER_PARALLEL_THRESHOLD` -> `selection.parallel_threshold`
/// - `ZIPCOVER_UNION_STRATEGY` -> `union.strategy`
/// - `ZIPCOVER_MAX_FEATURES` -> `union.max_features`
/// - `ZIPCOVER_SIMPLIFY` -> `simplify.enabled`
/// - `ZIPCOVER_CACHE_CAPACITY` -> `cache.capacity`
/// - `ZIPCOVER_EDGE_THRESHOLD` -> `render.edge_threshold`
/// - `ZIPCOVER_ENTITY_STORE` -> `entities.store_path`
/// - `ZIPCOVER_LOG_LEVEL` -> `logging.level`
/// - `ZIPCOVER_LOG_DIR` -> `logging.log_dir`
pub fn apply_environment_overrides(config: &mut ZipcoverConfig) {
    // Catalog
    if let Ok(value) = env::var("ZIPCOVER_FEEDS") {
        config.catalog.feeds = parse_feeds(&value);
    }
    if let Ok(value) = env::var("ZIPCOVER_GRID_RESOLUTION") {
        if let Ok(resolution) = value.parse::<u16>() {
            config.catalog.grid_resolution = resolution;
        }
    }

    // Selection / union
    if let Ok(value) = env::var("ZIPCOVER_PARALLEL_THRESHOLD") {
        if let Ok(threshold) = value.parse::<usize>() {
            config.selection.parallel_threshold = threshold;
        }
    }
    if let Ok(value) = env::var("ZIPCOVER_UNION_STRATEGY") {
        config.union.strategy = value;
    }
    if let Ok(value) = env::var("ZIPCOVER_MAX_FEATURES") {
        if let Ok(max) = value.parse::<usize>() {
            config.union.max_features = max;
        }
    }
    if let Ok(value) = env::var("ZIPCOVER_SIMPLIFY") {
        config.simplify.enabled = parse_bool(&value);
    }

    // Cache / render
    if let Ok(value) = env::var("ZIPCOVER_CACHE_CAPACITY") {
        if let Ok(capacity) = value.parse::<usize>() {
            config.cache.capacity = capacity;
        }
    }
    if let Ok(value) = env::var("ZIPCOVER_EDGE_THRESHOLD") {
        if let Ok(threshold) = value.parse::<usize>() {
            config.render.edge_threshold = threshold;
        }
    }

    // Entities
    if let Ok(value) = env::var("ZIPCOVER_ENTITY_STORE") {
        config.entities.store_path = Some(PathBuf::from(value));
    }

    // Logging
    if let Ok(value) = env::var("ZIPCOVER_LOG_LEVEL") {
        config.logging.level = value;
    }
    if let Ok(value) = env::var("ZIPCOVER_LOG_DIR") {
        config.logging.log_dir = PathBuf::from(value);
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"strategy": "pairwise", "cache_capacity": "64"}`)
pub fn apply_cli_overrides(config: &mut ZipcoverConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("feeds") {
        config.catalog.feeds = parse_feeds(value);
    }
    if let Some(value) = cli_args.get("grid_resolution") {
        if let Ok(resolution) = value.parse::<u16>() {
            config.catalog.grid_resolution = resolution;
        }
    }
    if let Some(value) = cli_args.get("selection_chunk_size") {
        if let Ok(size) = value.parse::<usize>() {
            config.union.selection_chunk_size = size;
        }
    }
    if let Some(value) = cli_args.get("territory_chunk_size") {
        if let Ok(size) = value.parse::<usize>() {
            config.union.territory_chunk_size = size;
        }
    }
    if let Some(value) = cli_args.get("strategy") {
        config.union.strategy = value.clone();
    }
    if let Some(value) = cli_args.get("max_features") {
        if let Ok(max) = value.parse::<usize>() {
            config.union.max_features = max;
        }
    }
    if let Some(value) = cli_args.get("simplify") {
        config.simplify.enabled = parse_bool(value);
    }
    if let Some(value) = cli_args.get("cache_capacity") {
        if let Ok(capacity) = value.parse::<usize>() {
            config.cache.capacity = capacity;
        }
    }
    if let Some(value) = cli_args.get("edge_threshold") {
        if let Ok(threshold) = value.parse::<usize>() {
            config.render.edge_threshold = threshold;
        }
    }
    if let Some(value) = cli_args.get("store_path") {
        config.entities.store_path = Some(PathBuf::from(value));
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert!(result.is_ok());
        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::set_var(CONFIG_PATH_ENV, "/nonexistent/zipcover.toml");
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let saved_capacity = env::var("ZIPCOVER_CACHE_CAPACITY").ok();
        env::remove_var("ZIPCOVER_CACHE_CAPACITY");
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[cache]").unwrap();
        writeln!(file, "capacity = 32").unwrap();
        writeln!(file, "[render]").unwrap();
        writeln!(file, "edge_threshold = 50").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.cache.capacity, 32);
        assert_eq!(config.render.edge_threshold, 50);

        if let Some(value) = saved_capacity {
            env::set_var("ZIPCOVER_CACHE_CAPACITY", value);
        }
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[cache\ncapacity = ").unwrap();

        let result = load_config(Some(&config_path), None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = ZipcoverConfig::default();

        env::set_var("ZIPCOVER_FEEDS", "a.geojson, b.geojson");
        env::set_var("ZIPCOVER_SIMPLIFY", "no");
        env::set_var("ZIPCOVER_GRID_RESOLUTION", "not-a-number");

        apply_environment_overrides(&mut config);

        env::remove_var("ZIPCOVER_FEEDS");
        env::remove_var("ZIPCOVER_SIMPLIFY");
        env::remove_var("ZIPCOVER_GRID_RESOLUTION");

        assert_eq!(
            config.catalog.feeds,
            vec![PathBuf::from("a.geojson"), PathBuf::from("b.geojson")]
        );
        assert!(!config.simplify.enabled);
        // unparsable values leave the file value in place
        assert_eq!(config.catalog.grid_resolution, 64);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = ZipcoverConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("strategy".to_string(), "pairwise".to_string());
        cli_args.insert("cache_capacity".to_string(), "0".to_string());

        apply_cli_overrides(&mut config, &cli_args);

        assert_eq!(config.union.strategy, "pairwise");
        assert_eq!(config.cache.capacity, 0);
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        // CLI overrides take precedence over environment variables
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[union]").unwrap();
        writeln!(file, "strategy = \"sequential\"").unwrap();
        writeln!(file, "max_features = 100").unwrap();

        env::set_var("ZIPCOVER_UNION_STRATEGY", "env-strategy");
        env::set_var("ZIPCOVER_MAX_FEATURES", "400");

        let mut cli_args = HashMap::new();
        cli_args.insert("strategy".to_string(), "pairwise".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();

        env::remove_var("ZIPCOVER_UNION_STRATEGY");
        env::remove_var("ZIPCOVER_MAX_FEATURES");

        // CLI wins for strategy, env wins for max_features (no CLI override)
        assert_eq!(config.union.strategy, "pairwise");
        assert_eq!(config.union.max_features, 400);
    }
}
