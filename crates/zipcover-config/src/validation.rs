//! Configuration validation
//!
//! Ensures configuration values are within range and consistent with each
//! other before the engine is built from them.

use crate::{ConfigError, ConfigResult, ZipcoverConfig};

/// Largest accepted grid index resolution (cells per axis)
pub const MAX_GRID_RESOLUTION: u16 = 1024;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const UNION_STRATEGIES: [&str; 2] = ["sequential", "pairwise"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    OutOfRange { field: String, value: String, range: String },
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange { field, value, range } => {
                write!(f, "{} = {} is outside valid range ({})", field, value, range)
            }
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &ZipcoverConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_catalog(config, &mut errors);
    validate_union(config, &mut errors);
    validate_simplify(config, &mut errors);
    validate_logging(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_catalog(config: &ZipcoverConfig, errors: &mut Vec<ConfigValidationError>) {
    let resolution = config.catalog.grid_resolution;
    if resolution == 0 || resolution > MAX_GRID_RESOLUTION {
        errors.push(ConfigValidationError::OutOfRange {
            field: "catalog.grid_resolution".to_string(),
            value: resolution.to_string(),
            range: format!("1-{}", MAX_GRID_RESOLUTION),
        });
    }
}

fn validate_union(config: &ZipcoverConfig, errors: &mut Vec<ConfigValidationError>) {
    for (field, value) in [
        ("union.selection_chunk_size", config.union.selection_chunk_size),
        ("union.territory_chunk_size", config.union.territory_chunk_size),
    ] {
        if value == 0 {
            errors.push(ConfigValidationError::InvalidValue {
                field: field.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
    }

    let strategy = config.union.strategy.trim().to_lowercase();
    if strategy.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "union.strategy".to_string(),
        });
    } else if !UNION_STRATEGIES.contains(&strategy.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "union.strategy".to_string(),
            reason: format!(
                "'{}' is not one of {}",
                config.union.strategy,
                UNION_STRATEGIES.join(", ")
            ),
        });
    }
}

fn validate_simplify(config: &ZipcoverConfig, errors: &mut Vec<ConfigValidationError>) {
    let simplify = &config.simplify;
    for (field, value) in [
        ("simplify.base_tolerance", simplify.base_tolerance),
        ("simplify.tolerance_scale", simplify.tolerance_scale),
        ("simplify.max_tolerance", simplify.max_tolerance),
    ] {
        if !value.is_finite() || value < 0.0 {
            errors.push(ConfigValidationError::InvalidValue {
                field: field.to_string(),
                reason: format!("{} must be a finite, non-negative number", value),
            });
        }
    }

    if simplify.max_tolerance < simplify.base_tolerance {
        errors.push(ConfigValidationError::InvalidValue {
            field: "simplify.max_tolerance".to_string(),
            reason: format!(
                "{} is below base_tolerance {}",
                simplify.max_tolerance, simplify.base_tolerance
            ),
        });
    }
}

fn validate_logging(config: &ZipcoverConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = config.logging.level.trim().to_lowercase();
    if level.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "logging.level".to_string(),
        });
    } else if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!("'{}' is not a log level", config.logging.level),
        });
    }
}
