//! Logging settings

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Logging configuration, usually filled from `[logging]` in the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Base level (trace, debug, info, warn, error)
    pub level: String,

    /// Base directory for run folders
    pub log_dir: PathBuf,

    /// Write rolling files in addition to the console (needs `file-logging`)
    pub file_logging: bool,

    /// Remove run folders older than this many days
    pub retention_days: u64,

    /// Keep at most this many run folders
    pub retention_runs: usize,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            level: "info".to_string(),
            log_dir: PathBuf::from("./logs"),
            file_logging: false,
            retention_days: 7,
            retention_runs: 10,
        }
    }
}
