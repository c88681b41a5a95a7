// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # zipcover-observability
//!
//! Unified logging setup for the zipcover crates.
//!
//! Every crate logs through `tracing` with its crate name as the target, so
//! per-crate debug flags (`--debug-zipcover-union`, `ZIPCOVER_DEBUG=...`) can
//! raise one crate to `debug` while the rest stay at the base level.
//!
//! ## Features
//! - `file-logging`: per-run folders of rolling JSON log files with retention

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

// Re-export commonly used items
pub use cli::*;
pub use config::*;
pub use init::*;

/// Known zipcover crate names (log targets) for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "zipcover-structures",
    "zipcover-config",
    "zipcover-spatial",
    "zipcover-union",
    "zipcover-services",
    "zipcover",
];
