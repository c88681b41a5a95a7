/*!
ZIP Coverage Tool

Runs rectangle selections and territory builds against the configured feeds
and roster from the command line.

Example:
  cargo run --bin zipcover_select -- --set feeds=data/il.geojson select -87.9 41.5 -87.6 41.7
*/

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use tracing::debug;

use zipcover::config::{
    apply_cli_overrides, apply_environment_overrides, find_config_file, load_config, ZipcoverConfig,
};
use zipcover::observability::{debug_flags_help, init_logging, parse_debug_flags, LogSettings};
use zipcover::services::{
    copy_codes, CoverageContext, FileClipboard, MemoryClipboard, RenderPlan, RenderSink,
};
use zipcover::structures::EntityId;

/// ZIP-code territory selection and overview
#[derive(Parser, Debug)]
#[command(name = "zipcover_select", version, about, long_about = None, after_help = debug_flags_help())]
struct Cli {
    /// Configuration file (default: discovered)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override a configuration value (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    overrides: Vec<(String, String)>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// ZIPs touching the rectangle
    Select {
        #[arg(allow_negative_numbers = true)]
        west: f64,
        #[arg(allow_negative_numbers = true)]
        south: f64,
        #[arg(allow_negative_numbers = true)]
        east: f64,
        #[arg(allow_negative_numbers = true)]
        north: f64,

        /// Write the comma-joined codes to a file
        #[arg(long)]
        copy_to: Option<PathBuf>,

        /// Print a JSON summary instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Highlight one entity's territory
    Entity { id: String },
    /// Build every entity's territory
    Territories,
    /// List (or search) the roster
    Entities { query: Vec<String> },
    /// Add an entity
    Add {
        name: String,
        contact: String,
        /// Comma- or space-separated ZIP codes
        codes: String,
    },
    /// Remove an entity
    Remove { id: String },
    /// Restore the seed roster
    Reset,
}

fn parse_key_value(pair: &str) -> Result<(String, String), String> {
    let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", pair))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

/// `--debug-<crate>` flags are read by `parse_debug_flags`, not clap
fn without_debug_flags<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter().filter(|arg| !arg.starts_with("--debug-")).collect()
}

impl Cli {
    fn override_map(&self) -> HashMap<String, String> {
        self.overrides.iter().cloned().collect()
    }
}

/// Explicit file, else a discovered file, else defaults; then env and CLI
fn resolve_config(cli: &Cli) -> Result<ZipcoverConfig> {
    let overrides = cli.override_map();
    if let Some(path) = &cli.config {
        return load_config(Some(path.as_path()), Some(&overrides))
            .with_context(|| format!("Failed to load {}", path.display()));
    }
    if let Ok(path) = find_config_file() {
        return load_config(Some(path.as_path()), Some(&overrides))
            .with_context(|| format!("Failed to load {}", path.display()));
    }

    let mut config = ZipcoverConfig::default();
    apply_environment_overrides(&mut config);
    apply_cli_overrides(&mut config, &overrides);
    Ok(config)
}

/// Prints plans as text
struct TextSink;

impl RenderSink for TextSink {
    fn render(&mut self, plan: &RenderPlan) {
        let Some(label) = &plan.label else {
            return;
        };
        let extent = plan
            .bounds
            .map(|b| format!("[{:.4}, {:.4}, {:.4}, {:.4}]", b.min_x, b.min_y, b.max_x, b.max_y))
            .unwrap_or_else(|| "-".to_string());
        println!("   {} {}  {}", plan.color, label.text, extent);
    }

    fn progress(&mut self, message: &str) {
        debug!(target: "zipcover", "{}", message);
    }
}

fn print_plan_lines(plan: &RenderPlan) {
    for line in &plan.display_lines {
        println!("   {}", line);
    }
    if plan.edges.is_none() && !plan.codes.is_empty() {
        println!("   (per-ZIP edges skipped: {} regions)", plan.codes.len());
    }
}

fn run(ctx: &CoverageContext, command: &Command) -> Result<()> {
    match command {
        Command::Select {
            west,
            south,
            east,
            north,
            copy_to,
            json,
        } => {
            let view = ctx.select_wsen(*west, *south, *east, *north)?;

            if *json {
                let summary = serde_json::json!({
                    "codes": view.selection.codes,
                    "faults": view.selection.faults,
                    "source_key": view.union.source_key.as_str(),
                    "simplified": view.union.simplified,
                    "area": view.union.area(),
                    "bounds": view.plan.bounds.map(|b| [b.min_x, b.min_y, b.max_x, b.max_y]),
                });
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else if view.selection.is_empty() {
                println!("🔍 No ZIPs in that rectangle");
            } else {
                println!("🔍 {}", view.selection.summary());
                print_plan_lines(&view.plan);
            }

            if let Some(path) = copy_to {
                match copy_codes(&FileClipboard::new(path), &MemoryClipboard::new(), &view.selection.codes) {
                    Ok(message) => println!("📋 {}", message),
                    Err(e) => println!("❌ {}", e),
                }
            }
        }
        Command::Entity { id } => {
            let view = ctx.highlight_entity(&EntityId::from(id.as_str()))?;
            println!("👤 {}", view.entity.name);
            if view.plan.is_blank() {
                println!("   No resolvable ZIPs");
            } else {
                TextSink.render(&view.plan);
                print_plan_lines(&view.plan);
            }
            if !view.missing.is_empty() {
                println!("⚠️  Not in catalog: {}", view.missing.join(", "));
            }
        }
        Command::Territories => {
            println!("🗺️  Building territories...");
            let drawn = ctx.build_all_territories_into(&mut TextSink);
            println!("   ✅ {} territories", drawn);
        }
        Command::Entities { query } => {
            for entity in ctx.search_entities(&query.join(" ")) {
                let missing = ctx.missing_codes(&entity);
                println!(
                    "   {:<38} {:<24} {} ZIPs{}",
                    entity.id,
                    entity.name,
                    entity.codes.len(),
                    if missing.is_empty() {
                        String::new()
                    } else {
                        format!(" ({} unknown)", missing.len())
                    }
                );
            }
        }
        Command::Add { name, contact, codes } => {
            let entity = ctx.add_entity(name, contact, codes)?;
            println!("✅ Added {} ({}) with {} ZIPs", entity.name, entity.id, entity.codes.len());
        }
        Command::Remove { id } => {
            let entity = ctx.remove_entity(&EntityId::from(id.as_str()))?;
            println!("🗑️  Removed {}", entity.name);
        }
        Command::Reset => {
            let roster = ctx.reset_entities()?;
            println!("🔄 Restored {} seed entities", roster.len());
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse_from(without_debug_flags(env::args()));

    let config = resolve_config(&cli)?;

    let log_settings = LogSettings {
        level: config.logging.level.clone(),
        log_dir: config.logging.log_dir.clone(),
        file_logging: config.logging.file_logging,
        retention_days: config.logging.retention_days,
        retention_runs: config.logging.retention_runs,
    };
    let _logging = init_logging(&parse_debug_flags(), &log_settings)?;

    if config.catalog.feeds.is_empty() {
        eprintln!("⚠️  No feeds configured; set [catalog] feeds or ZIPCOVER_FEEDS");
    }

    let ctx = CoverageContext::from_config(&config)?;
    run(&ctx, &cli.command)
}
