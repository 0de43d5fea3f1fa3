//! CLI argument definitions using clap
//!
//! This module contains the clap structs for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use northstar_core::DatasetKind;

/// Northstar - KPI dashboards from plain CSV exports
#[derive(Parser)]
#[command(name = "northstar")]
#[command(about = "Import business CSVs and calculate SaaS KPIs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "northstar.db", global = true)]
    pub db: PathBuf,

    /// Pipeline config file (defaults to <data dir>/northstar/config.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// List KPI templates and the fields they expect
    Templates,

    /// Import CSV datasets and calculate KPIs
    Import {
        /// KPI template (b2b-saas, b2c-product)
        #[arg(short, long, default_value = northstar_core::DEFAULT_TEMPLATE_ID)]
        template: String,

        /// Dataset file as kind=path (e.g. subscriptions=subs.csv); repeatable
        #[arg(short, long = "dataset", value_parser = parse_dataset_arg)]
        datasets: Vec<DatasetFile>,

        /// Column override as kind.field=Column (e.g. churn.customerId="Account ID"); repeatable
        #[arg(short, long = "map", value_parser = parse_map_arg)]
        maps: Vec<MappingOverride>,

        /// Import the template's built-in sample data instead of files
        #[arg(long, conflicts_with = "datasets")]
        sample: bool,
    },

    /// Show the latest calculation
    Latest {
        /// Print the raw calculation as JSON
        #[arg(long)]
        json: bool,
    },

    /// List previous imports, newest first
    History {
        /// Maximum number of imports to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Export the latest calculation
    Export {
        /// Output format: csv or excel
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Output file (defaults to a timestamped name in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete every stored import
    Reset {
        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory containing the dashboard bundle to serve (e.g., ui/dist)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
}

/// A `--dataset kind=path` argument
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetFile {
    pub kind: DatasetKind,
    pub path: PathBuf,
}

/// A `--map kind.field=Column` argument
#[derive(Debug, Clone, PartialEq)]
pub struct MappingOverride {
    pub dataset: DatasetKind,
    pub field: String,
    pub column: String,
}

pub fn parse_dataset_arg(s: &str) -> Result<DatasetFile, String> {
    let (kind, path) = s
        .split_once('=')
        .ok_or_else(|| format!("Expected kind=path, got '{}'", s))?;
    let path = path.trim();
    if path.is_empty() {
        return Err(format!("Missing file path for dataset '{}'", kind));
    }

    Ok(DatasetFile {
        kind: kind.parse()?,
        path: PathBuf::from(path),
    })
}

pub fn parse_map_arg(s: &str) -> Result<MappingOverride, String> {
    let (target, column) = s
        .split_once('=')
        .ok_or_else(|| format!("Expected kind.field=Column, got '{}'", s))?;
    let (dataset, field) = target
        .split_once('.')
        .ok_or_else(|| format!("Expected kind.field before '=', got '{}'", target))?;

    let field = field.trim();
    if field.is_empty() {
        return Err(format!("Missing field name in '{}'", s));
    }

    Ok(MappingOverride {
        dataset: dataset.parse()?,
        field: field.to_string(),
        column: column.trim().to_string(),
    })
}
