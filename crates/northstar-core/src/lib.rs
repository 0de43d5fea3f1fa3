//! Northstar Core Library
//!
//! KPI import and calculation pipeline for the Northstar dashboard:
//! - Template registry describing datasets, fields, metrics and charts
//! - CSV parsing and field mapping onto template fields
//! - Validation with fatal issues and capped row warnings
//! - KPI calculation strategies per template family
//! - Append-only SQLite import store
//! - CSV and XLSX export of the latest calculation

pub mod calculator;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod import;
pub mod mapping;
pub mod models;
pub mod records;
pub mod templates;
pub mod validate;
pub mod values;

pub use calculator::{
    calculate, calculator_for, ConsumerGrowthCalculator, KpiCalculator,
    RecurringRevenueCalculator,
};
pub use config::PipelineConfig;
pub use db::Database;
pub use error::{Error, Result};
pub use export::{build_export, ExportFile, ExportFormat};
pub use import::{latest_import, process_import, seed_sample_import};
pub use mapping::{suggest_mapping, suggest_template_mappings, BoundDatasets, ColumnBinding};
pub use models::*;
pub use records::{parse_csv_records, ParsedTable};
pub use templates::{
    list_templates, template_by_id, template_listings, KpiTemplate, TemplateListing,
    DEFAULT_TEMPLATE_ID,
};
pub use validate::{validate, IssueCollector};
pub use values::{compute_change, to_number, MonthKey};
