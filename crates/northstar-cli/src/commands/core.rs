//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the import store
//! - `load_config` - Shared utility to resolve pipeline limits
//! - `cmd_init` - Initialize the database
//! - `cmd_templates` - List the KPI template catalog

use std::path::Path;

use anyhow::{Context, Result};
use northstar_core::{list_templates, Database, PipelineConfig};

use super::truncate;

/// Open the import store, creating it and running migrations if needed
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .with_context(|| format!("Database path is not valid UTF-8: {}", db_path.display()))?;
    Database::new(path_str).context("Failed to open database")
}

/// Resolve pipeline limits from defaults, override file and environment
pub fn load_config(config_path: Option<&Path>) -> Result<PipelineConfig> {
    PipelineConfig::load(config_path).context("Failed to load pipeline config")
}

pub fn cmd_init(db_path: &Path, config_path: Option<&Path>) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;
    let config = load_config(config_path)?;
    let imports = db.count_imports()?;

    println!("   Stored imports: {}", imports);
    println!(
        "   Payload limit: {} bytes, issue cap: {}",
        config.max_payload_bytes, config.max_issues
    );

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. See what each template expects: northstar templates");
    println!("  2. Import data: northstar import -d subscriptions=subs.csv -d churn=churn.csv");
    println!("  3. Start web UI: northstar serve");

    Ok(())
}

pub fn cmd_templates() -> Result<()> {
    for template in list_templates() {
        println!();
        println!("📋 {} ({})", template.name, template.id);
        println!("   {}", template.description);
        println!("   Best for: {}", template.recommended_for);

        for dataset in template.datasets {
            println!();
            let optional = if dataset.optional { " [optional]" } else { "" };
            println!("   {} `{}`{}", dataset.label, dataset.id, optional);

            for field in dataset.fields {
                let marker = if field.required { "*" } else { " " };
                println!(
                    "     {} {:<10} {:<20} {}",
                    marker,
                    field.id.as_str(),
                    field.label,
                    truncate(field.description, 50)
                );
            }
        }

        println!();
        println!("   Metrics:");
        for metric in template.metrics {
            println!("     - {} ({})", metric.title, metric.format);
        }
    }

    println!();
    println!("   * required field");
    Ok(())
}
