//! Northstar CLI - KPI import and calculation pipeline
//!
//! Usage:
//!   northstar init                                       Initialize database
//!   northstar import -d subscriptions=subs.csv -d churn=churn.csv
//!   northstar latest                                     Show the latest KPIs
//!   northstar export --format excel                      Export the latest KPIs
//!   northstar serve --port 3000                          Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.config.as_deref()),
        Commands::Templates => commands::cmd_templates(),
        Commands::Import {
            template,
            datasets,
            maps,
            sample,
        } => {
            let db = commands::open_db(&cli.db)?;
            let config = commands::load_config(cli.config.as_deref())?;
            if sample {
                commands::cmd_import_sample(&db, &config, &template)
            } else {
                commands::cmd_import(&db, &config, &template, &datasets, &maps)
            }
        }
        Commands::Latest { json } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_latest(&db, json)
        }
        Commands::History { limit } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_history(&db, limit)
        }
        Commands::Export { format, output } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_export(&db, &format, output.as_deref())?;
            Ok(())
        }
        Commands::Reset { yes } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_reset(&db, yes)
        }
        Commands::Serve {
            port,
            host,
            static_dir,
        } => {
            commands::cmd_serve(
                &cli.db,
                cli.config.as_deref(),
                &host,
                port,
                static_dir.as_deref(),
            )
            .await
        }
    }
}
