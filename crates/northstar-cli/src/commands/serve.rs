//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};
use northstar_server::{ServerConfig, ALLOWED_ORIGINS_ENV};

use super::{load_config, open_db};

pub async fn cmd_serve(
    db_path: &Path,
    config_path: Option<&Path>,
    host: &str,
    port: u16,
    static_dir: Option<&Path>,
) -> Result<()> {
    println!("🚀 Starting Northstar web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }

    // Comma-separated origins; "*" allows any origin
    let allowed_origins =
        ServerConfig::parse_origins(&std::env::var(ALLOWED_ORIGINS_ENV).unwrap_or_default());
    if allowed_origins.iter().any(|o| o == "*") {
        println!("   ⚠️  CORS: any origin ({}=*)", ALLOWED_ORIGINS_ENV);
    } else if !allowed_origins.is_empty() {
        println!(
            "   🌐 CORS origins: {} ({})",
            allowed_origins.join(", "),
            ALLOWED_ORIGINS_ENV
        );
    }

    let pipeline = load_config(config_path)?;
    println!(
        "   Payload limit: {} bytes, issue cap: {}",
        pipeline.max_payload_bytes, pipeline.max_issues
    );
    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(db_path)?;

    let config = ServerConfig {
        allowed_origins,
        pipeline,
    };

    let static_dir_str = static_dir
        .map(|p| {
            p.to_str()
                .with_context(|| format!("Static dir is not valid UTF-8: {}", p.display()))
        })
        .transpose()?;
    northstar_server::serve_with_config(db, host, port, static_dir_str, config).await?;

    Ok(())
}
