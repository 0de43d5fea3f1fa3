//! Export command implementation

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use northstar_core::{build_export, Database, ExportFormat};

/// Write the latest calculation to `output` (or its default file name)
///
/// Returns the path written.
pub fn cmd_export(db: &Database, format: &str, output: Option<&Path>) -> Result<PathBuf> {
    let format: ExportFormat = format
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid format '{}'. Use 'csv' or 'excel'", format))?;

    let export = build_export(db, format).context("Failed to build export")?;
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&export.file_name));

    let mut file = File::create(&path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    file.write_all(&export.bytes)?;

    println!(
        "✅ Exported latest calculation to {} ({} bytes)",
        path.display(),
        export.bytes.len()
    );
    Ok(path)
}
