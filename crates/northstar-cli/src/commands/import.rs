//! Import command implementations

use std::collections::BTreeMap;
use std::fs::File;

use anyhow::{Context, Result};
use northstar_core::{
    parse_csv_records, process_import, seed_sample_import, suggest_template_mappings,
    template_by_id, Database, DatasetKind, ImportOutcome, ImportPayload, PipelineConfig,
    TemplateDatasets, TemplateMappings,
};

use super::print_metrics;
use crate::cli::{DatasetFile, MappingOverride};

/// Read the dataset files and resolve mappings for an import
///
/// Explicit `--map` overrides win; remaining fields are auto-suggested from
/// the CSV headers.
pub fn build_payload(
    template_id: &str,
    files: &[DatasetFile],
    overrides: &[MappingOverride],
) -> Result<ImportPayload> {
    let template = template_by_id(template_id)?;

    let mut datasets = TemplateDatasets::new();
    let mut headers: BTreeMap<DatasetKind, Vec<String>> = BTreeMap::new();

    for file in files {
        if template.dataset(file.kind).is_none() {
            anyhow::bail!(
                "Template '{}' has no '{}' dataset",
                template.id,
                file.kind
            );
        }
        if datasets.contains_key(&file.kind) {
            anyhow::bail!("Dataset '{}' given more than once", file.kind);
        }

        let csv_file = File::open(&file.path)
            .with_context(|| format!("Failed to open file: {}", file.path.display()))?;
        let table = parse_csv_records(csv_file)
            .with_context(|| format!("Failed to parse CSV: {}", file.path.display()))?;

        headers.insert(file.kind, table.headers);
        datasets.insert(file.kind, table.records);
    }

    let mut existing = TemplateMappings::new();
    for o in overrides {
        let dataset = template.dataset(o.dataset).with_context(|| {
            format!("Template '{}' has no '{}' dataset", template.id, o.dataset)
        })?;
        if !dataset.fields.iter().any(|f| f.id.as_str() == o.field) {
            let known: Vec<&str> = dataset.fields.iter().map(|f| f.id.as_str()).collect();
            anyhow::bail!(
                "Unknown field '{}' for dataset '{}' (expected one of: {})",
                o.field,
                o.dataset,
                known.join(", ")
            );
        }
        existing
            .entry(o.dataset)
            .or_default()
            .insert(o.field.clone(), o.column.clone());
    }

    let mappings = suggest_template_mappings(template, &headers, &existing);

    Ok(ImportPayload {
        template_id: template.id.to_string(),
        datasets,
        mappings,
    })
}

pub fn cmd_import(
    db: &Database,
    config: &PipelineConfig,
    template_id: &str,
    files: &[DatasetFile],
    overrides: &[MappingOverride],
) -> Result<()> {
    if files.is_empty() {
        anyhow::bail!("No datasets given. Use --dataset kind=file.csv or --sample");
    }

    println!("📥 Importing {} dataset(s) with template {}...", files.len(), template_id);

    let payload = build_payload(template_id, files, overrides)?;

    for (kind, records) in &payload.datasets {
        println!("   {}: {} rows", kind, records.len());
        if let Some(mapping) = payload.mappings.get(kind) {
            let pairs: Vec<String> = mapping
                .iter()
                .map(|(field, column)| format!("{} ← {}", field, column))
                .collect();
            println!("      mapped: {}", pairs.join(", "));
        }
    }

    let outcome = process_import(db, &payload, config).context("Import failed")?;
    print_outcome(&outcome);

    Ok(())
}

pub fn cmd_import_sample(db: &Database, config: &PipelineConfig, template_id: &str) -> Result<()> {
    println!("🌱 Importing sample data for {}...", template_id);

    let outcome = seed_sample_import(db, template_id, config).context("Sample import failed")?;
    print_outcome(&outcome);

    Ok(())
}

fn print_outcome(outcome: &ImportOutcome) {
    println!("✅ Import #{} complete!", outcome.import_id);
    print_metrics(&outcome.calculation);

    if let Some(warnings) = &outcome.warnings {
        println!();
        println!("⚠️  {} row warning(s):", warnings.len());
        for issue in warnings {
            println!("   - [{}] {}", String::from(issue.dataset), issue.message);
        }
    }
}
