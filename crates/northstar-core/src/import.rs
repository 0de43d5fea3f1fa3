//! Import pipeline: size check, validation, calculation, persistence

use tracing::{info, warn};

use crate::calculator::calculate;
use crate::config::PipelineConfig;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{ImportOutcome, ImportPayload, LatestImport, NewImport};
use crate::templates::{identity_mappings, sample_datasets, template_by_id};
use crate::validate::validate;

/// Run one import end to end
///
/// Nothing is persisted unless validation finds no fatal issue. Row warnings
/// are returned with the outcome rather than failing the import.
pub fn process_import(
    db: &Database,
    payload: &ImportPayload,
    config: &PipelineConfig,
) -> Result<ImportOutcome> {
    let size = serde_json::to_vec(&payload.datasets)?.len();
    if size > config.max_payload_bytes {
        warn!(size, limit = config.max_payload_bytes, "Import payload too large");
        return Err(Error::PayloadTooLarge {
            size,
            limit: config.max_payload_bytes,
        });
    }

    let issues = validate(payload, config.max_issues)?;
    if let Some(fatal) = issues.iter().find(|i| i.is_fatal()) {
        warn!(
            template = %payload.template_id,
            dataset = %String::from(fatal.dataset),
            "Import rejected: {}",
            fatal.message
        );
        return Err(Error::ValidationFailed(fatal.message.clone()));
    }

    let calculation = calculate(&payload.template_id, &payload.datasets, &payload.mappings)?;

    let receipt = db.append_import(&NewImport {
        template_id: &payload.template_id,
        datasets: &payload.datasets,
        mappings: &payload.mappings,
        calculation: &calculation,
    })?;

    if !issues.is_empty() {
        warn!(
            import_id = receipt.id,
            warnings = issues.len(),
            "Import stored with row warnings"
        );
    }
    info!(
        import_id = receipt.id,
        template = %payload.template_id,
        metrics = calculation.metrics.len(),
        "Import complete"
    );

    Ok(ImportOutcome {
        calculation,
        import_id: receipt.id,
        created_at: receipt.created_at,
        warnings: (!issues.is_empty()).then_some(issues),
    })
}

/// Calculation of the most recent import, if any
pub fn latest_import(db: &Database) -> Result<Option<LatestImport>> {
    Ok(db.latest_import()?.map(|record| LatestImport {
        calculation: record.calculation,
        template_id: record.template_id,
        created_at: record.created_at,
    }))
}

/// Import the built-in sample data of a template
pub fn seed_sample_import(
    db: &Database,
    template_id: &str,
    config: &PipelineConfig,
) -> Result<ImportOutcome> {
    let template = template_by_id(template_id)?;
    let payload = ImportPayload {
        template_id: template.id.to_string(),
        datasets: sample_datasets(template.id)?,
        mappings: identity_mappings(template),
    };

    info!(template = template.id, "Seeding sample import");
    process_import(db, &payload, config)
}
