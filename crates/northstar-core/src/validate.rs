//! Import validation
//!
//! Produces dataset-level fatal issues (missing dataset, unmapped required
//! field) and row-level warnings (empty required value, non-numeric value,
//! unparseable date). Row warnings are capped globally per call.

use tracing::debug;

use crate::error::Result;
use crate::models::{DatasetKind, ImportPayload, RawRecord, ValidationIssue};
use crate::templates::{template_by_id, DatasetTemplate, TemplateField};
use crate::values::{parse_iso_date, parse_number};

/// Capped issue accumulator threaded through the validation walk
#[derive(Debug)]
pub struct IssueCollector {
    issues: Vec<ValidationIssue>,
    cap: usize,
}

impl IssueCollector {
    pub fn new(cap: usize) -> Self {
        Self {
            issues: Vec::new(),
            cap,
        }
    }

    /// Fatal issues bypass the cap
    pub fn fatal(&mut self, dataset: DatasetKind, message: impl Into<String>) {
        self.issues.push(ValidationIssue::fatal(dataset, message));
    }

    /// Record a row warning; returns false once the cap has been reached
    pub fn warn(&mut self, issue: ValidationIssue) -> bool {
        if self.is_full() {
            return false;
        }
        self.issues.push(issue);
        true
    }

    pub fn is_full(&self) -> bool {
        self.issues.len() >= self.cap
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }
}

/// Validate an import payload against its template
///
/// Fails only when the template id is unknown; every data problem is
/// returned as an issue. Callers treat issues where [`ValidationIssue::is_fatal`]
/// holds as blocking.
pub fn validate(payload: &ImportPayload, max_issues: usize) -> Result<Vec<ValidationIssue>> {
    let template = template_by_id(&payload.template_id)?;
    let mut collector = IssueCollector::new(max_issues);

    for dataset in template.datasets {
        validate_dataset(dataset, payload, &mut collector);
    }

    debug!(
        template = template.id,
        issues = collector.len(),
        "Validation finished"
    );
    Ok(collector.into_issues())
}

fn validate_dataset(
    dataset: &DatasetTemplate,
    payload: &ImportPayload,
    collector: &mut IssueCollector,
) {
    let records = payload.datasets.get(&dataset.id);

    if records.map_or(true, |r| r.is_empty()) && !dataset.optional {
        collector.fatal(
            dataset.id,
            format!(
                "Missing required dataset \"{}\", upload the matching CSV.",
                dataset.label
            ),
        );
        return;
    }

    // Optional dataset that was never uploaded
    let Some(records) = records else {
        return;
    };

    let mapping = payload.mappings.get(&dataset.id);
    let column_for = |field: &TemplateField| -> Option<&str> {
        mapping
            .and_then(|m| m.get(field.id.as_str()))
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
    };

    for field in dataset.required_fields() {
        if column_for(field).is_none() {
            collector.fatal(
                dataset.id,
                format!("Field \"{}\" is not mapped.", field.label),
            );
        }
    }

    let mapped: Vec<(&TemplateField, &str)> = dataset
        .fields
        .iter()
        .filter_map(|f| column_for(f).map(|c| (f, c)))
        .collect();
    if mapped.is_empty() {
        return;
    }

    for (index, record) in records.iter().enumerate() {
        if collector.is_full() {
            break;
        }
        for (field, column) in &mapped {
            if let Some(issue) = check_cell(dataset.id, index + 1, field, record, column) {
                if !collector.warn(issue) {
                    break;
                }
            }
        }
    }
}

fn check_cell(
    dataset: DatasetKind,
    row: usize,
    field: &TemplateField,
    record: &RawRecord,
    column: &str,
) -> Option<ValidationIssue> {
    let value = record.get(column).map(|v| v.trim()).unwrap_or_default();

    if value.is_empty() {
        return field.required.then(|| {
            ValidationIssue::row_warning(
                dataset,
                row,
                field.id,
                format!("Row {}: field \"{}\" is empty.", row, field.label),
            )
        });
    }

    if field.id.is_numeric() && parse_number(value).is_none() {
        return Some(ValidationIssue::row_warning(
            dataset,
            row,
            field.id,
            format!("Row {}: field \"{}\" must be a number.", row, field.label),
        ));
    }

    if field.id.is_date() && parse_iso_date(value).is_none() {
        return Some(ValidationIssue::row_warning(
            dataset,
            row,
            field.id,
            format!(
                "Row {}: field \"{}\" is not a valid date (YYYY-MM-DD).",
                row, field.label
            ),
        ));
    }

    None
}
