//! Export of the latest calculation
//!
//! Supports:
//! - Delimited text (CSV) with a metrics table and a dataset summary table
//! - Workbook (XLSX) with Metrics, Dataset Summary and Charts sheets

use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::info;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{CalculationResult, DatasetKind};

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Excel,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Excel => "xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => CSV_CONTENT_TYPE,
            Self::Excel => XLSX_CONTENT_TYPE,
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" | "delimited" => Ok(Self::Csv),
            "excel" | "xlsx" | "workbook" => Ok(Self::Excel),
            other => Err(Error::InvalidData(format!(
                "Unsupported export format: {}",
                other
            ))),
        }
    }
}

/// A generated export ready to be written or served
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Export the latest import's calculation
pub fn build_export(db: &Database, format: ExportFormat) -> Result<ExportFile> {
    let record = db.latest_import()?.ok_or(Error::NothingToExport)?;

    let bytes = match format {
        ExportFormat::Csv => render_csv(&record.calculation).into_bytes(),
        ExportFormat::Excel => render_workbook(&record.calculation)?,
    };
    let file_name = export_file_name(record.created_at, format);

    info!(
        import_id = record.id,
        file = %file_name,
        bytes = bytes.len(),
        "Export generated"
    );

    Ok(ExportFile {
        file_name,
        content_type: format.content_type(),
        bytes,
    })
}

/// `northstar-metrics-YYYY-MM-DD-HH-MM-SS.<ext>`
pub fn export_file_name(created_at: DateTime<Utc>, format: ExportFormat) -> String {
    format!(
        "northstar-metrics-{}.{}",
        created_at.format("%Y-%m-%d-%H-%M-%S"),
        format.extension()
    )
}

/// Metrics table, blank row, dataset summary table; CRLF line endings
pub fn render_csv(calculation: &CalculationResult) -> String {
    let mut lines = vec!["Section,Metric,Value,Change,Format".to_string()];

    for metric in &calculation.metrics {
        lines.push(format!(
            "Metric,{},{},{},{}",
            escape_csv_field(&metric.title),
            metric.value,
            metric.change,
            metric.format
        ));
    }

    lines.push(String::new());
    lines.push("Section,Dataset,Rows,Last Date".to_string());

    for summary in &calculation.dataset_summary {
        lines.push(format!(
            "Dataset,{},{},{}",
            dataset_label(summary.dataset),
            summary.rows,
            escape_csv_field(summary.last_date.as_deref().unwrap_or(""))
        ));
    }

    lines.join("\r\n")
}

/// Three-sheet XLSX workbook
pub fn render_workbook(calculation: &CalculationResult) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Metrics")?;
    write_header(
        sheet,
        &header,
        &[("Metric", 28.0), ("Value", 15.0), ("Change", 12.0), ("Format", 12.0), ("Description", 50.0)],
    )?;
    for (i, metric) in calculation.metrics.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &metric.title)?;
        sheet.write_number(row, 1, metric.value)?;
        sheet.write_number(row, 2, metric.change)?;
        sheet.write_string(row, 3, metric.format.as_str())?;
        sheet.write_string(row, 4, &metric.description)?;
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name("Dataset Summary")?;
    write_header(
        sheet,
        &header,
        &[("Dataset", 24.0), ("Rows", 12.0), ("Last Date", 18.0)],
    )?;
    for (i, summary) in calculation.dataset_summary.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, dataset_label(summary.dataset))?;
        sheet.write_number(row, 1, summary.rows as f64)?;
        sheet.write_string(row, 2, summary.last_date.as_deref().unwrap_or(""))?;
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name("Charts")?;
    write_header(
        sheet,
        &header,
        &[("Chart", 32.0), ("Labels", 50.0), ("Dataset", 24.0), ("Values", 50.0)],
    )?;
    let mut row = 1u32;
    for chart in &calculation.charts {
        let labels = chart.data.labels.join(", ");
        for series in &chart.data.datasets {
            let values = series
                .data
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            sheet.write_string(row, 0, &chart.title)?;
            sheet.write_string(row, 1, &labels)?;
            sheet.write_string(row, 2, &series.label)?;
            sheet.write_string(row, 3, &values)?;
            row += 1;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_header(sheet: &mut Worksheet, format: &Format, columns: &[(&str, f64)]) -> Result<()> {
    for (col, (title, width)) in columns.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *title, format)?;
        sheet.set_column_width(col, *width)?;
    }
    Ok(())
}

/// Dataset name as shown in both export formats
fn dataset_label(kind: DatasetKind) -> String {
    kind.as_str().to_uppercase()
}

/// Escape a CSV field by wrapping in quotes if it contains special characters
fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
