//! Domain models for Northstar

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Input tables a template can require
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Subscriptions,
    Churn,
    Acquisition,
}

impl DatasetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subscriptions => "subscriptions",
            Self::Churn => "churn",
            Self::Acquisition => "acquisition",
        }
    }

    pub fn all() -> &'static [DatasetKind] {
        &[Self::Subscriptions, Self::Churn, Self::Acquisition]
    }
}

impl std::str::FromStr for DatasetKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "subscriptions" | "orders" => Ok(Self::Subscriptions),
            "churn" => Ok(Self::Churn),
            "acquisition" => Ok(Self::Acquisition),
            _ => Err(format!("Unknown dataset: {}", s)),
        }
    }
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Template field identifiers
///
/// The identifier also carries the semantic type of the column: `date` is a
/// date, `amount`/`cost`/`customers`/`visitors` are numeric, the rest are text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldId {
    Date,
    CustomerId,
    Plan,
    Amount,
    Currency,
    Reason,
    Channel,
    Cost,
    Customers,
    Visitors,
}

impl FieldId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::CustomerId => "customerId",
            Self::Plan => "plan",
            Self::Amount => "amount",
            Self::Currency => "currency",
            Self::Reason => "reason",
            Self::Channel => "channel",
            Self::Cost => "cost",
            Self::Customers => "customers",
            Self::Visitors => "visitors",
        }
    }

    /// Values must coerce to a finite number
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Amount | Self::Cost | Self::Customers | Self::Visitors
        )
    }

    /// Values must parse as an ISO date
    pub fn is_date(&self) -> bool {
        matches!(self, Self::Date)
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a metric value should be displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricFormat {
    Currency,
    Percentage,
    Number,
}

impl MetricFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Currency => "currency",
            Self::Percentage => "percentage",
            Self::Number => "number",
        }
    }
}

impl std::fmt::Display for MetricFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One uploaded row: raw column header -> raw cell value
pub type RawRecord = BTreeMap<String, String>;

/// Field id -> source column chosen by the user or by auto-suggestion
pub type FieldMapping = BTreeMap<String, String>;

/// Uploaded rows per dataset
pub type TemplateDatasets = BTreeMap<DatasetKind, Vec<RawRecord>>;

/// Column mappings per dataset
pub type TemplateMappings = BTreeMap<DatasetKind, FieldMapping>;

/// Body of an import request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPayload {
    pub template_id: String,
    #[serde(default)]
    pub datasets: TemplateDatasets,
    #[serde(default)]
    pub mappings: TemplateMappings,
}

/// Where a validation issue was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum IssueScope {
    /// Not tied to a dataset; never fatal
    General,
    Dataset(DatasetKind),
}

impl From<IssueScope> for String {
    fn from(scope: IssueScope) -> Self {
        match scope {
            IssueScope::General => "general".to_string(),
            IssueScope::Dataset(kind) => kind.as_str().to_string(),
        }
    }
}

impl TryFrom<String> for IssueScope {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        if value == "general" {
            Ok(Self::General)
        } else {
            value.parse().map(Self::Dataset)
        }
    }
}

/// A problem found while validating an import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub dataset: IssueScope,
    /// 1-based row number; absent for dataset-level issues
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl ValidationIssue {
    /// Dataset-level issue that blocks the import
    pub fn fatal(dataset: DatasetKind, message: impl Into<String>) -> Self {
        Self {
            dataset: IssueScope::Dataset(dataset),
            row: None,
            field: None,
            message: message.into(),
        }
    }

    /// Row-level warning; reported but never blocks the import
    pub fn row_warning(
        dataset: DatasetKind,
        row: usize,
        field: FieldId,
        message: impl Into<String>,
    ) -> Self {
        Self {
            dataset: IssueScope::Dataset(dataset),
            row: Some(row),
            field: Some(field.as_str().to_string()),
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.row.is_none() && self.dataset != IssueScope::General
    }
}

/// A computed KPI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricValue {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub value: f64,
    /// Percent change against the previous period (0 when not computable)
    pub change: f64,
    pub format: MetricFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// One named numeric series aligned with the chart labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub label: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    /// Ordered month keys (`YYYY-MM`, `Unknown` last)
    pub labels: Vec<String>,
    pub datasets: Vec<ChartSeries>,
}

/// Time-series chart produced by a calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    pub id: String,
    pub title: String,
    pub data: ChartData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub dataset: DatasetKind,
    pub rows: usize,
    /// Latest calendar month with data (primary revenue dataset only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_date: Option<String>,
}

/// Unit of persistence and of API responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub template_id: String,
    pub metrics: Vec<MetricValue>,
    pub charts: Vec<ChartConfig>,
    pub dataset_summary: Vec<DatasetSummary>,
}

impl CalculationResult {
    pub fn metric(&self, id: &str) -> Option<&MetricValue> {
        self.metrics.iter().find(|m| m.id == id)
    }

    pub fn chart(&self, id: &str) -> Option<&ChartConfig> {
        self.charts.iter().find(|c| c.id == id)
    }
}

/// A persisted import
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    pub id: i64,
    pub template_id: String,
    pub datasets: TemplateDatasets,
    pub mappings: TemplateMappings,
    pub calculation: CalculationResult,
    /// SHA-256 of the stored datasets JSON
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
}

/// Import history row without the payload blobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub id: i64,
    pub template_id: String,
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
}

/// New import ready to be appended
#[derive(Debug, Clone)]
pub struct NewImport<'a> {
    pub template_id: &'a str,
    pub datasets: &'a TemplateDatasets,
    pub mappings: &'a TemplateMappings,
    pub calculation: &'a CalculationResult,
}

/// Identity assigned by the store to an appended import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReceipt {
    pub id: i64,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful import
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub calculation: CalculationResult,
    pub import_id: i64,
    pub created_at: DateTime<Utc>,
    /// Row-level warnings; `None` when the data was clean
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<ValidationIssue>>,
}

/// Latest persisted calculation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestImport {
    pub calculation: CalculationResult,
    pub template_id: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_kind_roundtrip() {
        for kind in DatasetKind::all() {
            assert_eq!(kind.as_str().parse::<DatasetKind>().unwrap(), *kind);
        }
        assert_eq!("Orders".parse::<DatasetKind>().unwrap(), DatasetKind::Subscriptions);
        assert!("refunds".parse::<DatasetKind>().is_err());
    }

    #[test]
    fn test_field_id_serializes_camel_case() {
        let json = serde_json::to_string(&FieldId::CustomerId).unwrap();
        assert_eq!(json, "\"customerId\"");
        assert_eq!(FieldId::CustomerId.as_str(), "customerId");
    }

    #[test]
    fn test_field_semantics() {
        assert!(FieldId::Amount.is_numeric());
        assert!(FieldId::Visitors.is_numeric());
        assert!(!FieldId::CustomerId.is_numeric());
        assert!(FieldId::Date.is_date());
        assert!(!FieldId::Channel.is_date());
    }

    #[test]
    fn test_issue_scope_serialization() {
        let issue = ValidationIssue::fatal(DatasetKind::Churn, "missing");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["dataset"], "churn");
        assert!(json.get("row").is_none());
        assert!(json.get("field").is_none());

        let general: IssueScope = serde_json::from_str("\"general\"").unwrap();
        assert_eq!(general, IssueScope::General);
    }

    #[test]
    fn test_issue_fatality() {
        assert!(ValidationIssue::fatal(DatasetKind::Subscriptions, "x").is_fatal());
        assert!(
            !ValidationIssue::row_warning(DatasetKind::Subscriptions, 1, FieldId::Amount, "x")
                .is_fatal()
        );
        let general = ValidationIssue {
            dataset: IssueScope::General,
            row: None,
            field: None,
            message: "note".into(),
        };
        assert!(!general.is_fatal());
    }

    #[test]
    fn test_payload_defaults_missing_maps() {
        let payload: ImportPayload = serde_json::from_str(r#"{"templateId":"b2b-saas"}"#).unwrap();
        assert_eq!(payload.template_id, "b2b-saas");
        assert!(payload.datasets.is_empty());
        assert!(payload.mappings.is_empty());
    }

    #[test]
    fn test_payload_dataset_keys() {
        let payload: ImportPayload = serde_json::from_str(
            r#"{"templateId":"b2b-saas","datasets":{"churn":[{"date":"2024-01-01"}]},"mappings":{"churn":{"date":"date"}}}"#,
        )
        .unwrap();
        assert_eq!(payload.datasets[&DatasetKind::Churn].len(), 1);
        assert_eq!(payload.mappings[&DatasetKind::Churn]["date"], "date");
    }
}
