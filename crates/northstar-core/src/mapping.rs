//! Field mapping: binding template fields to uploaded columns
//!
//! Uploaded rows are untyped (`header -> string`). This module is the only
//! place that reads them by column name: it suggests mappings from headers,
//! resolves the mapped column for each field, and converts raw rows into typed
//! rows for the calculator.

use std::collections::BTreeMap;

use crate::models::{DatasetKind, FieldId, FieldMapping, RawRecord, TemplateDatasets, TemplateMappings};
use crate::templates::{KpiTemplate, TemplateField};
use crate::values::{to_number, MonthKey};

/// Suggest a mapping by matching field ids to headers, ignoring case
///
/// Existing non-empty entries are kept as-is; for the remaining fields the
/// first header equal to the field id wins. Unmatched fields stay unmapped.
pub fn suggest_mapping(
    headers: &[String],
    fields: &[TemplateField],
    existing: &FieldMapping,
) -> FieldMapping {
    let mut mapping = existing.clone();

    for field in fields {
        let key = field.id.as_str();
        if mapping.get(key).is_some_and(|column| !column.trim().is_empty()) {
            continue;
        }
        let wanted = key.to_lowercase();
        if let Some(header) = headers.iter().find(|h| h.to_lowercase() == wanted) {
            mapping.insert(key.to_string(), header.clone());
        }
    }

    mapping
}

/// Run [`suggest_mapping`] for every template dataset that has headers
///
/// Datasets without headers keep whatever mapping already exists.
pub fn suggest_template_mappings(
    template: &KpiTemplate,
    headers: &BTreeMap<DatasetKind, Vec<String>>,
    existing: &TemplateMappings,
) -> TemplateMappings {
    let mut mappings = existing.clone();

    for dataset in template.datasets {
        if let Some(dataset_headers) = headers.get(&dataset.id) {
            let current = existing.get(&dataset.id).cloned().unwrap_or_default();
            let suggested = suggest_mapping(dataset_headers, dataset.fields, &current);
            mappings.insert(dataset.id, suggested);
        }
    }

    mappings
}

/// Resolves template fields to source columns for one dataset
#[derive(Debug, Clone, Copy)]
pub struct ColumnBinding<'a> {
    mapping: Option<&'a FieldMapping>,
}

impl<'a> ColumnBinding<'a> {
    pub fn new(mapping: Option<&'a FieldMapping>) -> Self {
        Self { mapping }
    }

    /// Explicitly mapped column, if any
    pub fn mapped(&self, field: FieldId) -> Option<&'a str> {
        self.mapping
            .and_then(|m| m.get(field.as_str()))
            .map(|column| column.trim())
            .filter(|column| !column.is_empty())
    }

    /// Column to read; unmapped fields fall back to a column named like the field
    pub fn column(&self, field: FieldId) -> &'a str {
        self.mapped(field).unwrap_or(field.as_str())
    }

    pub fn value<'r>(&self, record: &'r RawRecord, field: FieldId) -> Option<&'r str> {
        record.get(self.column(field)).map(String::as_str)
    }

    fn identifier(&self, record: &RawRecord, field: FieldId) -> Option<String> {
        self.value(record, field)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}

/// Revenue or order row
#[derive(Debug, Clone, PartialEq)]
pub struct RevenueRow {
    pub month: MonthKey,
    pub customer_id: Option<String>,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChurnRow {
    pub month: MonthKey,
    pub customer_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionRow {
    pub month: MonthKey,
    pub cost: f64,
    pub customers: f64,
    pub visitors: f64,
}

/// Uploaded datasets converted to typed rows
#[derive(Debug, Clone, Default)]
pub struct BoundDatasets {
    pub revenue: Vec<RevenueRow>,
    pub churn: Vec<ChurnRow>,
    pub acquisition: Vec<AcquisitionRow>,
}

impl BoundDatasets {
    /// Bind raw rows through their mappings; missing datasets become empty
    pub fn bind(datasets: &TemplateDatasets, mappings: &TemplateMappings) -> Self {
        let rows = |kind: DatasetKind| -> (&[RawRecord], ColumnBinding<'_>) {
            (
                datasets.get(&kind).map(Vec::as_slice).unwrap_or_default(),
                ColumnBinding::new(mappings.get(&kind)),
            )
        };

        let (records, binding) = rows(DatasetKind::Subscriptions);
        let revenue = records
            .iter()
            .map(|r| RevenueRow {
                month: MonthKey::from_date_str(binding.value(r, FieldId::Date)),
                customer_id: binding.identifier(r, FieldId::CustomerId),
                amount: to_number(binding.value(r, FieldId::Amount)),
            })
            .collect();

        let (records, binding) = rows(DatasetKind::Churn);
        let churn = records
            .iter()
            .map(|r| ChurnRow {
                month: MonthKey::from_date_str(binding.value(r, FieldId::Date)),
                customer_id: binding.identifier(r, FieldId::CustomerId),
            })
            .collect();

        let (records, binding) = rows(DatasetKind::Acquisition);
        let acquisition = records
            .iter()
            .map(|r| AcquisitionRow {
                month: MonthKey::from_date_str(binding.value(r, FieldId::Date)),
                cost: to_number(binding.value(r, FieldId::Cost)),
                customers: to_number(binding.value(r, FieldId::Customers)),
                visitors: to_number(binding.value(r, FieldId::Visitors)),
            })
            .collect();

        Self {
            revenue,
            churn,
            acquisition,
        }
    }

    pub fn row_count(&self, kind: DatasetKind) -> usize {
        match kind {
            DatasetKind::Subscriptions => self.revenue.len(),
            DatasetKind::Churn => self.churn.len(),
            DatasetKind::Acquisition => self.acquisition.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::template_by_id;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn record(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn subscription_fields() -> &'static [TemplateField] {
        template_by_id("b2b-saas")
            .unwrap()
            .dataset(DatasetKind::Subscriptions)
            .unwrap()
            .fields
    }

    #[test]
    fn test_suggest_matches_case_insensitively() {
        let mapping = suggest_mapping(
            &headers(&["DATE", "CustomerID", "Amount", "notes"]),
            subscription_fields(),
            &FieldMapping::new(),
        );
        assert_eq!(mapping["date"], "DATE");
        assert_eq!(mapping["customerId"], "CustomerID");
        assert_eq!(mapping["amount"], "Amount");
        assert!(!mapping.contains_key("plan"));
    }

    #[test]
    fn test_suggest_exact_names_only() {
        let mapping = suggest_mapping(
            &headers(&["customer_id", "amount_usd"]),
            subscription_fields(),
            &FieldMapping::new(),
        );
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_suggest_first_match_wins() {
        let mapping = suggest_mapping(
            &headers(&["amount", "AMOUNT"]),
            subscription_fields(),
            &FieldMapping::new(),
        );
        assert_eq!(mapping["amount"], "amount");
    }

    #[test]
    fn test_suggest_keeps_existing_mapping() {
        let mut existing = FieldMapping::new();
        existing.insert("amount".into(), "Revenue".into());
        existing.insert("date".into(), String::new());
        existing.insert("customerId".into(), "   ".into());

        let mapping = suggest_mapping(
            &headers(&["date", "amount", "Revenue", "CustomerId"]),
            subscription_fields(),
            &existing,
        );
        assert_eq!(mapping["amount"], "Revenue");
        // Empty or blank selections count as unmapped
        assert_eq!(mapping["date"], "date");
        assert_eq!(mapping["customerId"], "CustomerId");
    }

    #[test]
    fn test_suggest_is_idempotent() {
        let hdrs = headers(&["Date", "customerid", "Plan", "amount"]);
        let first = suggest_mapping(&hdrs, subscription_fields(), &FieldMapping::new());
        let second = suggest_mapping(&hdrs, subscription_fields(), &FieldMapping::new());
        assert_eq!(first, second);
        let reapplied = suggest_mapping(&hdrs, subscription_fields(), &first);
        assert_eq!(first, reapplied);
    }

    #[test]
    fn test_suggest_template_mappings() {
        let template = template_by_id("b2b-saas").unwrap();
        let mut all_headers = BTreeMap::new();
        all_headers.insert(DatasetKind::Churn, headers(&["Date", "CustomerId"]));

        let mut existing = TemplateMappings::new();
        existing.insert(
            DatasetKind::Subscriptions,
            FieldMapping::from([("amount".to_string(), "Revenue".to_string())]),
        );

        let mappings = suggest_template_mappings(template, &all_headers, &existing);
        assert_eq!(mappings[&DatasetKind::Churn]["date"], "Date");
        assert_eq!(mappings[&DatasetKind::Subscriptions]["amount"], "Revenue");
        assert!(!mappings.contains_key(&DatasetKind::Acquisition));
    }

    #[test]
    fn test_binding_falls_back_to_field_id() {
        let mapping = FieldMapping::from([("amount".to_string(), "Revenue".to_string())]);
        let binding = ColumnBinding::new(Some(&mapping));
        assert_eq!(binding.column(FieldId::Amount), "Revenue");
        assert_eq!(binding.column(FieldId::Date), "date");
        assert_eq!(binding.mapped(FieldId::Date), None);

        let blank = FieldMapping::from([("date".to_string(), "  ".to_string())]);
        let binding = ColumnBinding::new(Some(&blank));
        assert_eq!(binding.mapped(FieldId::Date), None);
        assert_eq!(binding.column(FieldId::Date), "date");

        let padded = FieldMapping::from([("date".to_string(), " Date ".to_string())]);
        assert_eq!(ColumnBinding::new(Some(&padded)).column(FieldId::Date), "Date");

        let unbound = ColumnBinding::new(None);
        assert_eq!(unbound.column(FieldId::CustomerId), "customerId");
    }

    #[test]
    fn test_bind_typed_rows() {
        let mut datasets = TemplateDatasets::new();
        datasets.insert(
            DatasetKind::Subscriptions,
            vec![
                record(&[("Day", "2024-01-05"), ("Client", "C1"), ("Revenue", "$1,200")]),
                record(&[("Day", "soon"), ("Client", "  "), ("Revenue", "oops")]),
            ],
        );
        datasets.insert(
            DatasetKind::Acquisition,
            vec![record(&[("date", "2024-02-01"), ("cost", "300"), ("customers", "6")])],
        );

        let mut mappings = TemplateMappings::new();
        mappings.insert(
            DatasetKind::Subscriptions,
            FieldMapping::from([
                ("date".to_string(), "Day".to_string()),
                ("customerId".to_string(), "Client".to_string()),
                ("amount".to_string(), "Revenue".to_string()),
            ]),
        );

        let bound = BoundDatasets::bind(&datasets, &mappings);
        assert_eq!(bound.revenue.len(), 2);
        assert_eq!(bound.revenue[0].month.to_string(), "2024-01");
        assert_eq!(bound.revenue[0].customer_id.as_deref(), Some("C1"));
        assert_eq!(bound.revenue[0].amount, 1200.0);
        assert_eq!(bound.revenue[1].month, MonthKey::Unknown);
        assert_eq!(bound.revenue[1].customer_id, None);
        assert_eq!(bound.revenue[1].amount, 0.0);

        assert_eq!(bound.acquisition[0].cost, 300.0);
        assert_eq!(bound.acquisition[0].visitors, 0.0);
        assert_eq!(bound.row_count(DatasetKind::Churn), 0);
    }
}
