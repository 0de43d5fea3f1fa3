//! Integration tests for northstar-core
//!
//! These tests exercise the full CSV → mapping → import → export workflow.

use std::collections::BTreeMap;

use northstar_core::{
    build_export, latest_import, parse_csv_records, process_import, suggest_template_mappings,
    template_by_id, Database, DatasetKind, Error, ExportFormat, ImportPayload, PipelineConfig,
    TemplateDatasets, TemplateMappings,
};

fn subscriptions_csv() -> &'static str {
    r#"Date,Customer ID,Plan,Amount,Currency
2024-01-03,C0001,Pro,"$1,200.00",USD
2024-01-17,C0002,Starter,300,USD
2024-02-04,C0001,Pro,"$1,200.00",USD
2024-02-21,C0003,Starter,300,USD
2024-03-02,C0001,Pro,"$1,200.00",USD
2024-03-09,C0002,Starter,300,USD
2024-03-28,C0004,Growth,600,USD
"#
}

fn churn_csv() -> &'static str {
    r#"date,customerid,reason
2024-02-10,C0002,price
"#
}

fn acquisition_csv() -> &'static str {
    r#"DATE,Channel,Cost,Customers
2024-01-05,Paid Ads,900,3
2024-02-05,Paid Ads,600,2
2024-03-05,Events,1500,4
"#
}

/// Parse each CSV and build an import payload with suggested mappings
fn build_payload(files: &[(DatasetKind, &str)], overrides: TemplateMappings) -> ImportPayload {
    let template = template_by_id("b2b-saas").unwrap();
    let mut datasets = TemplateDatasets::new();
    let mut headers = BTreeMap::new();

    for (kind, text) in files {
        let table = parse_csv_records(text.as_bytes()).expect("Failed to parse CSV");
        headers.insert(*kind, table.headers);
        datasets.insert(*kind, table.records);
    }

    ImportPayload {
        template_id: template.id.to_string(),
        mappings: suggest_template_mappings(template, &headers, &overrides),
        datasets,
    }
}

fn customer_id_override() -> TemplateMappings {
    let mut overrides = TemplateMappings::new();
    overrides.insert(
        DatasetKind::Subscriptions,
        BTreeMap::from([("customerId".to_string(), "Customer ID".to_string())]),
    );
    overrides
}

#[test]
fn test_full_import_workflow() {
    let db = Database::in_memory().expect("Failed to create in-memory database");
    let config = PipelineConfig::default();

    let payload = build_payload(
        &[
            (DatasetKind::Subscriptions, subscriptions_csv()),
            (DatasetKind::Churn, churn_csv()),
            (DatasetKind::Acquisition, acquisition_csv()),
        ],
        customer_id_override(),
    );

    let subs_mapping = &payload.mappings[&DatasetKind::Subscriptions];
    assert_eq!(subs_mapping["amount"], "Amount");
    assert_eq!(subs_mapping["customerId"], "Customer ID");
    assert_eq!(payload.mappings[&DatasetKind::Churn]["customerId"], "customerid");
    assert_eq!(payload.mappings[&DatasetKind::Acquisition]["date"], "DATE");

    let outcome = process_import(&db, &payload, &config).expect("Import failed");
    assert!(outcome.warnings.is_none(), "{:?}", outcome.warnings);

    let calc = &outcome.calculation;
    // March: 1200 + 300 + 600, February: 1200 + 300
    assert_eq!(calc.metric("mrr").unwrap().value, 2100.0);
    assert_eq!(calc.metric("mrr").unwrap().change, 40.0);
    assert_eq!(calc.metric("arr").unwrap().value, 25200.0);
    // 1 churned of 4 customers
    assert_eq!(calc.metric("churnRate").unwrap().value, 25.0);
    // (5100 / 4) / 0.25
    assert_eq!(calc.metric("ltv").unwrap().value, 5100.0);

    let trend = calc.chart("acquisitionTrend").unwrap();
    assert_eq!(trend.data.labels, vec!["2024-01", "2024-02", "2024-03"]);
    assert_eq!(trend.data.datasets[0].data, vec![3.0, 2.0, 4.0]);
    assert_eq!(trend.data.datasets[1].data, vec![0.0, 1.0, 0.0]);

    let latest = latest_import(&db).unwrap().expect("Latest import missing");
    assert_eq!(latest.template_id, "b2b-saas");
    assert_eq!(latest.calculation, outcome.calculation);

    let csv = build_export(&db, ExportFormat::Csv).unwrap();
    let text = String::from_utf8(csv.bytes).unwrap();
    assert!(text.starts_with("Section,Metric,Value,Change,Format\r\n"));
    assert!(text.contains("\r\n\r\nSection,Dataset,Rows,Last Date\r\n"));
    assert!(text.contains("Dataset,SUBSCRIPTIONS,7,2024-03"));

    let xlsx = build_export(&db, ExportFormat::Excel).unwrap();
    assert_eq!(&xlsx.bytes[..2], b"PK");
}

#[test]
fn test_optional_dataset_can_be_skipped() {
    let db = Database::in_memory().unwrap();
    let payload = build_payload(
        &[
            (DatasetKind::Subscriptions, subscriptions_csv()),
            (DatasetKind::Churn, churn_csv()),
        ],
        customer_id_override(),
    );

    let outcome = process_import(&db, &payload, &PipelineConfig::default()).unwrap();
    let summary = &outcome.calculation.dataset_summary;
    assert_eq!(summary.len(), 3);
    assert_eq!(summary[2].dataset, DatasetKind::Acquisition);
    assert_eq!(summary[2].rows, 0);
}

#[test]
fn test_unmatched_header_blocks_import() {
    let db = Database::in_memory().unwrap();
    // Without the override "Customer ID" never matches customerId
    let payload = build_payload(
        &[
            (DatasetKind::Subscriptions, subscriptions_csv()),
            (DatasetKind::Churn, churn_csv()),
        ],
        TemplateMappings::new(),
    );

    let err = process_import(&db, &payload, &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, Error::ValidationFailed(_)));
    assert!(latest_import(&db).unwrap().is_none());
    assert!(matches!(
        build_export(&db, ExportFormat::Csv),
        Err(Error::NothingToExport)
    ));
}

#[test]
fn test_dirty_rows_are_reported() {
    let db = Database::in_memory().unwrap();
    let dirty = "Date,Customer ID,Amount\n2024-01-03,C1,abc\nsometime,C2,50\n2024-02-01,,75\n";
    let payload = build_payload(
        &[
            (DatasetKind::Subscriptions, dirty),
            (DatasetKind::Churn, churn_csv()),
        ],
        customer_id_override(),
    );

    let outcome = process_import(&db, &payload, &PipelineConfig::default()).unwrap();
    let warnings = outcome.warnings.expect("Expected row warnings");
    let rows: Vec<(Option<usize>, Option<&str>)> = warnings
        .iter()
        .map(|w| (w.row, w.field.as_deref()))
        .collect();
    assert_eq!(
        rows,
        vec![
            (Some(1), Some("amount")),
            (Some(2), Some("date")),
            (Some(3), Some("customerId")),
        ]
    );

    // Bad cells count as zero, the unknown date gets its own bucket
    let chart = outcome.calculation.chart("revenueTrend").unwrap();
    assert_eq!(chart.data.labels, vec!["2024-01", "2024-02", "Unknown"]);
    assert_eq!(chart.data.datasets[0].data, vec![0.0, 75.0, 50.0]);
}
