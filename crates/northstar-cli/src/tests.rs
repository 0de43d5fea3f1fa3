//! CLI command tests

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use northstar_core::{latest_import, Database, DatasetKind, MetricFormat, MetricValue, PipelineConfig};

use crate::cli::{parse_dataset_arg, parse_map_arg, Cli, Commands, DatasetFile, MappingOverride};
use crate::commands::{self, truncate};

const SUBSCRIPTIONS_CSV: &str = "\
Date,Customer ID,Amount,Plan
2024-01-15,c1,1000,Pro
2024-02-15,c1,1000,Pro
2024-02-20,c2,500,Starter
";

const CHURN_CSV: &str = "\
date,customerId
2024-02-28,c3
";

fn setup_test_db() -> Database {
    Database::in_memory().unwrap()
}

fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn b2b_files(dir: &Path) -> Vec<DatasetFile> {
    vec![
        DatasetFile {
            kind: DatasetKind::Subscriptions,
            path: write_csv(dir, "subs.csv", SUBSCRIPTIONS_CSV),
        },
        DatasetFile {
            kind: DatasetKind::Churn,
            path: write_csv(dir, "churn.csv", CHURN_CSV),
        },
    ]
}

fn customer_override() -> MappingOverride {
    MappingOverride {
        dataset: DatasetKind::Subscriptions,
        field: "customerId".into(),
        column: "Customer ID".into(),
    }
}

// ========== Argument Parsing Tests ==========

#[test]
fn test_parse_dataset_arg() {
    let file = parse_dataset_arg("subscriptions=data/subs.csv").unwrap();
    assert_eq!(file.kind, DatasetKind::Subscriptions);
    assert_eq!(file.path, PathBuf::from("data/subs.csv"));

    // "orders" is an alias for the revenue dataset
    assert_eq!(
        parse_dataset_arg("orders=o.csv").unwrap().kind,
        DatasetKind::Subscriptions
    );

    assert!(parse_dataset_arg("subs.csv").is_err());
    assert!(parse_dataset_arg("payments=p.csv").is_err());
    assert!(parse_dataset_arg("churn=").is_err());
}

#[test]
fn test_parse_map_arg() {
    let o = parse_map_arg("churn.customerId=Account ID").unwrap();
    assert_eq!(o.dataset, DatasetKind::Churn);
    assert_eq!(o.field, "customerId");
    assert_eq!(o.column, "Account ID");

    assert!(parse_map_arg("churn=Account").is_err());
    assert!(parse_map_arg("churn.customerId").is_err());
    assert!(parse_map_arg("churn.=Account").is_err());
    assert!(parse_map_arg("payments.amount=Total").is_err());
}

#[test]
fn test_cli_import_args() {
    let cli = Cli::try_parse_from([
        "northstar",
        "--db",
        "kpi.db",
        "import",
        "-d",
        "subscriptions=subs.csv",
        "--dataset",
        "churn=churn.csv",
        "--map",
        "subscriptions.customerId=Customer ID",
    ])
    .unwrap();

    assert_eq!(cli.db, PathBuf::from("kpi.db"));
    match cli.command {
        Commands::Import {
            template,
            datasets,
            maps,
            sample,
        } => {
            assert_eq!(template, "b2b-saas");
            assert_eq!(datasets.len(), 2);
            assert_eq!(datasets[1].kind, DatasetKind::Churn);
            assert_eq!(maps, vec![customer_override()]);
            assert!(!sample);
        }
        _ => panic!("expected import command"),
    }
}

#[test]
fn test_cli_sample_conflicts_with_datasets() {
    let result = Cli::try_parse_from([
        "northstar",
        "import",
        "--sample",
        "-d",
        "subscriptions=subs.csv",
    ]);
    assert!(result.is_err());
}

// ========== Import Command Tests ==========

#[test]
fn test_build_payload_suggests_and_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let payload =
        commands::build_payload("b2b-saas", &b2b_files(dir.path()), &[customer_override()])
            .unwrap();

    assert_eq!(payload.template_id, "b2b-saas");
    assert_eq!(payload.datasets[&DatasetKind::Subscriptions].len(), 3);

    let subs = &payload.mappings[&DatasetKind::Subscriptions];
    assert_eq!(subs["date"], "Date");
    assert_eq!(subs["amount"], "Amount");
    assert_eq!(subs["plan"], "Plan");
    assert_eq!(subs["customerId"], "Customer ID");
    assert!(!subs.contains_key("currency"));

    let churn = &payload.mappings[&DatasetKind::Churn];
    assert_eq!(churn["customerId"], "customerId");
}

#[test]
fn test_build_payload_rejects_unknown_field() {
    let dir = tempfile::tempdir().unwrap();
    let bad = MappingOverride {
        dataset: DatasetKind::Churn,
        field: "amount".into(),
        column: "Total".into(),
    };
    let err = commands::build_payload("b2b-saas", &b2b_files(dir.path()), &[bad]).unwrap_err();
    assert!(err.to_string().contains("Unknown field"));
}

#[test]
fn test_build_payload_rejects_dataset_outside_template() {
    let dir = tempfile::tempdir().unwrap();
    let result = commands::build_payload("b2c-product", &b2b_files(dir.path()), &[]);
    assert!(result.is_err());
}

#[test]
fn test_build_payload_unknown_template() {
    let result = commands::build_payload("marketplace", &[], &[]);
    assert!(result.is_err());
}

#[test]
fn test_build_payload_missing_file() {
    let files = vec![DatasetFile {
        kind: DatasetKind::Subscriptions,
        path: PathBuf::from("/nonexistent/subs.csv"),
    }];
    let err = commands::build_payload("b2b-saas", &files, &[]).unwrap_err();
    assert!(err.to_string().contains("Failed to open file"));
}

#[test]
fn test_cmd_import() {
    let db = setup_test_db();
    let dir = tempfile::tempdir().unwrap();

    commands::cmd_import(
        &db,
        &PipelineConfig::default(),
        "b2b-saas",
        &b2b_files(dir.path()),
        &[customer_override()],
    )
    .unwrap();

    let latest = latest_import(&db).unwrap().unwrap();
    let mrr = latest.calculation.metric("mrr").unwrap();
    assert_eq!(mrr.value, 1500.0);
    assert_eq!(mrr.change, 50.0);
}

#[test]
fn test_cmd_import_missing_required_dataset() {
    let db = setup_test_db();
    let dir = tempfile::tempdir().unwrap();
    let files = vec![DatasetFile {
        kind: DatasetKind::Subscriptions,
        path: write_csv(dir.path(), "subs.csv", SUBSCRIPTIONS_CSV),
    }];

    let result = commands::cmd_import(
        &db,
        &PipelineConfig::default(),
        "b2b-saas",
        &files,
        &[customer_override()],
    );
    assert!(result.is_err());
    assert_eq!(db.count_imports().unwrap(), 0);
}

#[test]
fn test_cmd_import_requires_datasets() {
    let db = setup_test_db();
    let result = commands::cmd_import(&db, &PipelineConfig::default(), "b2b-saas", &[], &[]);
    assert!(result.is_err());
}

#[test]
fn test_cmd_import_sample() {
    let db = setup_test_db();
    commands::cmd_import_sample(&db, &PipelineConfig::default(), "b2c-product").unwrap();

    let latest = latest_import(&db).unwrap().unwrap();
    assert_eq!(latest.template_id, "b2c-product");
}

// ========== Status Command Tests ==========

#[test]
fn test_cmd_latest_and_history() {
    let db = setup_test_db();

    // Empty store is not an error
    assert!(commands::cmd_latest(&db, false).is_ok());
    assert!(commands::cmd_history(&db, 20).is_ok());

    commands::cmd_import_sample(&db, &PipelineConfig::default(), "b2b-saas").unwrap();
    assert!(commands::cmd_latest(&db, false).is_ok());
    assert!(commands::cmd_latest(&db, true).is_ok());
    assert!(commands::cmd_history(&db, 0).is_ok());
}

#[test]
fn test_cmd_reset() {
    let db = setup_test_db();
    commands::cmd_import_sample(&db, &PipelineConfig::default(), "b2b-saas").unwrap();
    commands::cmd_import_sample(&db, &PipelineConfig::default(), "b2b-saas").unwrap();

    commands::cmd_reset(&db, true).unwrap();
    assert_eq!(db.count_imports().unwrap(), 0);
    assert!(latest_import(&db).unwrap().is_none());
}

#[test]
fn test_format_metric() {
    let mut metric = MetricValue {
        id: "mrr".into(),
        title: "Monthly Recurring Revenue".into(),
        subtitle: String::new(),
        description: String::new(),
        value: 328.0,
        change: 57.7,
        format: MetricFormat::Currency,
        currency: Some("EUR".into()),
    };
    assert_eq!(commands::format_metric(&metric), "328 EUR");

    metric.currency = None;
    assert_eq!(commands::format_metric(&metric), "328 USD");

    metric.format = MetricFormat::Percentage;
    metric.value = 1.66;
    assert_eq!(commands::format_metric(&metric), "1.66%");

    metric.format = MetricFormat::Number;
    metric.value = 4.0;
    assert_eq!(commands::format_metric(&metric), "4");
}

#[test]
fn test_format_change() {
    assert_eq!(commands::format_change(57.7), "+57.7%");
    assert_eq!(commands::format_change(-50.0), "-50%");
    assert_eq!(commands::format_change(0.0), "±0%");
}

// ========== Export Command Tests ==========

#[test]
fn test_cmd_export_csv() {
    let db = setup_test_db();
    let dir = tempfile::tempdir().unwrap();
    commands::cmd_import_sample(&db, &PipelineConfig::default(), "b2b-saas").unwrap();

    let output = dir.path().join("kpis.csv");
    let written = commands::cmd_export(&db, "csv", Some(&output)).unwrap();
    assert_eq!(written, output);

    let content = fs::read_to_string(&output).unwrap();
    assert!(content.starts_with("Section,Metric,Value,Change,Format"));
}

#[test]
fn test_cmd_export_excel() {
    let db = setup_test_db();
    let dir = tempfile::tempdir().unwrap();
    commands::cmd_import_sample(&db, &PipelineConfig::default(), "b2c-product").unwrap();

    let output = dir.path().join("kpis.xlsx");
    commands::cmd_export(&db, "excel", Some(&output)).unwrap();

    let bytes = fs::read(&output).unwrap();
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn test_cmd_export_errors() {
    let db = setup_test_db();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.csv");

    // Nothing imported yet
    assert!(commands::cmd_export(&db, "csv", Some(&output)).is_err());
    assert!(!output.exists());

    commands::cmd_import_sample(&db, &PipelineConfig::default(), "b2b-saas").unwrap();
    let err = commands::cmd_export(&db, "pdf", Some(&output)).unwrap_err();
    assert!(err.to_string().contains("Invalid format"));
}

// ========== Utility Tests ==========

#[test]
fn test_open_db_creates_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("northstar.db");

    let db = commands::open_db(&path).unwrap();
    assert_eq!(db.count_imports().unwrap(), 0);
    assert!(path.exists());
}

#[test]
fn test_load_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path(), "config.toml", "[import]\nmax_issues = 5\n");

    let config = commands::load_config(Some(&path)).unwrap();
    assert_eq!(config.max_issues, 5);

    assert!(commands::load_config(Some(&dir.path().join("missing.toml"))).is_err());
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a longer description", 10), "a longe...");
}
