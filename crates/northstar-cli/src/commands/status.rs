//! Status-related command implementations (latest, history, reset)

use std::io::{self, Write};

use anyhow::Result;
use chrono::Local;
use northstar_core::{latest_import, CalculationResult, Database, MetricFormat, MetricValue};
use northstar_server::MAX_PAGE_LIMIT;

/// Human-readable metric value
pub fn format_metric(metric: &MetricValue) -> String {
    match metric.format {
        MetricFormat::Currency => {
            format!("{} {}", metric.value, metric.currency.as_deref().unwrap_or("USD"))
        }
        MetricFormat::Percentage => format!("{}%", metric.value),
        MetricFormat::Number => metric.value.to_string(),
    }
}

/// Signed change vs the previous month
pub fn format_change(change: f64) -> String {
    if change == 0.0 {
        "±0%".to_string()
    } else {
        format!("{:+}%", change)
    }
}

pub fn print_metrics(calculation: &CalculationResult) {
    println!();
    println!("📊 KPIs ({})", calculation.template_id);
    println!("   ─────────────────────────────────────────────────────");
    for metric in &calculation.metrics {
        println!(
            "   {:<30} {:>14}  {}",
            metric.title,
            format_metric(metric),
            format_change(metric.change)
        );
    }

    println!();
    for summary in &calculation.dataset_summary {
        match &summary.last_date {
            Some(last) => println!(
                "   {}: {} rows (latest month {})",
                summary.dataset, summary.rows, last
            ),
            None => println!("   {}: {} rows", summary.dataset, summary.rows),
        }
    }
}

pub fn cmd_latest(db: &Database, json: bool) -> Result<()> {
    let Some(latest) = latest_import(db)? else {
        println!("No imports yet. Run 'northstar import' or 'northstar import --sample'.");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&latest)?);
        return Ok(());
    }

    println!(
        "🕒 Imported {}",
        latest
            .created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
    );
    print_metrics(&latest.calculation);
    Ok(())
}

pub fn cmd_history(db: &Database, limit: i64) -> Result<()> {
    let limit = limit.clamp(1, MAX_PAGE_LIMIT);
    let imports = db.list_imports(limit, 0)?;
    let total = db.count_imports()?;

    if imports.is_empty() {
        println!("No imports yet.");
        return Ok(());
    }

    println!();
    println!("📚 Import history ({} of {})", imports.len(), total);
    println!("   ─────────────────────────────────────────────────────");
    println!("   {:>5}  {:<14} {:<20} {}", "ID", "Template", "Imported", "Fingerprint");
    for import in &imports {
        let fingerprint = import.fingerprint.get(..12).unwrap_or(&import.fingerprint);
        println!(
            "   {:>5}  {:<14} {:<20} {}",
            import.id,
            import.template_id,
            import
                .created_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S"),
            fingerprint
        );
    }
    println!();

    Ok(())
}

pub fn cmd_reset(db: &Database, yes: bool) -> Result<()> {
    if !yes {
        print!("⚠️  This will delete every stored import and calculation.\n\n");
        print!("Are you sure? [y/N] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let deleted = db.reset_imports()?;
    println!("✅ Deleted {} import(s).", deleted);
    Ok(())
}
