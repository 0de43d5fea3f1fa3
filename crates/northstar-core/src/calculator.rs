//! KPI calculation
//!
//! Each template family has a [`KpiCalculator`] strategy. Strategies work on
//! [`BoundDatasets`], so they never see raw column names.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::debug;

use crate::error::Result;
use crate::mapping::BoundDatasets;
use crate::models::{
    CalculationResult, ChartConfig, ChartData, ChartSeries, DatasetKind, DatasetSummary,
    MetricValue, TemplateDatasets, TemplateMappings,
};
use crate::templates::{template_by_id, KpiTemplate, MetricDefinition};
use crate::values::{compute_change, finite_or_zero, round_to, MonthKey};

/// Per-month totals, iterated in chronological order with `Unknown` last
pub type MonthlyTotals = BTreeMap<MonthKey, f64>;

/// A calculation strategy for one template family
pub trait KpiCalculator: Sync {
    fn name(&self) -> &'static str;

    fn calculate(&self, template: &KpiTemplate, data: &BoundDatasets) -> CalculationResult;
}

/// Subscription businesses: MRR, ARR, churn and LTV
pub struct RecurringRevenueCalculator;

/// Consumer products: active customers, conversion, AOV and CAC
pub struct ConsumerGrowthCalculator;

static CALCULATORS: &[(&str, &dyn KpiCalculator)] = &[
    ("b2b-saas", &RecurringRevenueCalculator),
    ("b2c-product", &ConsumerGrowthCalculator),
];

/// Strategy for a template id
pub fn calculator_for(template_id: &str) -> &'static dyn KpiCalculator {
    CALCULATORS
        .iter()
        .find(|(id, _)| *id == template_id)
        .map(|(_, calculator)| *calculator)
        // Templates without a dedicated strategy are computed as recurring
        // revenue; template ids are checked against the registry first.
        .unwrap_or(&RecurringRevenueCalculator)
}

/// Compute metrics, charts and dataset summary for an import
pub fn calculate(
    template_id: &str,
    datasets: &TemplateDatasets,
    mappings: &TemplateMappings,
) -> Result<CalculationResult> {
    let template = template_by_id(template_id)?;
    let bound = BoundDatasets::bind(datasets, mappings);
    let calculator = calculator_for(template.id);

    debug!(
        template = template.id,
        strategy = calculator.name(),
        revenue_rows = bound.revenue.len(),
        churn_rows = bound.churn.len(),
        acquisition_rows = bound.acquisition.len(),
        "Calculating KPIs"
    );

    Ok(calculator.calculate(template, &bound))
}

impl KpiCalculator for RecurringRevenueCalculator {
    fn name(&self) -> &'static str {
        "recurring-revenue"
    }

    fn calculate(&self, template: &KpiTemplate, data: &BoundDatasets) -> CalculationResult {
        let revenue = sum_by_month(data.revenue.iter().map(|r| (r.month, r.amount)));
        let (latest_mrr, previous_mrr) = latest_two(&revenue);

        let churned = distinct(data.churn.iter().map(|r| r.customer_id.as_deref()));
        let customers = distinct(data.revenue.iter().map(|r| r.customer_id.as_deref())).max(1);
        let churn_rate = churned as f64 / customers as f64 * 100.0;

        let total_revenue: f64 = revenue.values().sum();
        let revenue_per_customer = total_revenue / customers as f64;
        let churn_fraction = churn_rate / 100.0;
        let ltv = if churn_fraction > 0.0 {
            revenue_per_customer / churn_fraction
        } else {
            revenue_per_customer
        };

        let metrics = template
            .metrics
            .iter()
            .map(|def| match def.id {
                "mrr" => metric(def, latest_mrr, compute_change(latest_mrr, previous_mrr)),
                "arr" => metric(
                    def,
                    latest_mrr * 12.0,
                    compute_change(latest_mrr * 12.0, previous_mrr * 12.0),
                ),
                "churnRate" => metric(def, round_to(churn_rate, 1), 0.0),
                "ltv" => metric(def, round_to(ltv, 0), 0.0),
                _ => metric(def, 0.0, 0.0),
            })
            .collect();

        let acquired = sum_by_month(data.acquisition.iter().map(|r| (r.month, r.customers)));
        let churn_counts = sum_by_month(data.churn.iter().map(|r| (r.month, 1.0)));
        let labels = month_labels(&[&revenue, &acquired, &churn_counts]);

        let charts = vec![
            chart(
                template,
                "revenueTrend",
                &labels,
                vec![series("MRR", &labels, &revenue)],
            ),
            chart(
                template,
                "acquisitionTrend",
                &labels,
                vec![
                    series("New Customers", &labels, &acquired),
                    series("Churned Customers", &labels, &churn_counts),
                ],
            ),
        ];

        CalculationResult {
            template_id: template.id.to_string(),
            metrics,
            charts,
            dataset_summary: dataset_summary(template, data, &revenue),
        }
    }
}

impl KpiCalculator for ConsumerGrowthCalculator {
    fn name(&self) -> &'static str {
        "consumer-growth"
    }

    fn calculate(&self, template: &KpiTemplate, data: &BoundDatasets) -> CalculationResult {
        let revenue = sum_by_month(data.revenue.iter().map(|r| (r.month, r.amount)));
        let (latest_revenue, previous_revenue) = latest_two(&revenue);

        let active_customers = distinct(data.revenue.iter().map(|r| r.customer_id.as_deref()));
        let total_revenue: f64 = revenue.values().sum();
        let order_count = data.revenue.len();
        let average_order_value = if order_count > 0 {
            total_revenue / order_count as f64
        } else {
            0.0
        };

        let spend: f64 = data.acquisition.iter().map(|r| r.cost).sum();
        let acquired: f64 = data.acquisition.iter().map(|r| r.customers).sum();
        let visitors: f64 = data.acquisition.iter().map(|r| r.visitors).sum();

        let conversion_rate = if visitors > 0.0 {
            acquired / visitors * 100.0
        } else {
            0.0
        };
        let cac = if acquired > 0.0 { spend / acquired } else { 0.0 };

        let metrics = template
            .metrics
            .iter()
            .map(|def| match def.id {
                "activeCustomers" => metric(def, active_customers as f64, 0.0),
                "conversionRate" => metric(def, round_to(conversion_rate, 2), 0.0),
                "averageOrderValue" => metric(
                    def,
                    round_to(average_order_value, 2),
                    compute_change(latest_revenue, previous_revenue),
                ),
                "cac" => metric(def, round_to(cac, 2), 0.0),
                _ => metric(def, 0.0, 0.0),
            })
            .collect();

        let acquired_by_month =
            sum_by_month(data.acquisition.iter().map(|r| (r.month, r.customers)));
        let spend_by_month = sum_by_month(data.acquisition.iter().map(|r| (r.month, r.cost)));
        let labels = month_labels(&[&revenue, &acquired_by_month, &spend_by_month]);

        let charts = vec![
            chart(
                template,
                "revenueByMonth",
                &labels,
                vec![series("Revenue", &labels, &revenue)],
            ),
            chart(
                template,
                "channelPerformance",
                &labels,
                vec![
                    series("New Customers", &labels, &acquired_by_month),
                    series("Channel Spend", &labels, &spend_by_month),
                ],
            ),
        ];

        CalculationResult {
            template_id: template.id.to_string(),
            metrics,
            charts,
            dataset_summary: dataset_summary(template, data, &revenue),
        }
    }
}

fn sum_by_month(rows: impl Iterator<Item = (MonthKey, f64)>) -> MonthlyTotals {
    let mut totals = MonthlyTotals::new();
    for (month, value) in rows {
        *totals.entry(month).or_insert(0.0) += value;
    }
    totals
}

/// Totals of the latest and previous calendar months (0 when absent)
fn latest_two(totals: &MonthlyTotals) -> (f64, f64) {
    let mut known = totals
        .iter()
        .rev()
        .filter(|(month, _)| month.is_known())
        .map(|(_, value)| *value);
    let latest = known.next().unwrap_or(0.0);
    let previous = known.next().unwrap_or(0.0);
    (latest, previous)
}

/// Count of distinct non-empty identifiers
fn distinct<'a>(ids: impl Iterator<Item = Option<&'a str>>) -> usize {
    ids.flatten().collect::<HashSet<_>>().len()
}

fn month_labels(totals: &[&MonthlyTotals]) -> Vec<MonthKey> {
    totals
        .iter()
        .flat_map(|t| t.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn series(label: &str, months: &[MonthKey], totals: &MonthlyTotals) -> ChartSeries {
    ChartSeries {
        label: label.to_string(),
        data: months
            .iter()
            .map(|m| finite_or_zero(totals.get(m).copied().unwrap_or(0.0)))
            .collect(),
    }
}

fn chart(
    template: &KpiTemplate,
    id: &str,
    months: &[MonthKey],
    datasets: Vec<ChartSeries>,
) -> ChartConfig {
    let title = template.chart(id).map(|c| c.title).unwrap_or(id);
    ChartConfig {
        id: id.to_string(),
        title: title.to_string(),
        data: ChartData {
            labels: months.iter().map(|m| m.to_string()).collect(),
            datasets,
        },
    }
}

fn metric(def: &MetricDefinition, value: f64, change: f64) -> MetricValue {
    MetricValue {
        id: def.id.to_string(),
        title: def.title.to_string(),
        subtitle: def.subtitle.to_string(),
        description: def.description.to_string(),
        value: finite_or_zero(value),
        change: finite_or_zero(change),
        format: def.format,
        currency: def.currency.map(str::to_string),
    }
}

fn dataset_summary(
    template: &KpiTemplate,
    data: &BoundDatasets,
    revenue: &MonthlyTotals,
) -> Vec<DatasetSummary> {
    let last_month = revenue
        .keys()
        .rev()
        .find(|m| m.is_known())
        .map(|m| m.to_string());

    template
        .datasets
        .iter()
        .map(|dataset| DatasetSummary {
            dataset: dataset.id,
            rows: data.row_count(dataset.id),
            last_date: match dataset.id {
                DatasetKind::Subscriptions => last_month.clone(),
                _ => None,
            },
        })
        .collect()
}
