//! KPI template registry
//!
//! Templates are hand-authored schema definitions compiled into the binary:
//! which datasets a business model needs, the fields of each dataset, and the
//! metrics and charts a calculation produces.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{
    DatasetKind, FieldId, MetricFormat, RawRecord, TemplateDatasets, TemplateMappings,
};

/// Template used when the caller does not pick one
pub const DEFAULT_TEMPLATE_ID: &str = "b2b-saas";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateField {
    pub id: FieldId,
    pub label: &'static str,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<&'static str>,
    pub required: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetTemplate {
    pub id: DatasetKind,
    pub label: &'static str,
    pub description: &'static str,
    pub optional: bool,
    pub fields: &'static [TemplateField],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample: Option<&'static str>,
}

impl DatasetTemplate {
    pub fn field(&self, id: FieldId) -> Option<&TemplateField> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &TemplateField> {
        self.fields.iter().filter(|f| f.required)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDefinition {
    pub id: &'static str,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub description: &'static str,
    pub format: MetricFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct ChartDefinition {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub recommended_for: &'static str,
    pub datasets: &'static [DatasetTemplate],
    pub metrics: &'static [MetricDefinition],
    pub charts: &'static [ChartDefinition],
}

impl KpiTemplate {
    pub fn dataset(&self, kind: DatasetKind) -> Option<&DatasetTemplate> {
        self.datasets.iter().find(|d| d.id == kind)
    }

    pub fn chart(&self, id: &str) -> Option<&ChartDefinition> {
        self.charts.iter().find(|c| c.id == id)
    }
}

/// Demo rows for one dataset as (column, value) pairs
pub struct SampleDataset {
    pub dataset: DatasetKind,
    pub rows: &'static [&'static [(&'static str, &'static str)]],
}

const fn field(
    id: FieldId,
    label: &'static str,
    description: &'static str,
    example: Option<&'static str>,
    required: bool,
) -> TemplateField {
    TemplateField {
        id,
        label,
        description,
        example,
        required,
    }
}

pub static KPI_TEMPLATES: &[KpiTemplate] = &[
    KpiTemplate {
        id: "b2b-saas",
        name: "B2B SaaS Northstar",
        category: "B2B / Enterprise",
        description: "Tracks recurring revenue, churn and lifetime value for subscription B2B SaaS \
                      teams, covering MRR, ARR, churn rate and LTV.",
        recommended_for: "Subscription products sold to businesses that need monthly and yearly \
                          revenue and churn insight.",
        datasets: &[
            DatasetTemplate {
                id: DatasetKind::Subscriptions,
                label: "Subscription Revenue",
                description: "Each row is one subscription charge or renewal.",
                optional: false,
                fields: &[
                    field(FieldId::Date, "Date", "Transaction date (YYYY-MM-DD)", Some("2024-02-01"), true),
                    field(FieldId::CustomerId, "Customer ID", "Unique customer identifier", Some("C0001"), true),
                    field(FieldId::Plan, "Plan", "Subscription plan name", Some("Pro Plan"), false),
                    field(FieldId::Amount, "Amount", "Revenue amount (numeric)", Some("129"), true),
                    field(FieldId::Currency, "Currency", "Currency symbol or code", Some("USD"), false),
                ],
                sample: Some(
                    "date,customerId,plan,amount,currency\n\
                     2024-01-01,C0001,Pro,129,USD\n\
                     2024-01-01,C0002,Basic,49,USD",
                ),
            },
            DatasetTemplate {
                id: DatasetKind::Churn,
                label: "Churned Customers",
                description: "Customer churn events, used for churn rate and LTV.",
                optional: false,
                fields: &[
                    field(FieldId::Date, "Date", "Churn date", Some("2024-01-20"), true),
                    field(FieldId::CustomerId, "Customer ID", "Churned customer ID", Some("C0009"), true),
                    field(FieldId::Reason, "Reason", "Churn reason", Some("price"), false),
                ],
                sample: Some(
                    "date,customerId,reason\n\
                     2024-01-15,C0007,price\n\
                     2024-01-28,C0008,missing feature",
                ),
            },
            DatasetTemplate {
                id: DatasetKind::Acquisition,
                label: "Acquisition Spend",
                description: "Channel spend and new customers, used for CAC and conversion.",
                optional: true,
                fields: &[
                    field(FieldId::Date, "Date", "Acquisition date", Some("2024-01-10"), true),
                    field(FieldId::Channel, "Channel", "Channel name", Some("Paid Ads"), true),
                    field(FieldId::Cost, "Cost", "Channel spend", Some("1200"), true),
                    field(FieldId::Customers, "Customers", "New customers from this channel", Some("15"), true),
                ],
                sample: Some(
                    "date,channel,cost,customers\n\
                     2024-01-01,Paid Ads,1200,12\n\
                     2024-01-05,Webinar,400,8",
                ),
            },
        ],
        metrics: &[
            MetricDefinition {
                id: "mrr",
                title: "Monthly Recurring Revenue",
                subtitle: "MRR",
                description: "Subscription revenue of the latest month.",
                format: MetricFormat::Currency,
                currency: Some("USD"),
            },
            MetricDefinition {
                id: "arr",
                title: "Annual Recurring Revenue",
                subtitle: "ARR",
                description: "MRR x 12, an estimate of yearly revenue.",
                format: MetricFormat::Currency,
                currency: Some("USD"),
            },
            MetricDefinition {
                id: "churnRate",
                title: "Customer Churn Rate",
                subtitle: "Churn Rate",
                description: "Churned customers as a share of all customers.",
                format: MetricFormat::Percentage,
                currency: None,
            },
            MetricDefinition {
                id: "ltv",
                title: "Customer Lifetime Value",
                subtitle: "LTV",
                description: "Lifetime revenue per customer estimated from ARPU and churn.",
                format: MetricFormat::Currency,
                currency: Some("USD"),
            },
        ],
        charts: &[
            ChartDefinition {
                id: "revenueTrend",
                title: "MRR Trend",
                description: "Subscription revenue by month.",
            },
            ChartDefinition {
                id: "acquisitionTrend",
                title: "Acquisition vs Churn",
                description: "New customers against churned customers each month.",
            },
        ],
    },
    KpiTemplate {
        id: "b2c-product",
        name: "B2C Growth Dashboard",
        category: "B2C / Product-led",
        description: "Focuses on user scale, conversion and acquisition cost for consumer \
                      subscription or one-off purchase products.",
        recommended_for: "Consumer products, in-app subscriptions and growth teams that need a \
                          single view of the funnel.",
        datasets: &[
            DatasetTemplate {
                id: DatasetKind::Subscriptions,
                label: "Revenue / Orders",
                description: "Each row is one order or subscription.",
                optional: false,
                fields: &[
                    field(FieldId::Date, "Date", "Order date", Some("2024-01-03"), true),
                    field(FieldId::CustomerId, "User ID", "User ID", Some("U1023"), true),
                    field(FieldId::Amount, "Order Amount", "Order amount", Some("59"), true),
                    field(FieldId::Currency, "Currency", "Currency symbol or code", Some("USD"), false),
                ],
                sample: Some(
                    "date,customerId,amount,currency\n\
                     2024-01-03,U1023,59,USD\n\
                     2024-01-04,U1024,39,USD",
                ),
            },
            DatasetTemplate {
                id: DatasetKind::Acquisition,
                label: "Acquisition Channels",
                description: "Spend and acquired users per channel.",
                optional: false,
                fields: &[
                    field(FieldId::Date, "Date", "Date", None, true),
                    field(FieldId::Channel, "Channel", "Channel name", None, true),
                    field(FieldId::Cost, "Spend", "Channel spend", None, true),
                    field(FieldId::Visitors, "Visitors", "Visits", Some("1200"), false),
                    field(FieldId::Customers, "Conversions", "Converted or purchasing users", None, true),
                ],
                sample: Some(
                    "date,channel,cost,visitors,customers\n\
                     2024-01-01,Paid Ads,800,1200,20\n\
                     2024-01-12,Influencer,300,500,11",
                ),
            },
        ],
        metrics: &[
            MetricDefinition {
                id: "activeCustomers",
                title: "Active Customers",
                subtitle: "Active Customers",
                description: "Distinct users with orders in the period.",
                format: MetricFormat::Number,
                currency: None,
            },
            MetricDefinition {
                id: "conversionRate",
                title: "Conversion Rate",
                subtitle: "Conversion",
                description: "Share of channel visitors that converted.",
                format: MetricFormat::Percentage,
                currency: None,
            },
            MetricDefinition {
                id: "averageOrderValue",
                title: "Average Order Value",
                subtitle: "AOV",
                description: "Total revenue / number of orders.",
                format: MetricFormat::Currency,
                currency: Some("USD"),
            },
            MetricDefinition {
                id: "cac",
                title: "Customer Acquisition Cost",
                subtitle: "CAC",
                description: "Total channel spend / new customers.",
                format: MetricFormat::Currency,
                currency: Some("USD"),
            },
        ],
        charts: &[
            ChartDefinition {
                id: "revenueByMonth",
                title: "Monthly Revenue",
                description: "Consumer revenue by month.",
            },
            ChartDefinition {
                id: "channelPerformance",
                title: "Channel Performance",
                description: "Conversions against spend per month.",
            },
        ],
    },
];

static B2B_SAMPLES: &[SampleDataset] = &[
    SampleDataset {
        dataset: DatasetKind::Subscriptions,
        rows: &[
            &[("date", "2024-01-01"), ("customerId", "C0001"), ("plan", "Pro"), ("amount", "129"), ("currency", "USD")],
            &[("date", "2024-01-10"), ("customerId", "C0002"), ("plan", "Growth"), ("amount", "249"), ("currency", "USD")],
            &[("date", "2024-02-02"), ("customerId", "C0001"), ("plan", "Pro"), ("amount", "129"), ("currency", "USD")],
            &[("date", "2024-02-15"), ("customerId", "C0003"), ("plan", "Starter"), ("amount", "79"), ("currency", "USD")],
            &[("date", "2024-03-05"), ("customerId", "C0002"), ("plan", "Growth"), ("amount", "249"), ("currency", "USD")],
            &[("date", "2024-03-16"), ("customerId", "C0004"), ("plan", "Starter"), ("amount", "79"), ("currency", "USD")],
        ],
    },
    SampleDataset {
        dataset: DatasetKind::Churn,
        rows: &[
            &[("date", "2024-02-20"), ("customerId", "C0005"), ("reason", "budget")],
            &[("date", "2024-03-12"), ("customerId", "C0003"), ("reason", "missing feature")],
        ],
    },
    SampleDataset {
        dataset: DatasetKind::Acquisition,
        rows: &[
            &[("date", "2024-01-01"), ("channel", "Paid Ads"), ("cost", "1200"), ("customers", "12")],
            &[("date", "2024-01-15"), ("channel", "Webinar"), ("cost", "450"), ("customers", "8")],
            &[("date", "2024-02-03"), ("channel", "Partner"), ("cost", "600"), ("customers", "10")],
            &[("date", "2024-03-01"), ("channel", "Paid Ads"), ("cost", "1500"), ("customers", "14")],
        ],
    },
];

static B2C_SAMPLES: &[SampleDataset] = &[
    SampleDataset {
        dataset: DatasetKind::Subscriptions,
        rows: &[
            &[("date", "2024-01-04"), ("customerId", "U1001"), ("amount", "59"), ("currency", "USD")],
            &[("date", "2024-01-06"), ("customerId", "U1002"), ("amount", "39"), ("currency", "USD")],
            &[("date", "2024-02-11"), ("customerId", "U1010"), ("amount", "69"), ("currency", "USD")],
            &[("date", "2024-02-21"), ("customerId", "U1022"), ("amount", "49"), ("currency", "USD")],
            &[("date", "2024-03-08"), ("customerId", "U1001"), ("amount", "59"), ("currency", "USD")],
        ],
    },
    SampleDataset {
        dataset: DatasetKind::Acquisition,
        rows: &[
            &[("date", "2024-01-01"), ("channel", "Paid Ads"), ("cost", "800"), ("customers", "20"), ("visitors", "1200")],
            &[("date", "2024-01-12"), ("channel", "Influencer"), ("cost", "300"), ("customers", "11"), ("visitors", "500")],
            &[("date", "2024-02-03"), ("channel", "Organic"), ("cost", "0"), ("customers", "18"), ("visitors", "1400")],
            &[("date", "2024-03-09"), ("channel", "Referral"), ("cost", "150"), ("customers", "9"), ("visitors", "400")],
        ],
    },
];

/// All templates in catalog order
pub fn list_templates() -> &'static [KpiTemplate] {
    KPI_TEMPLATES
}

/// Look up a template by id
pub fn template_by_id(id: &str) -> Result<&'static KpiTemplate> {
    KPI_TEMPLATES
        .iter()
        .find(|t| t.id == id)
        .ok_or_else(|| Error::UnknownTemplate(id.to_string()))
}

/// Demo rows for a template, keyed by field id
pub fn sample_datasets(template_id: &str) -> Result<TemplateDatasets> {
    let template = template_by_id(template_id)?;
    let samples = match template.id {
        "b2c-product" => B2C_SAMPLES,
        _ => B2B_SAMPLES,
    };

    Ok(samples
        .iter()
        .map(|sample| {
            let rows = sample
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect::<RawRecord>()
                })
                .collect();
            (sample.dataset, rows)
        })
        .collect())
}

/// Map every template field to a column of the same name
///
/// Matches the shape of [`sample_datasets`], whose columns are the field ids.
pub fn identity_mappings(template: &KpiTemplate) -> TemplateMappings {
    template
        .datasets
        .iter()
        .map(|dataset| {
            let mapping = dataset
                .fields
                .iter()
                .map(|f| (f.id.as_str().to_string(), f.id.as_str().to_string()))
                .collect();
            (dataset.id, mapping)
        })
        .collect()
}

/// Public listing shape served to clients
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateListing {
    pub id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub recommended_for: &'static str,
    pub datasets: Vec<DatasetListing>,
    pub metrics: Vec<MetricListing>,
}

#[derive(Debug, Serialize)]
pub struct DatasetListing {
    pub id: DatasetKind,
    pub label: &'static str,
    pub description: &'static str,
    pub optional: bool,
    pub fields: Vec<FieldListing>,
    /// Example CSV whose headers auto-map onto the field ids
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct FieldListing {
    pub id: FieldId,
    pub label: &'static str,
    pub description: &'static str,
    pub required: bool,
}

#[derive(Debug, Serialize)]
pub struct MetricListing {
    pub id: &'static str,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub format: MetricFormat,
}

impl From<&'static KpiTemplate> for TemplateListing {
    fn from(template: &'static KpiTemplate) -> Self {
        Self {
            id: template.id,
            name: template.name,
            category: template.category,
            description: template.description,
            recommended_for: template.recommended_for,
            datasets: template
                .datasets
                .iter()
                .map(|d| DatasetListing {
                    id: d.id,
                    label: d.label,
                    description: d.description,
                    optional: d.optional,
                    fields: d
                        .fields
                        .iter()
                        .map(|f| FieldListing {
                            id: f.id,
                            label: f.label,
                            description: f.description,
                            required: f.required,
                        })
                        .collect(),
                    sample: d.sample,
                })
                .collect(),
            metrics: template
                .metrics
                .iter()
                .map(|m| MetricListing {
                    id: m.id,
                    title: m.title,
                    subtitle: m.subtitle,
                    format: m.format,
                })
                .collect(),
        }
    }
}

/// Listing for every template in the catalog
pub fn template_listings() -> Vec<TemplateListing> {
    KPI_TEMPLATES.iter().map(TemplateListing::from).collect()
}
