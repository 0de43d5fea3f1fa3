//! Value coercion shared by validation and calculation
//!
//! Cell values arrive as free-form strings. Validation reports values these
//! helpers cannot make sense of; calculation then uses the forgiving variants,
//! so a bad cell contributes zero instead of aborting.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// Label of the bucket holding rows whose date could not be parsed
pub const UNKNOWN_MONTH: &str = "Unknown";

/// Keep only digits, `.` and `-` (drops currency symbols and separators)
fn strip_numeric(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect()
}

/// Parse a cell as a number, `None` if nothing finite remains after stripping
pub fn parse_number(raw: &str) -> Option<f64> {
    strip_numeric(raw)
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Forgiving numeric coercion: missing, empty or garbled values are 0
pub fn to_number(raw: Option<&str>) -> f64 {
    raw.and_then(parse_number).unwrap_or(0.0)
}

/// Parse an ISO-8601 date or date-time, keeping only the calendar date
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM`, `YYYY-MM-DDTHH:MM:SS[.f]` with or without
/// an offset, and the space-separated date-time form.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }

    // Month precision: treat as the first of the month
    if value.len() == 7 {
        return NaiveDate::parse_from_str(&format!("{}-01", value), "%Y-%m-%d").ok();
    }

    None
}

/// Monthly aggregation bucket
///
/// Orders chronologically, with [`MonthKey::Unknown`] after every calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MonthKey {
    Month { year: i32, month: u32 },
    Unknown,
}

impl MonthKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self::Month {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Bucket for a raw date cell; unparseable or missing dates go to `Unknown`
    pub fn from_date_str(raw: Option<&str>) -> Self {
        raw.and_then(parse_iso_date)
            .map(Self::from_date)
            .unwrap_or(Self::Unknown)
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Month { .. })
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
            Self::Unknown => write!(f, "{}", UNKNOWN_MONTH),
        }
    }
}

/// Percent change from `previous` to `latest`, rounded to one decimal
///
/// Returns 0 when `previous` is 0 or either input is not finite.
pub fn compute_change(latest: f64, previous: f64) -> f64 {
    if !latest.is_finite() || !previous.is_finite() || previous == 0.0 {
        return 0.0;
    }
    finite_or_zero(round_to((latest - previous) / previous.abs() * 100.0, 1))
}

/// Replace an overflowed or undefined result with 0
///
/// Sums of individually valid cells can still overflow, and JSON has no
/// representation for infinity or NaN.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
