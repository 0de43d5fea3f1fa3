//! CSV text to header-keyed records

use std::io::Read;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::RawRecord;

/// A parsed CSV table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTable {
    /// Header row in file order
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
}

/// Pair one CSV row with the headers; short rows simply omit trailing columns
fn record_to_map(headers: &StringRecord, record: &StringRecord) -> RawRecord {
    headers
        .iter()
        .zip(record.iter())
        .map(|(header, value)| (header.to_string(), value.to_string()))
        .collect()
}

/// Parse CSV with a header row into records keyed by header
///
/// Blank lines are skipped. A file without a header row is invalid.
pub fn parse_csv_records<R: Read>(reader: R) -> Result<ParsedTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.iter().all(str::is_empty) {
        return Err(Error::InvalidData("CSV file has no header row".into()));
    }

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        records.push(record_to_map(&headers, &record));
    }

    debug!(
        columns = headers.len(),
        rows = records.len(),
        "Parsed CSV records"
    );

    Ok(ParsedTable {
        headers: headers.iter().map(str::to_string).collect(),
        records,
    })
}
