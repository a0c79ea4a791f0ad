//! CSV import.

use std::path::Path;

use thermogrid_engine::{Dataset, Value};

use super::sheet::dataset_from_rows;
use crate::error::Result;

/// Import a CSV file. The first non-empty record is the header.
pub fn read_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(parse_csv_field).collect());
    }
    dataset_from_rows(rows)
}

/// Parse a CSV field into a cell value
/// - Empty string -> blank text
/// - Finite number -> Number (unless it has leading zeros like "007")
/// - Otherwise -> Text
///
/// CSV has no date cells, so `2024-02-03` stays text and its column is typed
/// by the numeric-prefix rule like any other.
pub(crate) fn parse_csv_field(field: &str) -> Value {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Value::empty();
    }

    // Keep explicit surrounding whitespace (typically from quoted CSV fields).
    if field != trimmed {
        return Value::text(field);
    }

    // Preserve strings that look like numbers but have leading zeros (e.g., "007", "00123")
    // unless they're just "0" or start with "0."
    if trimmed.starts_with('0')
        && trimmed.len() > 1
        && !trimmed.starts_with("0.")
        && trimmed.chars().nth(1).is_some_and(|c| c.is_ascii_digit())
    {
        return Value::text(trimmed);
    }

    if let Some(n) = trimmed.parse::<f64>().ok().filter(|n| n.is_finite()) {
        return Value::Number(n);
    }

    Value::text(trimmed)
}
