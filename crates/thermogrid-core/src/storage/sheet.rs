//! Sheet rows to dataset.
//!
//! Shared by every import format: readers produce a rectangular-ish grid of
//! [`Value`]s and this module turns it into a schema plus rows.

use std::collections::HashSet;

use thermogrid_engine::presets::total_column;
use thermogrid_engine::{ColumnDefinition, ColumnFormat, Dataset, Record, Schema, Value};

use crate::error::{Result, ThermogridError};

/// Build a dataset from raw sheet rows.
///
/// - The first row with any non-blank cell is the header. Blank header cells
///   become `column_<n>` (1-based); duplicate headers abort the import.
/// - Column kinds are inferred from the first data row: a date cell gives a
///   date column, a value with a leading number a numeric column, anything
///   else text.
/// - Blank cells in the first column repeat the value above them.
/// - Sheets carrying both `quantity` and `price` gain a computed `total`.
pub fn dataset_from_rows(rows: Vec<Vec<Value>>) -> Result<Dataset> {
    let mut rows = rows
        .into_iter()
        .skip_while(|row| row.iter().all(Value::is_blank));
    let header_row = rows
        .next()
        .ok_or_else(|| ThermogridError::ImportParse("sheet has no header row".to_string()))?;
    let headers = header_names(&header_row)?;

    let data: Vec<Vec<Value>> = rows
        .filter(|row| !row.iter().all(Value::is_blank))
        .collect();

    let columns = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let sample = data.first().and_then(|row| row.get(i));
            infer_column(header, sample)
        })
        .collect::<Vec<_>>();
    let schema = Schema::replace_all(columns)?;

    let mut records = Vec::with_capacity(data.len());
    let mut carried: Option<Value> = None;
    for row in data {
        let mut record = Record::new();
        for (i, header) in headers.iter().enumerate() {
            let mut value = row.get(i).cloned().unwrap_or_else(Value::empty);
            if i == 0 {
                if value.is_blank() {
                    if let Some(previous) = &carried {
                        value = previous.clone();
                    }
                } else {
                    carried = Some(value.clone());
                }
            }
            record.insert(header.as_str(), value);
        }
        records.push(record);
    }

    log::info!(
        "imported {} rows, {} columns",
        records.len(),
        schema.len()
    );
    let dataset = Dataset::replace_all(schema, records);

    if dataset.schema().contains("quantity")
        && dataset.schema().contains("price")
        && !dataset.schema().contains("total")
    {
        return Ok(dataset.add_column(total_column()?)?);
    }
    Ok(dataset)
}

fn header_names(row: &[Value]) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(row.len());
    for (i, cell) in row.iter().enumerate() {
        let name = match cell.to_string().trim() {
            "" => format!("column_{}", i + 1),
            text => text.to_string(),
        };
        if !seen.insert(name.clone()) {
            return Err(ThermogridError::ImportParse(format!(
                "duplicate header '{}'",
                name
            )));
        }
        names.push(name);
    }
    Ok(names)
}

fn infer_column(header: &str, sample: Option<&Value>) -> ColumnDefinition {
    let column = match sample {
        Some(Value::Date(_)) => ColumnDefinition::date(header, header),
        Some(value) if value.as_number().is_some() => ColumnDefinition::numeric(header, header),
        _ => ColumnDefinition::text(header, header),
    };
    column.with_format(ColumnFormat::for_field(header))
}
