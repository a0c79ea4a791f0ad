//! Spreadsheet import (`.xlsx`, `.xls`, `.xlsm`, `.ods`).

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use chrono::{Duration, NaiveDate};
use thermogrid_engine::{Dataset, Value};

use super::sheet::dataset_from_rows;
use crate::error::{Result, ThermogridError};

/// Import the first sheet of a workbook.
pub fn read_workbook(path: &Path) -> Result<Dataset> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ThermogridError::ImportParse("workbook has no sheets".to_string()))?;
    let range = workbook.worksheet_range(&sheet)?;
    log::debug!("reading sheet '{}' ({:?})", sheet, range.get_size());

    let rows = range
        .rows()
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();
    dataset_from_rows(rows)
}

fn convert_cell(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::empty(),
        Data::String(s) => Value::Text(s.clone()),
        Data::Float(f) => Value::Number(*f),
        Data::Int(i) => Value::Number(*i as f64),
        Data::Bool(b) => Value::Text(b.to_string()),
        Data::DateTime(dt) if dt.is_datetime() => excel_serial_to_date(dt.as_f64())
            .map(Value::Date)
            .unwrap_or_else(|| Value::Text(dt.to_string())),
        Data::DateTime(dt) => Value::Text(dt.to_string()),
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(Value::Date)
            .unwrap_or_else(|| Value::Text(s.clone())),
        Data::DurationIso(s) => Value::Text(s.clone()),
        Data::Error(e) => {
            log::debug!("cell error {:?} imported as blank", e);
            Value::empty()
        }
    }
}

/// Convert a 1900-system serial day number to a date.
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    // Serial 60 is the non-existent 1900-02-29; earlier serials are offset by one.
    let epoch = if serial < 60.0 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    let days = if serial < 60.0 { serial.floor() - 1.0 } else { serial.floor() };
    epoch.checked_add_signed(Duration::days(days as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    #[test]
    fn test_excel_serial_to_date() {
        assert_eq!(excel_serial_to_date(45292.0), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(excel_serial_to_date(45292.75), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(excel_serial_to_date(1.0), NaiveDate::from_ymd_opt(1900, 1, 1));
        assert_eq!(excel_serial_to_date(0.0), None);
    }

    #[test]
    fn test_read_workbook_quantity_price() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "item").unwrap();
        sheet.write_string(0, 1, "quantity").unwrap();
        sheet.write_string(0, 2, "price").unwrap();
        sheet.write_string(1, 0, "bolt").unwrap();
        sheet.write_number(1, 1, 3.0).unwrap();
        sheet.write_number(1, 2, 2.5).unwrap();
        sheet.write_number(2, 1, 4.0).unwrap();
        sheet.write_number(2, 2, 1.0).unwrap();
        workbook.save(&path).unwrap();

        let ds = read_workbook(&path).unwrap();
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.cell(0, "total"), Some(&Value::Number(7.5)));
        assert_eq!(ds.cell(1, "total"), Some(&Value::Number(4.0)));
        assert_eq!(ds.cell(1, "item"), Some(&Value::text("bolt")));
    }

    #[test]
    fn test_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_workbook(&dir.path().join("absent.xlsx")).is_err());
    }
}
