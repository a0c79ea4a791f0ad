//! The schema and rows of one session, kept consistent under edits.

use crate::engine::{backfill_column, derive_all, initialize_row};
use crate::error::{EngineError, Result};
use crate::rows::RowStore;
use crate::schema::{ColumnDefinition, Schema};
use crate::value::{Record, Value};

/// A schema together with its rows.
///
/// Every operation returns a new dataset; on error the receiver is the
/// unchanged state. After any successful operation every row holds a value
/// for every column and every computed cell reflects its rule.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    schema: Schema,
    rows: RowStore,
}

impl Dataset {
    pub fn new(schema: Schema) -> Self {
        Dataset {
            schema,
            rows: RowStore::new(),
        }
    }

    /// Replace schema and rows wholesale, deriving every computed column.
    pub fn replace_all(schema: Schema, records: Vec<Record>) -> Self {
        let rows = derive_all(&schema, &RowStore::replace_all(records));
        Dataset { schema, rows }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &RowStore {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.schema.len()
    }

    pub fn row(&self, index: usize) -> Option<&Record> {
        self.rows.get(index)
    }

    pub fn cell(&self, index: usize, field: &str) -> Option<&Value> {
        self.rows.get(index).and_then(|r| r.get(field))
    }

    /// Append a row initialized from `initial`.
    pub fn append_row(&self, initial: Record) -> Dataset {
        let record = initialize_row(&self.schema, initial);
        Dataset {
            schema: self.schema.clone(),
            rows: self.rows.append_row(record),
        }
    }

    /// Register a column and fill it across the existing rows.
    pub fn add_column(&self, column: ColumnDefinition) -> Result<Dataset> {
        let schema = self.schema.add_column(column.clone())?;
        log::debug!("added column '{}' across {} rows", column.field(), self.rows.len());
        Ok(Dataset {
            rows: backfill_column(&column, &self.rows),
            schema,
        })
    }

    /// Replace row `index` with an edited record and re-derive it. Raw fields
    /// missing from `record` get their kind's default.
    pub fn update_row(&self, index: usize, record: Record) -> Result<Dataset> {
        let record = initialize_row(&self.schema, record);
        Ok(Dataset {
            schema: self.schema.clone(),
            rows: self.rows.update_row(index, record)?,
        })
    }

    /// Edit one raw cell. Computed and unknown columns are rejected.
    pub fn set_cell(&self, index: usize, field: &str, value: Value) -> Result<Dataset> {
        let column = self
            .schema
            .get(field)
            .ok_or_else(|| EngineError::UnknownField(field.to_string()))?;
        if !column.editable() {
            return Err(EngineError::NotEditable(field.to_string()));
        }
        let mut record = self
            .rows
            .get(index)
            .cloned()
            .ok_or(EngineError::IndexOutOfRange {
                index,
                len: self.rows.len(),
            })?;
        record.insert(field, value);
        self.update_row(index, record)
    }

    /// Replace the column list (after reorder or edit). Rows keep their
    /// values; computed cells are re-derived under the new order.
    pub fn update_columns(&self, columns: Vec<ColumnDefinition>) -> Result<Dataset> {
        let schema = self.schema.update_all(columns)?;
        Ok(Dataset {
            rows: derive_all(&schema, &self.rows),
            schema,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Formula, NativeRule};
    use crate::error::DerivationError;
    use crate::presets::temperature_monitoring;

    fn qty_price() -> Dataset {
        let schema = Schema::replace_all(vec![
            ColumnDefinition::numeric("qty", "Qty"),
            ColumnDefinition::numeric("price", "Price"),
        ])
        .unwrap();
        Dataset::replace_all(
            schema,
            vec![
                Record::new().with("qty", 2.0).with("price", 3.0),
                Record::new().with("qty", 4.0).with("price", 0.5),
            ],
        )
    }

    fn product() -> ColumnDefinition {
        ColumnDefinition::formula("total", "Total", Formula::compile("{qty} * {price}").unwrap())
    }

    #[test]
    fn test_append_row_defaults() {
        let ds = Dataset::new(temperature_monitoring().unwrap()).append_row(Record::new());
        let row = ds.row(0).unwrap();
        for column in ds.schema().columns() {
            assert!(row.contains(column.field()), "missing {}", column.field());
        }
        assert_eq!(row.get("temperature_differential"), Some(&Value::Number(0.0)));
    }

    #[test]
    fn test_computed_column_backfilled() {
        let ds = qty_price().add_column(product()).unwrap();
        let totals: Vec<_> = ds.rows().iter().map(|r| r.number("total")).collect();
        assert_eq!(totals, vec![6.0, 2.0]);
    }

    #[test]
    fn test_raw_column_backfilled_with_default() {
        let ds = qty_price()
            .add_column(ColumnDefinition::numeric("extra", "Extra"))
            .unwrap();
        assert!(ds.rows().iter().all(|r| r.get("extra") == Some(&Value::Number(0.0))));
    }

    #[test]
    fn test_edit_propagates() {
        let ds = qty_price().add_column(product()).unwrap();
        let ds = ds.set_cell(0, "qty", Value::Number(10.0)).unwrap();
        assert_eq!(ds.cell(0, "total"), Some(&Value::Number(30.0)));
        assert_eq!(ds.cell(1, "total"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn test_edit_of_computed_rejected() {
        let ds = qty_price().add_column(product()).unwrap();
        assert_eq!(
            ds.set_cell(0, "total", Value::Number(1.0)).unwrap_err(),
            EngineError::NotEditable("total".into())
        );
        assert_eq!(
            ds.set_cell(0, "nope", Value::Number(1.0)).unwrap_err(),
            EngineError::UnknownField("nope".into())
        );
        assert!(matches!(
            ds.set_cell(9, "qty", Value::Number(1.0)),
            Err(EngineError::IndexOutOfRange { index: 9, len: 2 })
        ));
    }

    #[test]
    fn test_failing_rule_yields_zero() {
        let failing = ColumnDefinition::native(
            "broken",
            "Broken",
            NativeRule::new("fails", |_| Err(DerivationError::Failed("bad input".into()))),
        );
        let ds = qty_price().add_column(failing).unwrap();
        assert!(ds.rows().iter().all(|r| r.get("broken") == Some(&Value::Number(0.0))));
        let ds = ds.append_row(Record::new());
        assert_eq!(ds.cell(2, "broken"), Some(&Value::Number(0.0)));
    }

    #[test]
    fn test_duplicate_add_leaves_dataset_unchanged() {
        let ds = qty_price();
        assert!(ds.add_column(ColumnDefinition::text("qty", "Dup")).is_err());
        assert_eq!(ds.column_count(), 2);
    }

    #[test]
    fn test_update_row_fills_missing_raw_fields() {
        let schema = Schema::replace_all(vec![
            ColumnDefinition::numeric("qty", "Qty"),
            ColumnDefinition::text("note", "Note"),
        ])
        .unwrap();
        let ds = Dataset::new(schema).append_row(Record::new());
        let ds = ds.update_row(0, Record::new().with("qty", 1.0)).unwrap();
        assert_eq!(ds.cell(0, "qty"), Some(&Value::Number(1.0)));
        assert_eq!(ds.cell(0, "note"), Some(&Value::empty()));
        assert!(ds.update_row(5, Record::new()).is_err());
    }

    #[test]
    fn test_update_columns_reorders() {
        let ds = qty_price().add_column(product()).unwrap();
        let mut columns = ds.schema().columns().to_vec();
        columns.reverse();
        let reordered = ds.update_columns(columns).unwrap();
        assert_eq!(reordered.schema().columns()[0].field(), "total");
        assert_eq!(reordered.cell(0, "total"), Some(&Value::Number(6.0)));
    }
}
