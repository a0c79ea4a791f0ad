//! Derivation of computed columns.
//!
//! Every function here is a pure transformation of an explicit
//! (schema, record) pair:
//!
//! - [`initialize_row`]: defaults for raw columns, then every computed column
//! - [`recompute_row`]: re-evaluate every computed column after an edit
//! - [`backfill_column`]: fill a newly added column across existing rows
//!
//! Computed columns are evaluated in schema order against the record being
//! built, so a column sees the fresh output of earlier computed columns and
//! the previous output of later ones. A failing rule never propagates: the
//! cell becomes `0`.

use std::sync::Arc;

use crate::rows::RowStore;
use crate::schema::{ColumnDefinition, Schema};
use crate::value::{Record, Value};

/// Evaluate a computed column against a record, absorbing failures as zero.
///
/// Raw columns have no rule and evaluate to their kind's default.
pub fn evaluate_column(column: &ColumnDefinition, record: &Record) -> Value {
    let Some(rule) = column.rule() else {
        return column.kind().default_value();
    };
    match rule.evaluate(record) {
        Ok(Value::Number(n)) if !n.is_finite() => {
            log::debug!("column '{}' produced a non-finite value, using 0", column.field());
            Value::Number(0.0)
        }
        Ok(value) => value,
        Err(err) => {
            log::debug!("column '{}' failed to derive ({}), using 0", column.field(), err);
            Value::Number(0.0)
        }
    }
}

/// Build a new row: raw columns keep supplied values or get their default,
/// then computed columns are derived in schema order.
pub fn initialize_row(schema: &Schema, initial: Record) -> Record {
    let mut record = initial;
    for column in schema.columns().iter().filter(|c| !c.is_computed()) {
        if !record.contains(column.field()) {
            record.insert(column.field(), column.kind().default_value());
        }
    }
    recompute_row(schema, record)
}

/// Re-derive every computed column of `record`, overwriting previous values.
/// Raw fields are left untouched.
pub fn recompute_row(schema: &Schema, record: Record) -> Record {
    let mut record = record;
    for column in schema.computed_columns() {
        let value = evaluate_column(column, &record);
        record.insert(column.field(), value);
    }
    record
}

/// Fill `column` across every existing row.
pub fn backfill_column(column: &ColumnDefinition, rows: &RowStore) -> RowStore {
    let records = rows
        .iter()
        .map(|row| {
            let mut updated = row.as_ref().clone();
            let value = evaluate_column(column, &updated);
            updated.insert(column.field(), value);
            Arc::new(updated)
        })
        .collect();
    RowStore::from_shared(records)
}

/// Bring every row in line with `schema`: missing raw fields get defaults and
/// all computed columns are re-derived. Used after import and verification.
pub fn derive_all(schema: &Schema, rows: &RowStore) -> RowStore {
    let records = rows
        .iter()
        .map(|row| Arc::new(initialize_row(schema, row.as_ref().clone())))
        .collect();
    RowStore::from_shared(records)
}
