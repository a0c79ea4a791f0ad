use chrono::NaiveDate;
use thermogrid_engine::engine::Formula;
use thermogrid_engine::plot::Selection;
use thermogrid_engine::{ColumnDefinition, ColumnKind, Dataset, EngineError, Record, Value};

use super::state::MAX_UNDO_STACK;
use super::{ChartSlot, Document};
use crate::error::{Result, ThermogridError};

impl Document {
    /// Install `next` as the current dataset, recording the previous one.
    fn commit(&mut self, next: Dataset) {
        let previous = std::mem::replace(&mut self.dataset, next);
        self.undo_stack.push(previous);
        self.redo_stack.clear();
        if self.undo_stack.len() > MAX_UNDO_STACK {
            self.undo_stack.remove(0);
        }
        self.modified = true;
    }

    /// Append a row with default raw values and derived computed cells.
    /// Returns the new row's index.
    pub fn append_row(&mut self) -> usize {
        let next = self.dataset.append_row(Record::new());
        self.commit(next);
        self.dataset.row_count() - 1
    }

    pub fn add_column(&mut self, column: ColumnDefinition) -> Result<()> {
        let next = self.dataset.add_column(column)?;
        self.commit(next);
        Ok(())
    }

    /// Set a raw cell from user input, parsed according to the column kind.
    pub fn set_cell_from_input(&mut self, row: usize, field: &str, input: &str) -> Result<()> {
        let column = self
            .dataset
            .schema()
            .get(field)
            .ok_or_else(|| EngineError::UnknownField(field.to_string()))?;
        let value = parse_input(column.kind(), input);
        let next = self.dataset.set_cell(row, field, value)?;
        self.commit(next);
        Ok(())
    }

    /// Replace the column list after a reorder or edit.
    pub fn update_columns(&mut self, columns: Vec<ColumnDefinition>) -> Result<()> {
        let next = self.dataset.update_columns(columns)?;
        self.commit(next);
        Ok(())
    }

    /// Move the column at `from` to position `to`.
    pub fn move_column(&mut self, from: usize, to: usize) -> Result<()> {
        let mut columns = self.dataset.schema().columns().to_vec();
        let len = columns.len();
        if from >= len || to >= len {
            return Err(EngineError::IndexOutOfRange {
                index: from.max(to),
                len,
            }
            .into());
        }
        let column = columns.remove(from);
        columns.insert(to, column);
        self.update_columns(columns)
    }

    /// Replace a chart selection. Keys must name existing columns.
    pub fn set_selection(&mut self, slot: ChartSlot, selection: Selection) -> Result<()> {
        if let Some(unknown) = selection.unknown_fields(self.dataset.schema()).first() {
            return Err(EngineError::UnknownField(unknown.to_string()).into());
        }
        *self.selection_mut(slot) = selection;
        Ok(())
    }

    /// Add or remove one key from a chart selection.
    pub fn toggle_selection(&mut self, slot: ChartSlot, field: &str) -> Result<()> {
        if !self.dataset.schema().contains(field) {
            return Err(EngineError::UnknownField(field.to_string()).into());
        }
        self.selection_mut(slot).toggle(field);
        Ok(())
    }

    /// Undo the last edit
    pub fn undo(&mut self) -> Result<()> {
        let previous = self.undo_stack.pop().ok_or(ThermogridError::NothingToUndo)?;
        let current = std::mem::replace(&mut self.dataset, previous);
        self.redo_stack.push(current);
        self.modified = true;
        Ok(())
    }

    /// Redo the last undone edit
    pub fn redo(&mut self) -> Result<()> {
        let next = self.redo_stack.pop().ok_or(ThermogridError::NothingToRedo)?;
        let current = std::mem::replace(&mut self.dataset, next);
        self.undo_stack.push(current);
        self.modified = true;
        Ok(())
    }
}

/// Parse user input for a cell of the given kind. Input that does not fit
/// the kind is kept as text.
pub(crate) fn parse_input(kind: ColumnKind, input: &str) -> Value {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return kind.default_value();
    }
    match kind {
        ColumnKind::Numeric | ColumnKind::Computed => trimmed
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Value::Number)
            .unwrap_or_else(|| Value::text(input)),
        ColumnKind::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(Value::Date)
            .unwrap_or_else(|_| Value::text(input)),
        ColumnKind::Text => Value::text(input),
    }
}

/// Build a column from command arguments: `<field> <Label...> [kind|=formula]`.
///
/// The kind is one of `text`, `num`, `date` (default `text`); an argument
/// starting with `=` makes a computed column and runs to the end of the line.
pub fn parse_column_arg(args: &str) -> Result<ColumnDefinition> {
    let args = args.trim();
    let (field, rest) = args
        .split_once(char::is_whitespace)
        .map(|(f, r)| (f, r.trim()))
        .unwrap_or((args, ""));
    if field.is_empty() {
        return Err(EngineError::EmptyField.into());
    }

    if let Some(pos) = formula_start(rest) {
        let label = non_empty_or(rest[..pos].trim(), field);
        let formula = Formula::compile(&rest[pos..])?;
        return Ok(ColumnDefinition::formula(field, label, formula));
    }

    let (label, kind) = match rest.rsplit_once(char::is_whitespace) {
        Some((label, last)) if is_kind_word(last) => (label.trim(), Some(last)),
        None if is_kind_word(rest) => ("", Some(rest)),
        _ => (rest, None),
    };
    let label = non_empty_or(label, field);
    let column = match kind.map(ColumnKind::from_tag).transpose()? {
        Some(ColumnKind::Numeric) => ColumnDefinition::numeric(field, label),
        Some(ColumnKind::Date) => ColumnDefinition::date(field, label),
        _ => ColumnDefinition::text(field, label),
    };
    Ok(column)
}

fn formula_start(rest: &str) -> Option<usize> {
    if rest.starts_with('=') {
        return Some(0);
    }
    rest.find(" =").map(|i| i + 1)
}

fn is_kind_word(word: &str) -> bool {
    ColumnKind::from_tag(word).is_ok()
}

fn non_empty_or<'a>(s: &'a str, fallback: &'a str) -> &'a str {
    if s.is_empty() { fallback } else { s }
}
