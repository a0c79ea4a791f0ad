//! Ordered, copy-on-write row storage.

use std::sync::Arc;

use crate::error::{EngineError, Result};
use crate::value::Record;

/// Ordered list of records.
///
/// Rows are shared behind `Arc`, so cloning a store and replacing a single
/// row leaves every other row shared with the previous version.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RowStore {
    rows: Vec<Arc<Record>>,
}

impl RowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_shared(rows: Vec<Arc<Record>>) -> Self {
        RowStore { rows }
    }

    pub fn replace_all(records: Vec<Record>) -> Self {
        RowStore {
            rows: records.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn append_row(&self, record: Record) -> Self {
        let mut rows = self.rows.clone();
        rows.push(Arc::new(record));
        RowStore { rows }
    }

    pub fn update_row(&self, index: usize, record: Record) -> Result<Self> {
        if index >= self.rows.len() {
            return Err(EngineError::IndexOutOfRange {
                index,
                len: self.rows.len(),
            });
        }
        let mut rows = self.rows.clone();
        rows[index] = Arc::new(record);
        Ok(RowStore { rows })
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.rows.get(index).map(Arc::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Record>> {
        self.rows.iter()
    }

    /// Snapshot of the rows as owned records.
    pub fn rows(&self) -> Vec<Record> {
        self.rows.iter().map(|r| r.as_ref().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
