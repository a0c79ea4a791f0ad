//! Dataset engine for thermogrid.
//!
//! Holds the column schema, the row store, the derivation engine that keeps
//! computed columns consistent with raw edits, and the chart projection.

pub mod dataset;
pub mod engine;
pub mod error;
pub mod plot;
pub mod presets;
pub mod rows;
pub mod schema;
pub mod value;

pub use dataset::Dataset;
pub use error::{DerivationError, EngineError, Result};
pub use rows::RowStore;
pub use schema::{ColumnDefinition, ColumnFormat, ColumnKind, ColumnSpec, Schema};
pub use value::{Record, Value};
