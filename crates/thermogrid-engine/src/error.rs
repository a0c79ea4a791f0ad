//! Error types for the dataset engine.

use thiserror::Error;

/// Errors surfaced by schema and dataset operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Column '{0}' already exists")]
    DuplicateField(String),

    #[error("Column key must not be empty")]
    EmptyField,

    #[error("Unknown column '{0}'")]
    UnknownField(String),

    #[error("Column '{0}' is computed and cannot be edited")]
    NotEditable(String),

    #[error("Unknown column type '{0}'")]
    UnknownColumnType(String),

    #[error("Row {index} out of range ({len} rows)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Formula error at position {position} in '{formula}': {message}")]
    FormulaSyntax {
        formula: String,
        position: usize,
        message: String,
    },

    #[error("Circular reference: {}", .0.join(" -> "))]
    CircularReference(Vec<String>),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Failure inside a derivation rule.
///
/// Never returned from dataset operations: the derivation engine replaces
/// the cell with zero instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DerivationError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite number")]
    NonFinite,

    #[error("{0}")]
    Failed(String),
}
