//! Derivation engine.
//!
//! - [`Formula`] - Restricted formula language compiled once per column
//! - [`DerivationRule`] - Formula or native closure behind a computed column
//! - [`detect_cycle`] - Circular reference detection among computed columns
//! - [`extract_dependencies`] - Fields a formula reads
//! - [`initialize_row`], [`recompute_row`], [`backfill_column`] - Derivation passes
//! - [`format_number`], [`format_value`] - Display formatting

mod cycle;
mod deps;
mod derive;
mod format;
mod formula;
mod rule;

pub use cycle::detect_cycle;
pub use deps::extract_dependencies;
pub use derive::{backfill_column, derive_all, evaluate_column, initialize_row, recompute_row};
pub use format::{format_number, format_value};
pub use formula::{BinaryOp, Expr, Formula, Function};
pub use rule::{DerivationRule, NativeRule};
