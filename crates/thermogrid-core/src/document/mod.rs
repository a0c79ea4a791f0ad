//! Document state and logic (UI-agnostic).

mod io;
mod ops;
mod state;

pub use ops::parse_column_arg;
pub use state::{ChartSlot, Document};
