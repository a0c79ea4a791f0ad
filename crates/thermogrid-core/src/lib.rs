//! thermogrid-core - UI-agnostic document model, file formats and backend client.

pub mod chart;
pub mod config;
pub mod document;
pub mod error;
pub mod remote;
pub mod storage;

pub use config::{Config, load_config};
pub use document::{ChartSlot, Document, parse_column_arg};
pub use error::{Result, ThermogridError};
pub use remote::{RemoteClient, SubmissionPayload, Verification};
