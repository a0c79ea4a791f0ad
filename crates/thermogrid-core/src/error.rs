//! Error types for thermogrid core.

use thermogrid_engine::EngineError;
use thiserror::Error;

/// Errors surfaced by user-initiated document operations.
///
/// Derivation failures never appear here: computed cells absorb them as zero.
#[derive(Error, Debug)]
pub enum ThermogridError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Import failed: {0}")]
    ImportParse(String),

    #[error("Spreadsheet error: {0}")]
    Excel(#[from] calamine::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Submission rejected: {0}")]
    Submission(String),

    #[error("Verification rejected: {0}")]
    Verification(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("No endpoint configured for {0}")]
    NoEndpoint(&'static str),

    #[error("No session token")]
    NoToken,

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error("No file path set")]
    NoFilePath,

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ThermogridError>;
