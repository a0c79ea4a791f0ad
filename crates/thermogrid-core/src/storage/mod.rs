//! Import and export formats.

pub mod csv;
pub mod docx;
pub mod md;
pub mod sheet;
pub mod xlsx;

use std::path::Path;

use tempfile::NamedTempFile;
use thermogrid_engine::Dataset;

use crate::config::Config;
use crate::error::{Result, ThermogridError};

pub use docx::{ChartImage, write_docx, write_docx_file};
pub use md::{render_markdown, write_markdown};

/// Layout settings shared by the report writers.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportOptions {
    pub title: String,
    /// Columns per table.
    pub chunk_size: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions::from(&Config::default())
    }
}

impl From<&Config> for ReportOptions {
    fn from(config: &Config) -> Self {
        ReportOptions {
            title: config.report_title.clone(),
            chunk_size: config.chunk_size,
        }
    }
}

/// Import a spreadsheet, choosing the reader by file extension.
pub fn import_path(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => self::xlsx::read_workbook(path),
        "csv" => self::csv::read_csv(path),
        _ => Err(ThermogridError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Write a report to `path` through `render`. Output is staged in a temporary
/// file next to `path` and only moved into place once complete, so a failed
/// export leaves any previous file untouched.
pub(crate) fn write_report<F>(path: &Path, render: F) -> Result<()>
where
    F: FnOnce(&mut NamedTempFile) -> Result<()>,
{
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut staged = NamedTempFile::new_in(dir)?;
    render(&mut staged)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            import_path(Path::new("readings.json")),
            Err(ThermogridError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_failed_report_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        std::fs::write(&path, "previous report").unwrap();

        let result = write_report(&path, |file| {
            file.write_all(b"half a rep")?;
            Err(ThermogridError::Export("renderer failed".into()))
        });
        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous report");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        write_report(&path, |file| Ok(file.write_all(b"new report")?)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new report");
    }
}
