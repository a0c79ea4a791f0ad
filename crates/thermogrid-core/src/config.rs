//! User configuration (`config.toml`).
//!
//! Loading never fails: problems are collected as warnings and the affected
//! settings fall back to their defaults.

use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thermogrid_engine::plot::LabelRule;

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Endpoint receiving the dataset and chart snapshots.
    pub submit_url: String,
    /// Endpoint resolving a session token to a stored dataset.
    pub verify_url: String,
    /// Page the backend expects the user to continue on after a submission.
    pub redirect_url: String,
    pub timeout_secs: u64,
    /// Columns per table in exported reports.
    pub chunk_size: usize,
    pub chart_width: u32,
    pub chart_height: u32,
    pub label_rule: LabelRule,
    pub report_title: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            submit_url: "http://localhost:8069/create_temp_mon".to_string(),
            verify_url: "http://localhost:8069/api/temp_monitoring/verify".to_string(),
            redirect_url: "http://localhost:8069/web".to_string(),
            timeout_secs: 30,
            chunk_size: 7,
            chart_width: 800,
            chart_height: 400,
            label_rule: LabelRule::Row,
            report_title: "Temperature Monitoring".to_string(),
        }
    }
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    fn sanitize(mut self, warnings: &mut Vec<String>) -> Self {
        let defaults = Config::default();
        if self.chunk_size == 0 {
            warnings.push("chunk_size must be at least 1; using 7".to_string());
            self.chunk_size = defaults.chunk_size;
        }
        if self.chart_width < 64 || self.chart_height < 64 {
            warnings.push(format!(
                "chart size {}x{} too small; using {}x{}",
                self.chart_width, self.chart_height, defaults.chart_width, defaults.chart_height
            ));
            self.chart_width = defaults.chart_width;
            self.chart_height = defaults.chart_height;
        }
        self
    }
}

/// Load configuration from `config_file`, or from the platform config
/// directory when none is given.
///
/// Returns the configuration and any warnings encountered.
pub fn load_config(config_file: Option<&Path>) -> (Config, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let path = config_file.map(Path::to_path_buf).or_else(user_config_path);

    let Some(path) = path else {
        return (Config::default(), warnings);
    };
    if !path.exists() {
        if config_file.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (Config::default(), warnings);
    }

    let config = match std::fs::metadata(&path) {
        Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
            warnings.push(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            ));
            None
        }
        Ok(_) => match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    warnings.push(format!("Failed to parse {}: {}", path.display(), err));
                    None
                }
            },
            Err(err) => {
                warnings.push(format!("Failed to read {}: {}", path.display(), err));
                None
            }
        },
        Err(err) => {
            warnings.push(format!(
                "Failed to read metadata for {}: {}",
                path.display(),
                err
            ));
            None
        }
    };

    let config = config.unwrap_or_default().sanitize(&mut warnings);
    (config, warnings)
}

pub fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "thermogrid")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let file = write_config("chunk_size = 5\nlabel_rule = \"day\"\n");
        let (config, warnings) = load_config(Some(file.path()));
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(config.chunk_size, 5);
        assert_eq!(config.label_rule, LabelRule::DayFromFirstColumn);
        assert_eq!(config.report_title, "Temperature Monitoring");
    }

    #[test]
    fn test_unknown_key_warns_and_uses_defaults() {
        let file = write_config("chunk_size = 5\ncolour = \"red\"\n");
        let (config, warnings) = load_config(Some(file.path()));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Failed to parse"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_zero_chunk_size_sanitized() {
        let file = write_config("chunk_size = 0\n");
        let (config, warnings) = load_config(Some(file.path()));
        assert_eq!(config.chunk_size, 7);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_missing_explicit_file_warns() {
        let dir = tempfile::tempdir().unwrap();
        let (config, warnings) = load_config(Some(&dir.path().join("absent.toml")));
        assert_eq!(config, Config::default());
        assert!(warnings[0].starts_with("Config file not found"));
    }
}
