use std::path::Path;

use thermogrid_engine::plot::PlotData;
use thermogrid_engine::{Dataset, Schema};

use super::{ChartSlot, Document};
use crate::chart::render_png;
use crate::error::{Result, ThermogridError};
use crate::remote::{RemoteClient, SubmissionPayload, Verification};
use crate::storage::{self, ChartImage, ReportOptions};

impl Document {
    /// Import a spreadsheet, replacing the dataset and clearing both chart
    /// selections. On failure the document is unchanged.
    pub fn import_file(&mut self, path: &Path) -> Result<()> {
        let dataset = storage::import_path(path)?;
        self.load_dataset(dataset);
        self.file_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Chart data for one slot, or `None` when nothing is selected.
    pub fn plot_data(&self, slot: ChartSlot) -> Option<PlotData> {
        PlotData::project(&self.dataset, self.selection(slot), self.config.label_rule)
    }

    /// Render PNG snapshots of every non-empty chart slot.
    pub fn chart_images(&self) -> Result<Vec<ChartImage>> {
        let (width, height) = (self.config.chart_width, self.config.chart_height);
        let mut images = Vec::new();
        for slot in ChartSlot::ALL {
            if let Some(data) = self.plot_data(slot) {
                images.push(ChartImage {
                    title: slot.title().to_string(),
                    png: render_png(&data, width, height)?,
                    width,
                    height,
                });
            }
        }
        Ok(images)
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions::from(&self.config)
    }

    /// Write the Word report with the current chart snapshots.
    pub fn export_docx(&mut self, path: &Path) -> Result<()> {
        let images = self.chart_images()?;
        storage::write_docx_file(path, &self.dataset, &images, &self.report_options())?;
        self.modified = false;
        Ok(())
    }

    fn chart_plots(&self) -> Vec<(String, PlotData)> {
        ChartSlot::ALL
            .iter()
            .filter_map(|slot| Some((slot.title().to_string(), self.plot_data(*slot)?)))
            .collect()
    }

    /// Markdown rendering of the report, with ASCII charts.
    pub fn render_markdown(&self) -> String {
        storage::render_markdown(&self.dataset, &self.chart_plots(), &self.report_options())
    }

    pub fn export_markdown(&mut self, path: &Path) -> Result<()> {
        storage::write_markdown(path, &self.dataset, &self.chart_plots(), &self.report_options())?;
        self.modified = false;
        Ok(())
    }

    /// Build the submission payload with the current chart snapshots.
    pub fn submission_payload(&self) -> Result<SubmissionPayload> {
        let images = self.chart_images()?;
        let png_for = |title: &str| {
            images
                .iter()
                .find(|image| image.title == title)
                .map(|image| image.png.as_slice())
        };
        Ok(SubmissionPayload::new(
            self.token.as_deref(),
            &self.dataset,
            png_for(ChartSlot::First.title()),
            png_for(ChartSlot::Second.title()),
        ))
    }

    /// Submit the dataset and charts. Returns the backend's follow-up URL.
    /// The dataset is left as it is whatever the outcome.
    pub fn submit(&mut self, client: &RemoteClient) -> Result<String> {
        let payload = self.submission_payload()?;
        let redirect = client.submit(&payload)?;
        self.modified = false;
        Ok(redirect)
    }

    /// Resolve `token` and load the stored dataset it refers to, if any.
    ///
    /// Returns whether the token was accepted. An invalid token is logged
    /// and leaves the document untouched.
    pub fn verify(&mut self, client: &RemoteClient, token: &str) -> Result<bool> {
        let verification = client.verify(token)?;
        self.apply_verification(token, verification)
    }

    pub(crate) fn apply_verification(
        &mut self,
        token: &str,
        verification: Verification,
    ) -> Result<bool> {
        match verification {
            Verification::Invalid { reason } => {
                log::warn!(
                    "invalid session token: {}",
                    reason.as_deref().unwrap_or("no reason given")
                );
                Ok(false)
            }
            Verification::Valid { columns, rows } => {
                self.token = Some(token.to_string());
                if columns.is_none() && rows.is_none() {
                    return Ok(true);
                }
                let schema = match columns {
                    Some(specs) => Schema::from_specs(&specs)?,
                    None => self.dataset.schema().clone(),
                };
                let records = match rows {
                    Some(rows) => rows,
                    None if schema_changed(&schema, self.dataset.schema()) => Vec::new(),
                    None => self.dataset.rows().rows(),
                };
                self.load_dataset(Dataset::replace_all(schema, records));
                Ok(true)
            }
        }
    }

    /// Path used for a report when none is given.
    pub fn default_report_path(&self, extension: &str) -> Result<std::path::PathBuf> {
        let source = self.file_path.as_ref().ok_or(ThermogridError::NoFilePath)?;
        Ok(source.with_extension(extension))
    }
}

fn schema_changed(a: &Schema, b: &Schema) -> bool {
    a.len() != b.len()
        || a
            .columns()
            .iter()
            .zip(b.columns())
            .any(|(x, y)| x.field() != y.field())
}
