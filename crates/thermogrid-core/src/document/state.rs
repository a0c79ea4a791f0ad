use std::path::PathBuf;

use thermogrid_engine::plot::Selection;
use thermogrid_engine::presets::temperature_monitoring;
use thermogrid_engine::{Dataset, Schema};

use crate::config::Config;
use crate::error::Result;

/// Maximum number of undo entries to keep
pub(crate) const MAX_UNDO_STACK: usize = 100;

/// One of the two chart slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartSlot {
    First,
    Second,
}

impl ChartSlot {
    pub const ALL: [ChartSlot; 2] = [ChartSlot::First, ChartSlot::Second];

    pub fn title(self) -> &'static str {
        match self {
            ChartSlot::First => "Chart 1",
            ChartSlot::Second => "Chart 2",
        }
    }
}

/// UI-agnostic session state.
///
/// The dataset is only ever replaced wholesale; every replacement made by an
/// edit is recorded so it can be undone.
pub struct Document {
    /// Current schema and rows
    pub(crate) dataset: Dataset,
    /// Column selections for the two charts
    pub chart1: Selection,
    pub chart2: Selection,
    /// File the dataset was imported from
    pub file_path: Option<PathBuf>,
    /// Whether the dataset has been edited since import or export
    pub modified: bool,
    /// Session token used for verification and submission
    pub token: Option<String>,
    pub config: Config,
    /// Undo stack of previous datasets
    pub(crate) undo_stack: Vec<Dataset>,
    /// Redo stack
    pub(crate) redo_stack: Vec<Dataset>,
}

impl Document {
    /// Create a document holding the built-in temperature layout and no rows.
    ///
    /// This constructor is side-effect free: it does not touch the filesystem.
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self::with_dataset(config, Dataset::new(temperature_monitoring()?)))
    }

    pub fn with_dataset(config: Config, dataset: Dataset) -> Self {
        Document {
            dataset,
            chart1: Selection::new(),
            chart2: Selection::new(),
            file_path: None,
            modified: false,
            token: None,
            config,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn schema(&self) -> &Schema {
        self.dataset.schema()
    }

    pub fn selection(&self, slot: ChartSlot) -> &Selection {
        match slot {
            ChartSlot::First => &self.chart1,
            ChartSlot::Second => &self.chart2,
        }
    }

    pub(crate) fn selection_mut(&mut self, slot: ChartSlot) -> &mut Selection {
        match slot {
            ChartSlot::First => &mut self.chart1,
            ChartSlot::Second => &mut self.chart2,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Replace the dataset without recording history (import, verification).
    pub(crate) fn load_dataset(&mut self, dataset: Dataset) {
        self.dataset = dataset;
        self.chart1.clear();
        self.chart2.clear();
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.modified = false;
    }
}
