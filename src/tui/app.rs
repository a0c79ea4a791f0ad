//! Application state and logic.
//!
//! This module contains the main [`App`] struct which wraps the UI-agnostic
//! [`Document`] with cursor position, editing buffers, and UI state.
//! The app operates in different [`Mode`]s (Normal, Edit, Command) similar
//! to Vim's modal editing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thermogrid_core::{ChartSlot, Document, RemoteClient, parse_column_arg};
use thermogrid_engine::ColumnDefinition;
use thermogrid_engine::engine::format_value;
use thermogrid_engine::plot::Selection;

/// Modal editing state for the application.
///
/// - [`Normal`](Mode::Normal): Navigate and execute commands
/// - [`Edit`](Mode::Edit): Edit cell contents
/// - [`Command`](Mode::Command): Enter ex-style commands (`:w`, `:q`, etc.)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Edit,
    Command,
}

/// Main application state container.
pub struct App {
    /// Dataset, chart selections and history
    pub core: Document,
    /// Backend client built from the document's config
    pub remote: RemoteClient,
    /// Current cursor position (column index)
    pub cursor_col: usize,
    /// Current cursor position (row index)
    pub cursor_row: usize,
    /// Viewport offset (column)
    pub viewport_col: usize,
    /// Viewport offset (row)
    pub viewport_row: usize,
    /// Number of visible columns
    pub visible_cols: usize,
    /// Number of visible rows
    pub visible_rows: usize,
    /// Current mode
    pub mode: Mode,
    /// Edit buffer for cell editing
    pub edit_buffer: String,
    /// Cursor position within edit buffer (byte offset)
    pub edit_cursor: usize,
    /// Command buffer for command mode
    pub command_buffer: String,
    /// Cursor position within command buffer (byte offset)
    pub command_cursor: usize,
    /// Status message to display
    pub status_message: String,
    /// Set after a first quit request with unsaved changes
    pub confirm_quit: bool,
    /// Default column width for display
    pub col_width: usize,
    /// Per-column widths (column index -> width). Default is col_width.
    pub column_widths: HashMap<usize, usize>,
    /// Chart modal state (when open)
    pub chart_modal: Option<ChartSlot>,
    /// Help modal state
    pub help_modal: bool,
    pub help_scroll: usize,
}

impl App {
    pub fn new(core: Document) -> Self {
        let remote = RemoteClient::new(&core.config);
        App {
            core,
            remote,
            cursor_col: 0,
            cursor_row: 0,
            viewport_col: 0,
            viewport_row: 0,
            visible_cols: 6,
            visible_rows: 20,
            mode: Mode::Normal,
            edit_buffer: String::new(),
            edit_cursor: 0,
            command_buffer: String::new(),
            command_cursor: 0,
            status_message: String::new(),
            confirm_quit: false,
            col_width: 14,
            column_widths: HashMap::new(),
            chart_modal: None,
            help_modal: false,
            help_scroll: 0,
        }
    }

    pub fn max_cols(&self) -> usize {
        self.core.schema().len()
    }

    pub fn max_rows(&self) -> usize {
        self.core.dataset().row_count()
    }

    pub fn current_column(&self) -> Option<&ColumnDefinition> {
        self.core.schema().columns().get(self.cursor_col)
    }

    pub fn close_chart_modal(&mut self) {
        self.chart_modal = None;
    }

    pub fn close_help_modal(&mut self) {
        self.help_modal = false;
    }

    pub fn scroll_help_by(&mut self, delta: i32) {
        self.help_scroll = if delta < 0 {
            self.help_scroll.saturating_sub(delta.unsigned_abs() as usize)
        } else {
            self.help_scroll.saturating_add(delta as usize)
        };
    }

    pub fn open_chart_modal(&mut self, slot: ChartSlot) {
        if self.core.selection(slot).is_empty() {
            let cmd = match slot {
                ChartSlot::First => "chart1",
                ChartSlot::Second => "chart2",
            };
            self.status_message = format!(
                "{}: no columns selected (use :{} <keys>)",
                slot.title(),
                cmd
            );
            return;
        }
        self.chart_modal = Some(slot);
        self.status_message.clear();
    }

    /// Toggle the column under the cursor in a chart selection.
    /// Only numeric columns can be charted.
    pub fn toggle_chart_column(&mut self, slot: ChartSlot) {
        let Some(column) = self.current_column() else {
            return;
        };
        if !column.kind().is_numeric() {
            self.status_message = format!("Error: '{}' is not a numeric column", column.field());
            return;
        }
        let field = column.field().to_string();
        match self.core.toggle_selection(slot, &field) {
            Ok(()) => {
                self.status_message = format!(
                    "{}: {}",
                    slot.title(),
                    describe_selection(self.core.selection(slot))
                );
            }
            Err(e) => self.status_message = format!("Error: {}", e),
        }
    }

    /// Move cursor by delta, clamping to valid range
    pub fn move_cursor(&mut self, dx: i32, dy: i32) {
        let max_col = self.max_cols().saturating_sub(1) as i64;
        let max_row = self.max_rows().saturating_sub(1) as i64;
        self.cursor_col = (self.cursor_col as i64 + dx as i64).clamp(0, max_col) as usize;
        self.cursor_row = (self.cursor_row as i64 + dy as i64).clamp(0, max_row) as usize;
        self.update_viewport();
    }

    /// Pull the cursor back inside the dataset after it was replaced.
    pub fn clamp_cursor(&mut self) {
        self.move_cursor(0, 0);
    }

    /// Update viewport to keep cursor visible
    pub fn update_viewport(&mut self) {
        if self.cursor_col < self.viewport_col {
            self.viewport_col = self.cursor_col;
        } else if self.cursor_col >= self.viewport_col + self.visible_cols {
            self.viewport_col = self.cursor_col + 1 - self.visible_cols;
        }

        if self.cursor_row < self.viewport_row {
            self.viewport_row = self.cursor_row;
        } else if self.cursor_row >= self.viewport_row + self.visible_rows {
            self.viewport_row = self.cursor_row + 1 - self.visible_rows;
        }
    }

    pub fn goto_first(&mut self) {
        self.cursor_col = 0;
        self.cursor_row = 0;
        self.update_viewport();
    }

    pub fn goto_last(&mut self) {
        self.cursor_row = self.max_rows().saturating_sub(1);
        self.update_viewport();
    }

    /// Formatted value of one cell, empty when the row or column is absent.
    pub fn cell_display(&self, row: usize, col: usize) -> String {
        let Some(column) = self.core.schema().columns().get(col) else {
            return String::new();
        };
        self.core
            .dataset()
            .cell(row, column.field())
            .map(|value| format_value(value, column.format()))
            .unwrap_or_default()
    }

    /// Enter edit mode for current cell
    pub fn enter_edit_mode(&mut self) {
        let Some(column) = self.current_column() else {
            self.status_message = "No columns. Use :col to add one".to_string();
            return;
        };
        if column.is_computed() {
            self.status_message = format!(
                "Error: '{}' is computed and cannot be edited",
                column.field()
            );
            return;
        }
        let field = column.field().to_string();
        let Some(value) = self.core.dataset().cell(self.cursor_row, &field) else {
            self.status_message = "No rows. Press o to add one".to_string();
            return;
        };
        self.edit_buffer = if value.is_blank() {
            String::new()
        } else {
            value.to_string()
        };
        self.edit_cursor = self.edit_buffer.len();
        self.mode = Mode::Edit;
    }

    /// Commit the current edit
    pub fn commit_edit(&mut self) {
        let field = self.current_column().map(|c| c.field().to_string());
        if let Some(field) = field {
            match self
                .core
                .set_cell_from_input(self.cursor_row, &field, &self.edit_buffer)
            {
                Ok(()) => self.status_message.clear(),
                Err(e) => self.status_message = format!("Error: {}", e),
            }
        }
        self.mode = Mode::Normal;
        self.edit_buffer.clear();
        self.edit_cursor = 0;
    }

    /// Append a row with default values and move the cursor to it.
    pub fn append_row(&mut self) {
        let index = self.core.append_row();
        self.cursor_row = index;
        self.update_viewport();
        self.status_message = format!("Added row {}", index + 1);
    }

    pub fn undo(&mut self) {
        match self.core.undo() {
            Ok(()) => self.status_message.clear(),
            Err(e) => self.status_message = e.to_string(),
        }
        self.clamp_cursor();
    }

    pub fn redo(&mut self) {
        match self.core.redo() {
            Ok(()) => self.status_message.clear(),
            Err(e) => self.status_message = e.to_string(),
        }
        self.clamp_cursor();
    }

    /// Quit request from Normal mode. Returns `true` when the app should exit.
    pub fn request_quit(&mut self) -> bool {
        if !self.core.modified || self.confirm_quit {
            return true;
        }
        self.confirm_quit = true;
        self.status_message =
            "Unsaved changes! Press q again to quit, or :w <file.docx> to export".to_string();
        false
    }

    pub fn get_column_width(&self, col: usize) -> usize {
        *self.column_widths.get(&col).unwrap_or(&self.col_width)
    }

    /// Set width for current column
    pub fn set_column_width(&mut self, width: usize) {
        let width = width.clamp(4, 50);
        self.column_widths.insert(self.cursor_col, width);
    }

    pub fn increase_column_width(&mut self) {
        let current = self.get_column_width(self.cursor_col);
        self.set_column_width(current + 2);
    }

    pub fn decrease_column_width(&mut self) {
        let current = self.get_column_width(self.cursor_col);
        self.set_column_width(current.saturating_sub(2));
    }

    /// Execute a command entered in command mode.
    ///
    /// Returns `true` if the application should quit, `false` otherwise.
    pub fn execute_command(&mut self) -> bool {
        let cmd = self.command_buffer.trim().to_string();
        self.command_buffer.clear();
        self.command_cursor = 0;
        self.mode = Mode::Normal;

        let (command, args) = match cmd.split_once(' ') {
            Some((command, args)) => (command, Some(args.trim()).filter(|a| !a.is_empty())),
            None => (cmd.as_str(), None),
        };

        match command {
            "q" | "quit" => {
                if self.core.modified {
                    self.status_message =
                        "Unsaved changes! Use :q! to force quit or :w <file.docx> to export"
                            .to_string();
                    return false;
                }
                return true;
            }
            "q!" => {
                return true;
            }
            "e" | "open" | "import" => match args {
                Some(path) => self.import_file(Path::new(path)),
                None => self.status_message = "Usage: :e <file.xlsx|file.csv>".to_string(),
            },
            "w" | "export" => self.export_report(args, "docx"),
            "md" => self.export_report(args, "md"),
            "col" | "column" => match args {
                Some(spec) => self.add_column(spec),
                None => {
                    self.status_message =
                        "Usage: :col <key> <Label> [text|num|date|=formula]".to_string()
                }
            },
            "move" | "mv" => self.move_column(args),
            "chart1" => self.set_chart(ChartSlot::First, args),
            "chart2" => self.set_chart(ChartSlot::Second, args),
            "row" | "addrow" => self.append_row(),
            "submit" => self.submit(),
            "verify" => {
                let token = args
                    .map(str::to_string)
                    .or_else(|| self.core.token.clone());
                match token {
                    Some(token) => self.verify(&token),
                    None => self.status_message = "Usage: :verify <token>".to_string(),
                }
            }
            "undo" | "u" => self.undo(),
            "redo" => self.redo(),
            "colwidth" | "cw" => match args.and_then(|a| a.parse::<usize>().ok()) {
                Some(width) => {
                    self.set_column_width(width);
                    self.status_message = format!(
                        "Column width set to {}",
                        self.get_column_width(self.cursor_col)
                    );
                }
                None => self.status_message = "Usage: :colwidth WIDTH".to_string(),
            },
            "help" | "h" => {
                self.help_modal = true;
                self.help_scroll = 0;
            }
            "" => {}
            _ => {
                self.status_message = format!("Unknown command: {}", command);
            }
        }
        false
    }

    pub fn import_file(&mut self, path: &Path) {
        match self.core.import_file(path) {
            Ok(()) => {
                self.cursor_col = 0;
                self.cursor_row = 0;
                self.viewport_col = 0;
                self.viewport_row = 0;
                self.column_widths.clear();
                self.status_message = format!(
                    "Imported {} rows, {} columns from {}",
                    self.max_rows(),
                    self.max_cols(),
                    path.display()
                );
            }
            Err(e) => self.status_message = format!("Import error: {}", e),
        }
    }

    fn export_report(&mut self, path: Option<&str>, default_ext: &str) {
        let path = match path {
            Some(p) => PathBuf::from(p),
            None => match self.core.default_report_path(default_ext) {
                Ok(p) => p,
                Err(_) => {
                    let cmd = if default_ext == "md" { "md" } else { "w" };
                    self.status_message = format!("No file path. Use :{} <path>", cmd);
                    return;
                }
            },
        };
        let is_markdown = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("md"));
        let result = if is_markdown {
            self.core.export_markdown(&path)
        } else {
            self.core.export_docx(&path)
        };
        match result {
            Ok(()) => self.status_message = format!("Exported to {}", path.display()),
            Err(e) => self.status_message = format!("Export error: {}", e),
        }
    }

    fn add_column(&mut self, spec: &str) {
        let result = parse_column_arg(spec).and_then(|column| {
            let field = column.field().to_string();
            self.core.add_column(column)?;
            Ok(field)
        });
        match result {
            Ok(field) => {
                self.cursor_col = self.max_cols().saturating_sub(1);
                self.update_viewport();
                self.status_message = format!("Added column '{}'", field);
            }
            Err(e) => self.status_message = format!("Error: {}", e),
        }
    }

    /// `:move <key> <position>`, position 1-based.
    fn move_column(&mut self, args: Option<&str>) {
        let parsed = args.and_then(|a| a.split_once(' ')).and_then(|(key, pos)| {
            let to = pos.trim().parse::<usize>().ok()?.checked_sub(1)?;
            Some((key.trim(), to))
        });
        let Some((key, to)) = parsed else {
            self.status_message = "Usage: :move <key> <position>".to_string();
            return;
        };
        let Some(from) = self.core.schema().index_of(key) else {
            self.status_message = format!("Error: unknown column '{}'", key);
            return;
        };
        match self.core.move_column(from, to) {
            Ok(()) => {
                self.cursor_col = to;
                self.update_viewport();
                self.status_message = format!("Moved '{}' to position {}", key, to + 1);
            }
            Err(e) => self.status_message = format!("Error: {}", e),
        }
    }

    fn set_chart(&mut self, slot: ChartSlot, fields: Option<&str>) {
        let selection = fields.map(Selection::parse_list).unwrap_or_default();
        match self.core.set_selection(slot, selection) {
            Ok(()) => {
                self.status_message = format!(
                    "{}: {}",
                    slot.title(),
                    describe_selection(self.core.selection(slot))
                );
            }
            Err(e) => self.status_message = format!("Error: {}", e),
        }
    }

    fn submit(&mut self) {
        match self.core.submit(&self.remote) {
            Ok(redirect) => self.status_message = format!("Submitted. Continue at {}", redirect),
            Err(e) => self.status_message = format!("Error: {}", e),
        }
    }

    fn verify(&mut self, token: &str) {
        match self.core.verify(&self.remote, token) {
            Ok(true) => {
                self.clamp_cursor();
                self.status_message = format!(
                    "Session verified: {} rows, {} columns",
                    self.max_rows(),
                    self.max_cols()
                );
            }
            Ok(false) => self.status_message = "Error: invalid session token".to_string(),
            Err(e) => self.status_message = format!("Error: {}", e),
        }
    }
}

fn describe_selection(selection: &Selection) -> String {
    if selection.is_empty() {
        "cleared".to_string()
    } else {
        selection.fields().join(", ")
    }
}
