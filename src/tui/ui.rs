//! UI rendering

use super::app::{App, Mode};
use super::help::{get_about_help, get_commands_help, get_help_text};
use super::keymap;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
};
use textplots::{AxisBuilder, Chart, LabelBuilder, LabelFormat, LineStyle, Plot, Shape};
use thermogrid_core::ChartSlot;
use thermogrid_engine::ColumnDefinition;
use thermogrid_engine::engine::DerivationRule;
use thermogrid_engine::plot::PlotData;

pub(crate) const FORMULA_BAR_HEIGHT: u16 = 3;
pub(crate) const GRID_MIN_HEIGHT: u16 = 10;
pub(crate) const STATUS_BAR_HEIGHT: u16 = 1;
pub(crate) const ROW_HEADER_WIDTH: u16 = 5;
pub(crate) const GRID_COLUMN_SPACING: u16 = 1;

pub(crate) fn split_main_chunks(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(FORMULA_BAR_HEIGHT),
            Constraint::Min(GRID_MIN_HEIGHT),
            Constraint::Length(STATUS_BAR_HEIGHT),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

pub(crate) fn grid_cell_at(
    app: &App,
    grid_area: Rect,
    mouse_col: u16,
    mouse_row: u16,
) -> Option<(usize, usize)> {
    if grid_area.width < 3 || grid_area.height < 4 {
        return None;
    }

    let inner_x = grid_area.x.saturating_add(1);
    let inner_y = grid_area.y.saturating_add(1);
    let inner_width = grid_area.width.saturating_sub(2);
    let inner_height = grid_area.height.saturating_sub(2);
    let inner_right = inner_x.saturating_add(inner_width);
    let inner_bottom = inner_y.saturating_add(inner_height);

    if mouse_col < inner_x
        || mouse_col >= inner_right
        || mouse_row < inner_y
        || mouse_row >= inner_bottom
    {
        return None;
    }

    // Header row holds column names, not data cells.
    if inner_height <= 1 || mouse_row == inner_y {
        return None;
    }

    let rel_row = mouse_row.saturating_sub(inner_y.saturating_add(1)) as usize;
    if rel_row >= app.visible_rows {
        return None;
    }
    let row = app.viewport_row.saturating_add(rel_row);
    if row >= app.max_rows() {
        return None;
    }

    let row_header_end = inner_x.saturating_add(ROW_HEADER_WIDTH);
    if mouse_col < row_header_end {
        return None;
    }

    let mut x = row_header_end.saturating_add(GRID_COLUMN_SPACING);
    if mouse_col < x {
        return None;
    }

    for offset in 0..app.visible_cols {
        let col = app.viewport_col + offset;
        if col >= app.max_cols() {
            break;
        }

        let width = app.get_column_width(col) as u16;
        let cell_end = x.saturating_add(width);
        if mouse_col >= x && mouse_col < cell_end && mouse_col < inner_right {
            return Some((col, row));
        }

        x = cell_end.saturating_add(GRID_COLUMN_SPACING);
        if mouse_col < x || x >= inner_right {
            return None;
        }
    }

    None
}

/// Draw the application UI
pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = split_main_chunks(f.area());

    // Update visible dimensions based on actual size
    let grid_area = chunks[1];
    let available_width = grid_area.width.saturating_sub(ROW_HEADER_WIDTH + 2) as usize;
    let available_height = grid_area.height.saturating_sub(3) as usize; // header + borders

    app.visible_cols = (available_width / (app.col_width + 1)).max(1);
    app.visible_rows = available_height.max(1);
    app.update_viewport();

    draw_formula_bar(f, app, chunks[0]);
    draw_grid(f, app, chunks[1]);
    draw_status_bar(f, app, chunks[2]);

    if let Some(slot) = app.chart_modal {
        draw_chart_modal(f, app, slot);
    }

    if app.help_modal {
        draw_help_modal(f, app);
    }
}

fn rule_text(column: &ColumnDefinition) -> String {
    match column.rule() {
        Some(DerivationRule::Formula(formula)) => format!("={}", formula.source()),
        Some(DerivationRule::Native(rule)) => format!("<{}>", rule.name()),
        None => String::new(),
    }
}

fn draw_formula_bar(f: &mut Frame, app: &App, area: Rect) {
    let location = match app.current_column() {
        Some(column) => format!("Row {} {}", app.cursor_row + 1, column.field()),
        None => "(no columns)".to_string(),
    };

    let content = match app.mode {
        Mode::Edit => {
            // Insert cursor marker at cursor position
            let (before, after) = app.edit_buffer.split_at(app.edit_cursor);
            format!("{}: {}│{}", location, before, after)
        }
        Mode::Command => {
            let (before, after) = app.command_buffer.split_at(app.command_cursor);
            format!(":{}│{}", before, after)
        }
        Mode::Normal => match app.current_column() {
            Some(column) if column.is_computed() => format!(
                "{}: {}  {}",
                location,
                app.cell_display(app.cursor_row, app.cursor_col),
                rule_text(column)
            ),
            Some(_) if app.cursor_row < app.max_rows() => format!(
                "{}: {}",
                location,
                app.cell_display(app.cursor_row, app.cursor_col)
            ),
            _ => format!("{}: (no rows)", location),
        },
    };

    let title = match app.mode {
        Mode::Edit => " Edit ",
        Mode::Command => " Command ",
        Mode::Normal => " Cell ",
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(match app.mode {
            Mode::Edit => Color::Yellow,
            Mode::Command => Color::Cyan,
            Mode::Normal => Color::White,
        }));

    let paragraph = Paragraph::new(content).block(block);
    f.render_widget(paragraph, area);
}

/// Column header with chart membership markers.
fn header_label(app: &App, column: &ColumnDefinition) -> String {
    let mut label = column.header().to_string();
    if app.core.chart1.contains(column.field()) {
        label.push('¹');
    }
    if app.core.chart2.contains(column.field()) {
        label.push('²');
    }
    label
}

fn draw_grid(f: &mut Frame, app: &App, area: Rect) {
    let columns = app.core.schema().columns();
    let visible = app.viewport_col..(app.viewport_col + app.visible_cols).min(columns.len());

    let mut header_cells = vec![Cell::from(" ")]; // Corner
    for col in visible.clone() {
        let column = &columns[col];
        let style = if col == app.cursor_col {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else if column.is_computed() {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        header_cells.push(Cell::from(header_label(app, column)).style(style));
    }
    let header = Row::new(header_cells).height(1);

    let last_row = (app.viewport_row + app.visible_rows).min(app.max_rows());
    let mut rows = Vec::new();
    for row in app.viewport_row..last_row {
        let mut cells = Vec::new();

        let row_style = if row == app.cursor_row {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        cells.push(Cell::from(format!("{}", row + 1)).style(row_style));

        for col in visible.clone() {
            let display = app.cell_display(row, col);
            let is_cursor = row == app.cursor_row && col == app.cursor_col;
            let style = if is_cursor {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else if columns[col].is_computed() {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            };
            cells.push(Cell::from(display).style(style));
        }

        rows.push(Row::new(cells));
    }

    let mut widths = vec![Constraint::Length(ROW_HEADER_WIDTH)];
    for col in visible {
        widths.push(Constraint::Length(app.get_column_width(col) as u16));
    }

    let title = format!(" {} ", app.core.config.report_title);
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .column_spacing(GRID_COLUMN_SPACING);

    f.render_widget(table, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn draw_chart_modal(f: &mut Frame, app: &App, slot: ChartSlot) {
    let area = centered_rect(80, 70, f.area());
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);

    let modal_style = Style::default().fg(Color::White).bg(Color::Black);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", slot.title()))
        .border_style(Style::default().fg(Color::Cyan))
        .style(modal_style);

    // textplots uses a Braille canvas where one terminal character is 2x4 points.
    let plot_width_points = (inner_width as u32).saturating_mul(2);
    // Reserve lines for the legend and x labels.
    let plot_height_chars = inner_height.saturating_sub(3);
    let plot_height_points = (plot_height_chars as u32).saturating_mul(4);

    let content = if plot_width_points < 32 || plot_height_points < 3 {
        "Terminal too small for chart".to_string()
    } else {
        match app.core.plot_data(slot) {
            Some(data) => {
                let mut parts = vec![legend(&data)];
                parts.push(render_textplots(
                    &data,
                    plot_width_points,
                    plot_height_points,
                ));
                if let (Some(first), Some(last)) = (data.labels.first(), data.labels.last()) {
                    parts.push(format!("{} .. {}", first, last));
                }
                parts.join("\n")
            }
            None => "No data to plot".to_string(),
        }
    };

    let paragraph = Paragraph::new(content).block(block).style(modal_style);

    // Clear area behind modal so plot whitespace is visible.
    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

const SERIES_MARKERS: [&str; 6] = ["━", "┅", "┈", "═", "╍", "╌"];

fn legend(data: &PlotData) -> String {
    data.series
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{} {}", SERIES_MARKERS[i % SERIES_MARKERS.len()], s.label))
        .collect::<Vec<_>>()
        .join("   ")
}

/// Render plot data to a string using textplots.
///
/// This function isolates the textplots dependency; the PNG snapshot used in
/// reports is drawn separately by the core crate.
fn render_textplots(data: &PlotData, width: u32, height: u32) -> String {
    let (xmin, xmax) = data.x_range;
    let (ymin, ymax) = data.y_range;
    let span_x = xmax - xmin;
    let span_y = ymax - ymin;

    // Shift points so minimums map to 0 (textplots draws axes at x=0, y=0)
    let shifted: Vec<Vec<(f32, f32)>> = data
        .series
        .iter()
        .map(|s| s.points.iter().map(|(x, y)| (x - xmin, y - ymin)).collect())
        .collect();
    let shapes: Vec<Shape> = shifted.iter().map(|points| Shape::Lines(points)).collect();

    let mut chart = Chart::new_with_y_range(width, height, 0.0, span_x, 0.0, span_y);
    let mut chart = chart
        .x_label_format(LabelFormat::Custom(Box::new(move |v| {
            format!("{:.0}", v + xmin + 1.0)
        })))
        .y_label_format(LabelFormat::Custom(Box::new(move |v| {
            format!("{:.1}", v + ymin)
        })))
        .x_axis_style(LineStyle::Solid)
        .y_axis_style(LineStyle::Solid);
    for shape in &shapes {
        chart = chart.lineplot(shape);
    }
    chart.borders();
    chart.axis();
    chart.figures();
    chart.frame()
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let file_info = if let Some(ref path) = app.core.file_path {
        let modified_indicator = if app.core.modified { " [+]" } else { "" };
        format!("{}{}", path.display(), modified_indicator)
    } else if app.core.modified {
        "[New] [+]".to_string()
    } else {
        "[New]".to_string()
    };

    let status = if !app.status_message.is_empty() {
        app.status_message.clone()
    } else {
        format!(
            "{}  |  {} rows  |  {}",
            file_info,
            app.max_rows(),
            keymap::status_hint()
        )
    };

    let style = if app.status_message.starts_with("Error")
        || app.status_message.contains(" error:")
    {
        Style::default().fg(Color::Red)
    } else if !app.status_message.is_empty() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let paragraph = Paragraph::new(Line::from(vec![Span::styled(status, style)]));
    f.render_widget(paragraph, area);
}

fn section_style(text: &str, title: &str) -> Style {
    if text == title {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else if text.starts_with("  ") {
        Style::default().fg(Color::White)
    } else {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }
}

fn draw_help_modal(f: &mut Frame, app: &App) {
    let area = centered_rect(88, 88, f.area());

    let modal_style = Style::default().fg(Color::White).bg(Color::Black);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .border_style(Style::default().fg(Color::Green))
        .style(modal_style);

    let mut lines: Vec<Line> = Vec::new();
    for (section, title) in [
        (get_about_help(), "About thermogrid"),
        (get_help_text(), ""),
        (get_commands_help(), "Commands"),
    ] {
        if !lines.is_empty() {
            lines.push(Line::from(""));
        }
        for text in section {
            let style = section_style(&text, title);
            lines.push(Line::from(Span::styled(text, style)));
        }
    }

    let viewport_height = area.height.saturating_sub(2) as usize;
    let max_scroll = lines.len().saturating_sub(viewport_height);
    let effective_scroll = app.help_scroll.min(max_scroll);
    let scroll_y = u16::try_from(effective_scroll).unwrap_or(u16::MAX);

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(modal_style)
        .scroll((scroll_y, 0))
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{Terminal, backend::TestBackend};
    use thermogrid_core::{Config, Document};
    use thermogrid_engine::plot::Selection;

    fn app_with_rows(rows: usize) -> App {
        let mut app = App::new(Document::new(Config::default()).unwrap());
        for _ in 0..rows {
            app.core.append_row();
        }
        app
    }

    fn first_body_cell_point(grid_area: Rect) -> (u16, u16) {
        (
            grid_area.x + 1 + ROW_HEADER_WIDTH + GRID_COLUMN_SPACING,
            grid_area.y + 2,
        )
    }

    #[test]
    fn grid_cell_at_maps_first_visible_cell_to_viewport_origin() {
        let mut app = app_with_rows(10);
        app.viewport_col = 2;
        app.viewport_row = 7;
        app.visible_cols = 3;
        app.visible_rows = 3;

        let grid_area = Rect::new(0, 0, 80, 20);
        let (x, y) = first_body_cell_point(grid_area);

        assert_eq!(grid_cell_at(&app, grid_area, x, y), Some((2, 7)));
    }

    #[test]
    fn grid_cell_at_maps_second_column_with_custom_width() {
        let mut app = app_with_rows(3);
        app.visible_cols = 3;
        app.visible_rows = 3;
        app.column_widths.insert(0, 10);

        let grid_area = Rect::new(0, 0, 80, 20);
        let (first_x, y) = first_body_cell_point(grid_area);
        let second_col_start = first_x + 10 + GRID_COLUMN_SPACING;

        assert_eq!(
            grid_cell_at(&app, grid_area, second_col_start + 1, y),
            Some((1, 0))
        );
    }

    #[test]
    fn grid_cell_at_ignores_headers_and_missing_rows() {
        let mut app = app_with_rows(1);
        app.visible_cols = 4;
        app.visible_rows = 4;

        let grid_area = Rect::new(0, 0, 80, 20);
        let (x, y) = first_body_cell_point(grid_area);
        assert_eq!(grid_cell_at(&app, grid_area, grid_area.x + 2, y), None);
        assert_eq!(grid_cell_at(&app, grid_area, x, grid_area.y + 1), None);
        assert_eq!(grid_cell_at(&app, grid_area, x, y + 1), None);
    }

    #[test]
    fn header_label_marks_chart_membership() {
        let mut app = app_with_rows(0);
        app.core
            .set_selection(ChartSlot::Second, Selection::parse_list("thermocouple1_bottom"))
            .unwrap();
        let column = app.core.schema().columns()[0].clone();
        assert!(header_label(&app, &column).ends_with('²'));
    }

    #[test]
    fn draw_renders_grid_and_chart_modal() {
        let mut app = app_with_rows(3);
        app.core
            .set_selection(
                ChartSlot::First,
                Selection::parse_list("thermocouple1_bottom,temperature_differential"),
            )
            .unwrap();
        app.open_chart_modal(ChartSlot::First);
        app.help_modal = true;

        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();
        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Help"));
    }
}
