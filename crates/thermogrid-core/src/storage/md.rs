//! Markdown export functionality

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

use thermogrid_engine::Dataset;
use thermogrid_engine::engine::format_value;
use thermogrid_engine::plot::PlotData;

use super::{ReportOptions, write_report};
use crate::error::Result;

const MARKERS: [char; 4] = ['*', '+', 'o', 'x'];

/// Write the dataset, chunked into tables, plus ASCII renderings of the
/// given charts.
pub fn write_markdown(
    path: &Path,
    dataset: &Dataset,
    charts: &[(String, PlotData)],
    options: &ReportOptions,
) -> Result<()> {
    let text = render_markdown(dataset, charts, options);
    write_report(path, |file| Ok(file.write_all(text.as_bytes())?))?;
    log::info!("wrote markdown {}", path.display());
    Ok(())
}

pub fn render_markdown(
    dataset: &Dataset,
    charts: &[(String, PlotData)],
    options: &ReportOptions,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}", options.title);
    let _ = writeln!(out);

    if dataset.schema().is_empty() {
        let _ = writeln!(out, "*Empty dataset*");
    }

    for (i, group) in dataset.schema().chunks(options.chunk_size).enumerate() {
        if i > 0 {
            let _ = writeln!(out);
        }
        out.push('|');
        for column in group {
            let _ = write!(out, " {} |", escape_markdown(column.header()));
        }
        out.push_str("\n|");
        for _ in group {
            out.push_str("---|");
        }
        out.push('\n');

        for row in dataset.rows().iter() {
            out.push('|');
            for column in group {
                let text = row
                    .get(column.field())
                    .map(|v| format_value(v, column.format()))
                    .unwrap_or_default();
                let _ = write!(out, " {} |", escape_markdown(&text));
            }
            out.push('\n');
        }
    }

    for (title, data) in charts {
        let _ = writeln!(out);
        let _ = writeln!(out, "## {}", title);
        let _ = writeln!(out);
        let _ = writeln!(out, "```");
        render_line_chart(&mut out, data);
        let _ = writeln!(out, "```");
        for (i, series) in data.series.iter().enumerate() {
            let _ = writeln!(out, "- `{}` {}", MARKERS[i % MARKERS.len()], series.label);
        }
    }

    out
}

/// Escape special markdown characters in cell content
fn escape_markdown(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ").replace('\r', "")
}

/// Render a simple ASCII line chart, one marker per series
fn render_line_chart(w: &mut String, data: &PlotData) {
    let height = 10;
    let width = data.labels.len().min(60);
    let (y_min, y_max) = data.y_range;
    let y_range = y_max - y_min;

    let mut grid = vec![vec![' '; width]; height];
    for (i, series) in data.series.iter().enumerate() {
        let marker = MARKERS[i % MARKERS.len()];
        for (x, (_, y)) in series.points.iter().take(width).enumerate() {
            let row = if y_range > 0.0 {
                (((y - y_min) / y_range) * (height - 1) as f32).round() as usize
            } else {
                height / 2
            };
            if row < height {
                grid[row][x] = marker;
            }
        }
    }

    for row in (0..height).rev() {
        let y_val = y_min + (row as f32 / (height - 1) as f32) * y_range;
        let _ = write!(w, "{:>6.1} |", y_val);
        let line: String = grid[row].iter().collect();
        let _ = writeln!(w, "{}", line);
    }

    let _ = writeln!(w, "       +{}", "-".repeat(width));
    if let (Some(first), Some(last)) = (data.labels.first(), data.labels.get(width.saturating_sub(1))) {
        let _ = writeln!(w, "        {:<20}{:>20}", first, last);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use thermogrid_engine::plot::{LabelRule, Selection};
    use thermogrid_engine::{ColumnDefinition, ColumnFormat, Record, Schema};

    fn dataset() -> Dataset {
        let schema = Schema::replace_all(vec![
            ColumnDefinition::text("item", "Item"),
            ColumnDefinition::numeric("price", "Price").with_format(ColumnFormat::Currency),
        ])
        .unwrap();
        Dataset::replace_all(
            schema,
            vec![
                Record::new().with("item", "a|b").with("price", 2.5),
                Record::new().with("item", "c").with("price", 4.0),
            ],
        )
    }

    #[test]
    fn test_render_tables() {
        let md = render_markdown(&dataset(), &[], &ReportOptions::default());
        let expected = "# Temperature Monitoring\n\
                        \n\
                        | Item | Price |\n\
                        |---|---|\n\
                        | a\\|b | $2.50 |\n\
                        | c | $4.00 |\n";
        assert_eq!(md, expected);
    }

    #[test]
    fn test_chunked_tables() {
        let options = ReportOptions {
            chunk_size: 1,
            ..ReportOptions::default()
        };
        let md = render_markdown(&dataset(), &[], &options);
        assert_eq!(md.matches("|---|\n").count(), 2);
    }

    #[test]
    fn test_chart_section() {
        let ds = dataset();
        let data =
            PlotData::project(&ds, &Selection::from_fields(["price"]), LabelRule::Row).unwrap();
        let md = render_markdown(&ds, &[("Chart 1".to_string(), data)], &ReportOptions::default());
        assert!(md.contains("## Chart 1"));
        assert!(md.contains("- `*` Price"));
        assert!(md.contains("Row 1"));
    }
}
