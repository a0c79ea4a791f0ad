//! Chart projection.
//!
//! This module provides:
//! - [`Selection`]: Ordered set of column keys plotted in one chart slot
//! - [`LabelRule`]: How each point is named on the x axis
//! - [`project`]: Dataset + selection to one [`ChartPoint`] per row
//! - [`PlotData`]: Prepared series and axis ranges for renderers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::dataset::Dataset;
use crate::engine::evaluate_column;
use crate::schema::Schema;
use crate::value::{Record, Value};

/// Ordered set of column keys selected for one chart.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    fields: Vec<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list of keys, dropping repeats while keeping first order.
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selection = Selection::new();
        for field in fields {
            let field = field.into();
            if !selection.contains(&field) {
                selection.fields.push(field);
            }
        }
        selection
    }

    /// Parse a comma-separated list such as `"a, b,c"`.
    pub fn parse_list(s: &str) -> Self {
        Self::from_fields(s.split(',').map(str::trim).filter(|f| !f.is_empty()))
    }

    /// Add the key if absent, remove it if present.
    pub fn toggle(&mut self, field: &str) {
        match self.fields.iter().position(|f| f == field) {
            Some(i) => {
                self.fields.remove(i);
            }
            None => self.fields.push(field.to_string()),
        }
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Keys not present in `schema`.
    pub fn unknown_fields<'a>(&'a self, schema: &Schema) -> Vec<&'a str> {
        self.fields
            .iter()
            .filter(|f| !schema.contains(f))
            .map(String::as_str)
            .collect()
    }
}

/// Naming rule for chart points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelRule {
    /// `Row N`, 1-based.
    #[default]
    #[serde(rename = "row")]
    Row,
    /// `Day N` when the first raw column holds an integer, else blank.
    /// The two schemes are never mixed in one chart.
    #[serde(rename = "day")]
    DayFromFirstColumn,
}

impl LabelRule {
    fn label(self, schema: &Schema, index: usize, record: &Record) -> String {
        match self {
            LabelRule::Row => format!("Row {}", index + 1),
            LabelRule::DayFromFirstColumn => schema
                .first_raw_column()
                .and_then(|c| record.get(c.field()))
                .and_then(as_integer)
                .map(|day| format!("Day {}", day))
                .unwrap_or_default(),
        }
    }
}

impl FromStr for LabelRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "row" => Ok(LabelRule::Row),
            "day" => Ok(LabelRule::DayFromFirstColumn),
            other => Err(format!("unknown label rule '{}'", other)),
        }
    }
}

impl fmt::Display for LabelRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LabelRule::Row => "row",
            LabelRule::DayFromFirstColumn => "day",
        })
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(*n as i64),
        Value::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// One chart point: a label plus a finite value per selected key.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartPoint {
    pub name: String,
    pub values: Vec<(String, f64)>,
}

impl ChartPoint {
    pub fn value(&self, field: &str) -> Option<f64> {
        self.values.iter().find(|(f, _)| f == field).map(|(_, v)| *v)
    }
}

/// Project the dataset onto the selected columns.
///
/// Produces exactly one point per row in row order, or nothing for an empty
/// selection. Missing and non-numeric values read as zero; a computed value
/// absent from a record is derived on the fly.
pub fn project(dataset: &Dataset, selection: &Selection, rule: LabelRule) -> Vec<ChartPoint> {
    if selection.is_empty() {
        return Vec::new();
    }
    let schema = dataset.schema();
    dataset
        .rows()
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let values = selection
                .fields()
                .iter()
                .map(|field| (field.clone(), read_value(schema, record, field)))
                .collect();
            ChartPoint {
                name: rule.label(schema, index, record),
                values,
            }
        })
        .collect()
}

fn read_value(schema: &Schema, record: &Record, field: &str) -> f64 {
    let value = match (record.get(field), schema.get(field)) {
        (Some(v), _) => v.to_number_or_zero(),
        (None, Some(column)) if column.is_computed() => {
            evaluate_column(column, record).to_number_or_zero()
        }
        _ => 0.0,
    };
    if value.is_finite() { value } else { 0.0 }
}

/// One line of a chart.
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub field: String,
    pub label: String,
    /// (x, y) pairs, x being the row ordinal.
    pub points: Vec<(f32, f32)>,
}

/// Prepared data for rendering a chart (frontend-agnostic).
///
/// Shared by the PNG rasterizer and the terminal preview.
#[derive(Clone, Debug)]
pub struct PlotData {
    pub series: Vec<Series>,
    /// Point names in x order.
    pub labels: Vec<String>,
    /// X-axis range (min, max).
    pub x_range: (f32, f32),
    /// Y-axis range (min, max).
    pub y_range: (f32, f32),
}

impl PlotData {
    /// Build plot data from projected points. Returns `None` when there is
    /// nothing to draw.
    pub fn from_points(points: &[ChartPoint], schema: &Schema) -> Option<Self> {
        let first = points.first()?;
        if first.values.is_empty() {
            return None;
        }

        let series: Vec<Series> = first
            .values
            .iter()
            .map(|(field, _)| Series {
                field: field.clone(),
                label: schema
                    .get(field)
                    .map(|c| c.header().to_string())
                    .unwrap_or_else(|| field.clone()),
                points: points
                    .iter()
                    .enumerate()
                    .map(|(i, p)| (i as f32, p.value(field).unwrap_or(0.0) as f32))
                    .collect(),
            })
            .collect();

        let (mut ymin, mut ymax) = (f32::INFINITY, f32::NEG_INFINITY);
        for (_, y) in series.iter().flat_map(|s| s.points.iter()) {
            ymin = ymin.min(*y);
            ymax = ymax.max(*y);
        }

        let xmin = 0.0;
        let mut xmax = (points.len() - 1) as f32;

        // Ensure non-zero ranges
        if xmax == xmin {
            xmax = xmin + 1.0;
        }
        if ymax == ymin {
            ymax = ymin + 1.0;
        }

        Some(PlotData {
            series,
            labels: points.iter().map(|p| p.name.clone()).collect(),
            x_range: (xmin, xmax),
            y_range: (ymin, ymax),
        })
    }

    pub fn project(dataset: &Dataset, selection: &Selection, rule: LabelRule) -> Option<Self> {
        Self::from_points(&project(dataset, selection, rule), dataset.schema())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Formula;
    use crate::schema::ColumnDefinition;
    use pretty_assertions::assert_eq;

    fn dataset() -> Dataset {
        let schema = Schema::replace_all(vec![
            ColumnDefinition::text("day", "Day"),
            ColumnDefinition::numeric("t1", "T1"),
            ColumnDefinition::formula("half", "Half", Formula::compile("{t1} / 2").unwrap()),
        ])
        .unwrap();
        Dataset::replace_all(
            schema,
            vec![
                Record::new().with("day", "1").with("t1", 10.0),
                Record::new().with("day", "2").with("t1", "n/a"),
                Record::new().with("day", "late").with("t1", f64::NAN),
            ],
        )
    }

    #[test]
    fn test_empty_selection_projects_nothing() {
        assert!(project(&dataset(), &Selection::new(), LabelRule::Row).is_empty());
    }

    #[test]
    fn test_one_finite_point_per_row() {
        let selection = Selection::parse_list("t1, half, missing");
        let points = project(&dataset(), &selection, LabelRule::Row);
        assert_eq!(points.len(), 3);
        for point in &points {
            assert_eq!(point.values.len(), 3);
            assert!(point.values.iter().all(|(_, v)| v.is_finite()));
        }
        assert_eq!(points[0].value("half"), Some(5.0));
        assert_eq!(points[1].value("t1"), Some(0.0));
        assert_eq!(points[2].value("t1"), Some(0.0));
        assert_eq!(points[0].value("missing"), Some(0.0));
    }

    #[test]
    fn test_labels() {
        let selection = Selection::from_fields(["t1"]);
        let names: Vec<_> = project(&dataset(), &selection, LabelRule::Row)
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Row 1", "Row 2", "Row 3"]);

        let names: Vec<_> = project(&dataset(), &selection, LabelRule::DayFromFirstColumn)
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Day 1", "Day 2", ""]);
    }

    #[test]
    fn test_missing_computed_value_derived() {
        let ds = dataset();
        let record = Record::new().with("t1", 10.0);
        assert_eq!(read_value(ds.schema(), &record, "half"), 5.0);
        assert_eq!(read_value(ds.schema(), &record, "nope"), 0.0);
    }

    #[test]
    fn test_selection_toggle_and_dedup() {
        let mut selection = Selection::from_fields(["a", "b", "a"]);
        assert_eq!(selection.fields(), &["a", "b"]);
        selection.toggle("a");
        selection.toggle("c");
        assert_eq!(selection.fields(), &["b", "c"]);
    }

    #[test]
    fn test_plot_data_ranges() {
        let data = PlotData::project(&dataset(), &Selection::from_fields(["t1"]), LabelRule::Row)
            .unwrap();
        assert_eq!(data.series.len(), 1);
        assert_eq!(data.series[0].label, "T1");
        assert_eq!(data.x_range, (0.0, 2.0));
        assert_eq!(data.y_range, (0.0, 10.0));
        assert!(PlotData::project(&dataset(), &Selection::new(), LabelRule::Row).is_none());
    }

    #[test]
    fn test_label_rule_parse() {
        assert_eq!("day".parse::<LabelRule>(), Ok(LabelRule::DayFromFirstColumn));
        assert_eq!("Row".parse::<LabelRule>(), Ok(LabelRule::Row));
        assert!("week".parse::<LabelRule>().is_err());
    }
}
