use crate::schema::ColumnFormat;
use crate::value::Value;

/// Format a number for display.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "#NAN!".to_string()
    } else if n.is_infinite() {
        "#INF!".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e10 {
        format!("{:.0}", n)
    } else {
        format!("{:.2}", n)
    }
}

/// Format a cell value according to its column's display format.
///
/// Fixed and currency formats apply to anything that reads as a number;
/// other values fall back to their plain display.
pub fn format_value(value: &Value, format: ColumnFormat) -> String {
    let number = match value {
        Value::Date(_) => None,
        other => other.as_number(),
    };
    match (format, number) {
        (ColumnFormat::Fixed2, Some(n)) => format!("{:.2}", n),
        (ColumnFormat::Currency, Some(n)) if n < 0.0 => format!("-${:.2}", -n),
        (ColumnFormat::Currency, Some(n)) => format!("${:.2}", n),
        _ => value.to_string(),
    }
}
