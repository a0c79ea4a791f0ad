//! Built-in column layouts.

use crate::engine::Formula;
use crate::error::Result;
use crate::schema::{ColumnDefinition, ColumnFormat, Schema};

pub const DIFFERENTIAL_FIELD: &str = "temperature_differential";
pub const DIFFERENTIAL_FORMULA: &str = "ABS({thermocouple2_middle} - {thermocouple3_top})";
pub const TOTAL_FIELD: &str = "total";
pub const TOTAL_FORMULA: &str = "{quantity} * {price}";

const THERMOCOUPLES: [(&str, &str); 5] = [
    ("thermocouple1_bottom", "Thermocouple 1 (Bottom)"),
    ("thermocouple2_middle", "Thermocouple 2 (Middle)"),
    ("thermocouple3_top", "Thermocouple 3 (Top)"),
    ("thermocouple1_standby1", "Thermocouple 4 (Standby 1)"),
    ("thermocouple1_standby2", "Thermocouple 5 (Standby 2)"),
];

/// The temperature-monitoring layout a new session starts with: five
/// thermocouple readings and the middle/top differential.
pub fn temperature_monitoring() -> Result<Schema> {
    let mut columns: Vec<_> = THERMOCOUPLES
        .iter()
        .map(|(field, header)| ColumnDefinition::numeric(*field, *header))
        .collect();
    columns.push(differential_column()?);
    Schema::replace_all(columns)
}

pub fn differential_column() -> Result<ColumnDefinition> {
    let formula = Formula::compile(DIFFERENTIAL_FORMULA)?;
    Ok(
        ColumnDefinition::formula(DIFFERENTIAL_FIELD, "Temperature Differential 1", formula)
            .with_format(ColumnFormat::Fixed2),
    )
}

/// Order total appended to imported sheets that carry `quantity` and `price`.
pub fn total_column() -> Result<ColumnDefinition> {
    Ok(
        ColumnDefinition::formula(TOTAL_FIELD, "Total", Formula::compile(TOTAL_FORMULA)?)
            .with_format(ColumnFormat::Currency),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::engine::format_value;
    use crate::value::{Record, Value};

    #[test]
    fn test_layout() {
        let schema = temperature_monitoring().unwrap();
        assert_eq!(schema.len(), 6);
        assert_eq!(schema.computed_columns().count(), 1);
        assert_eq!(schema.first_raw_column().unwrap().field(), "thermocouple1_bottom");
    }

    #[test]
    fn test_differential_scenario() {
        let ds = Dataset::new(temperature_monitoring().unwrap()).append_row(
            Record::new()
                .with("thermocouple2_middle", "36.5")
                .with("thermocouple3_top", "34.0"),
        );
        let value = ds.cell(0, DIFFERENTIAL_FIELD).unwrap();
        assert_eq!(value, &Value::Number(2.5));
        let column = ds.schema().get(DIFFERENTIAL_FIELD).unwrap();
        assert_eq!(format_value(value, column.format()), "2.50");
    }

    #[test]
    fn test_differential_is_absolute() {
        let ds = Dataset::new(temperature_monitoring().unwrap()).append_row(
            Record::new()
                .with("thermocouple2_middle", 30.0)
                .with("thermocouple3_top", 34.0),
        );
        assert_eq!(ds.cell(0, DIFFERENTIAL_FIELD), Some(&Value::Number(4.0)));
    }
}
