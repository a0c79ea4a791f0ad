//! Column definitions and the ordered schema registry.
//!
//! A [`Schema`] is an immutable, ordered list of [`ColumnDefinition`]s with
//! unique keys. Every mutation returns a new schema; a failed mutation leaves
//! the receiver untouched.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::engine::{DerivationRule, Formula, NativeRule, detect_cycle};
use crate::error::{EngineError, Result};
use crate::value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Numeric,
    Date,
    Computed,
}

impl ColumnKind {
    /// Wire tag. Computed columns travel as numeric columns with a formula.
    pub fn as_tag(self) -> &'static str {
        match self {
            ColumnKind::Text => "textColumn",
            ColumnKind::Numeric | ColumnKind::Computed => "numericColumn",
            ColumnKind::Date => "dateColumn",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "textColumn" | "text" => Ok(ColumnKind::Text),
            "numericColumn" | "numeric" | "num" => Ok(ColumnKind::Numeric),
            "dateColumn" | "date" => Ok(ColumnKind::Date),
            other => Err(EngineError::UnknownColumnType(other.to_string())),
        }
    }

    /// Value a raw column of this kind starts with.
    pub fn default_value(self) -> Value {
        match self {
            ColumnKind::Numeric | ColumnKind::Computed => Value::Number(0.0),
            ColumnKind::Text | ColumnKind::Date => Value::empty(),
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Numeric | ColumnKind::Computed)
    }
}

/// Display format applied when a cell is rendered or exported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnFormat {
    #[default]
    Plain,
    Fixed2,
    Currency,
}

impl ColumnFormat {
    /// Default format for well-known money fields.
    pub fn for_field(field: &str) -> ColumnFormat {
        match field {
            "price" | "total" => ColumnFormat::Currency,
            _ => ColumnFormat::Plain,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ColumnDefinition {
    field: String,
    header: String,
    kind: ColumnKind,
    format: ColumnFormat,
    rule: Option<DerivationRule>,
}

impl ColumnDefinition {
    fn raw(field: impl Into<String>, header: impl Into<String>, kind: ColumnKind) -> Self {
        ColumnDefinition {
            field: field.into(),
            header: header.into(),
            kind,
            format: ColumnFormat::Plain,
            rule: None,
        }
    }

    pub fn text(field: impl Into<String>, header: impl Into<String>) -> Self {
        Self::raw(field, header, ColumnKind::Text)
    }

    pub fn numeric(field: impl Into<String>, header: impl Into<String>) -> Self {
        Self::raw(field, header, ColumnKind::Numeric)
    }

    pub fn date(field: impl Into<String>, header: impl Into<String>) -> Self {
        Self::raw(field, header, ColumnKind::Date)
    }

    pub fn formula(field: impl Into<String>, header: impl Into<String>, formula: Formula) -> Self {
        ColumnDefinition {
            rule: Some(DerivationRule::Formula(formula)),
            ..Self::raw(field, header, ColumnKind::Computed)
        }
    }

    pub fn native(field: impl Into<String>, header: impl Into<String>, rule: NativeRule) -> Self {
        ColumnDefinition {
            rule: Some(DerivationRule::Native(rule)),
            ..Self::raw(field, header, ColumnKind::Computed)
        }
    }

    pub fn with_format(mut self, format: ColumnFormat) -> Self {
        self.format = format;
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn format(&self) -> ColumnFormat {
        self.format
    }

    pub fn rule(&self) -> Option<&DerivationRule> {
        self.rule.as_ref()
    }

    pub fn is_computed(&self) -> bool {
        self.rule.is_some()
    }

    pub fn editable(&self) -> bool {
        !self.is_computed()
    }

    /// Fields the column's rule reads; empty for raw columns.
    pub fn references(&self) -> &[String] {
        self.rule.as_ref().map(DerivationRule::references).unwrap_or(&[])
    }

    pub fn to_spec(&self) -> ColumnSpec {
        ColumnSpec {
            field: self.field.clone(),
            header_name: self.header.clone(),
            editable: self.editable(),
            kind: self.kind.as_tag().to_string(),
            formula: self
                .rule
                .as_ref()
                .and_then(DerivationRule::formula)
                .map(|f| f.source().to_string()),
            format: (self.format != ColumnFormat::Plain).then_some(self.format),
        }
    }

    /// Rebuild a definition from its wire form.
    ///
    /// A spec carrying a formula becomes a computed column; anything else is
    /// raw and editable regardless of the `editable` flag.
    pub fn from_spec(spec: &ColumnSpec) -> Result<Self> {
        let header = if spec.header_name.is_empty() {
            spec.field.clone()
        } else {
            spec.header_name.clone()
        };
        let column = match spec.formula.as_deref().map(str::trim) {
            Some(source) if !source.is_empty() => {
                ColumnDefinition::formula(&spec.field, header, Formula::compile(source)?)
            }
            _ => Self::raw(&spec.field, header, ColumnKind::from_tag(&spec.kind)?),
        };
        Ok(column.with_format(spec.format.unwrap_or_default()))
    }
}

/// Serialized column definition, shaped like the grid column definitions the
/// backend stores.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSpec {
    pub field: String,
    #[serde(default)]
    pub header_name: String,
    #[serde(default = "default_editable")]
    pub editable: bool,
    #[serde(rename = "type", default = "default_kind_tag")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ColumnFormat>,
}

fn default_editable() -> bool {
    true
}

fn default_kind_tag() -> String {
    ColumnKind::Text.as_tag().to_string()
}

/// Ordered column registry with unique keys.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    columns: Vec<ColumnDefinition>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a schema from a full column list.
    pub fn replace_all(columns: Vec<ColumnDefinition>) -> Result<Schema> {
        validate(&columns)?;
        Ok(Schema { columns })
    }

    /// Replace every definition after a reorder or edit of the columns.
    pub fn update_all(&self, columns: Vec<ColumnDefinition>) -> Result<Schema> {
        Self::replace_all(columns)
    }

    /// Append a column, rejecting duplicate or empty keys and reference cycles.
    pub fn add_column(&self, column: ColumnDefinition) -> Result<Schema> {
        if column.field().trim().is_empty() {
            return Err(EngineError::EmptyField);
        }
        if self.contains(column.field()) {
            return Err(EngineError::DuplicateField(column.field().to_string()));
        }
        if column.references().iter().any(|r| r == column.field()) {
            let key = column.field().to_string();
            return Err(EngineError::CircularReference(vec![key.clone(), key]));
        }
        let mut columns = self.columns.clone();
        columns.push(column);
        if let Some(path) = detect_cycle(&columns) {
            return Err(EngineError::CircularReference(path));
        }
        Ok(Schema { columns })
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn computed_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(|c| c.is_computed())
    }

    /// Columns offered for charting: numeric and computed.
    pub fn numeric_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(|c| c.kind().is_numeric())
    }

    pub fn first_raw_column(&self) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| !c.is_computed())
    }

    pub fn get(&self, field: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.field() == field)
    }

    pub fn index_of(&self, field: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.field() == field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.index_of(field).is_some()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn to_specs(&self) -> Vec<ColumnSpec> {
        self.columns.iter().map(ColumnDefinition::to_spec).collect()
    }

    pub fn from_specs(specs: &[ColumnSpec]) -> Result<Schema> {
        let columns = specs
            .iter()
            .map(ColumnDefinition::from_spec)
            .collect::<Result<Vec<_>>>()?;
        Self::replace_all(columns)
    }

    /// Split the columns into consecutive groups of at most `size`.
    pub fn chunks(&self, size: usize) -> impl Iterator<Item = &[ColumnDefinition]> {
        self.columns.chunks(size.max(1))
    }
}

fn validate(columns: &[ColumnDefinition]) -> Result<()> {
    let mut seen = HashSet::new();
    for column in columns {
        if column.field().trim().is_empty() {
            return Err(EngineError::EmptyField);
        }
        if !seen.insert(column.field()) {
            return Err(EngineError::DuplicateField(column.field().to_string()));
        }
    }
    if let Some(path) = detect_cycle(columns) {
        return Err(EngineError::CircularReference(path));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn base() -> Schema {
        Schema::replace_all(vec![
            ColumnDefinition::text("name", "Name"),
            ColumnDefinition::numeric("qty", "Qty"),
        ])
        .unwrap()
    }

    fn fields(schema: &Schema) -> Vec<&str> {
        schema.columns().iter().map(|c| c.field()).collect()
    }

    #[test]
    fn test_add_column_appends() {
        let schema = base()
            .add_column(ColumnDefinition::date("when", "When"))
            .unwrap();
        assert_eq!(fields(&schema), vec!["name", "qty", "when"]);
        assert_eq!(schema.index_of("when"), Some(2));
    }

    #[test]
    fn test_duplicate_field_rejected_registry_unchanged() {
        let schema = base();
        let err = schema
            .add_column(ColumnDefinition::numeric("qty", "Another"))
            .unwrap_err();
        assert_eq!(err, EngineError::DuplicateField("qty".into()));
        assert_eq!(fields(&schema), vec!["name", "qty"]);
        assert_eq!(schema.get("qty").unwrap().header(), "Qty");
    }

    #[test]
    fn test_empty_field_rejected() {
        let err = base()
            .add_column(ColumnDefinition::text("  ", "Blank"))
            .unwrap_err();
        assert_eq!(err, EngineError::EmptyField);
    }

    #[test]
    fn test_self_reference_rejected() {
        let col = ColumnDefinition::formula("x", "X", Formula::compile("{x} + 1").unwrap());
        assert!(matches!(
            base().add_column(col),
            Err(EngineError::CircularReference(_))
        ));
    }

    #[test]
    fn test_add_column_rejects_mutual_reference() {
        let b = ColumnDefinition::formula("b", "B", Formula::compile("{c} + 1").unwrap());
        let c = ColumnDefinition::formula("c", "C", Formula::compile("{b} + 1").unwrap());
        let schema = base().add_column(b).unwrap();
        assert!(matches!(
            schema.add_column(c),
            Err(EngineError::CircularReference(_))
        ));
        assert_eq!(fields(&schema), vec!["name", "qty", "b"]);
        assert!(schema.update_all(schema.columns().to_vec()).is_ok());
    }

    #[test]
    fn test_update_all_rejects_cycles_and_duplicates() {
        let a = ColumnDefinition::formula("a", "A", Formula::compile("{b}").unwrap());
        let b = ColumnDefinition::formula("b", "B", Formula::compile("{a}").unwrap());
        assert!(matches!(
            base().update_all(vec![a, b]),
            Err(EngineError::CircularReference(_))
        ));
        let dup = vec![
            ColumnDefinition::text("x", "X"),
            ColumnDefinition::numeric("x", "X2"),
        ];
        assert_eq!(
            base().update_all(dup).unwrap_err(),
            EngineError::DuplicateField("x".into())
        );
    }

    #[test]
    fn test_computed_and_numeric_columns() {
        let schema = base()
            .add_column(ColumnDefinition::formula(
                "double",
                "Double",
                Formula::compile("{qty} * 2").unwrap(),
            ))
            .unwrap();
        let computed: Vec<_> = schema.computed_columns().map(|c| c.field()).collect();
        assert_eq!(computed, vec!["double"]);
        let numeric: Vec<_> = schema.numeric_columns().map(|c| c.field()).collect();
        assert_eq!(numeric, vec!["qty", "double"]);
        assert_eq!(schema.first_raw_column().unwrap().field(), "name");
        assert!(!schema.get("double").unwrap().editable());
    }

    #[test]
    fn test_chunks_of_seven() {
        let columns = (0..10)
            .map(|i| ColumnDefinition::numeric(format!("c{i}"), format!("C{i}")))
            .collect();
        let schema = Schema::replace_all(columns).unwrap();
        let sizes: Vec<_> = schema.chunks(7).map(<[_]>::len).collect();
        assert_eq!(sizes, vec![7, 3]);
        let first_of_second = schema.chunks(7).nth(1).unwrap()[0].field().to_string();
        assert_eq!(first_of_second, "c7");
    }

    #[test]
    fn test_spec_json_shape() {
        let col = ColumnDefinition::formula(
            "total",
            "Total",
            Formula::compile("{quantity} * {price}").unwrap(),
        )
        .with_format(ColumnFormat::Currency);
        let json = serde_json::to_value(col.to_spec()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "field": "total",
                "headerName": "Total",
                "editable": false,
                "type": "numericColumn",
                "formula": "{quantity} * {price}",
                "format": "currency",
            })
        );
    }

    #[test]
    fn test_from_spec_backend_column() {
        let spec: ColumnSpec = serde_json::from_value(serde_json::json!({
            "field": "thermocouple1_bottom",
            "headerName": "Thermocouple 1 (Bottom)",
            "editable": true,
            "type": "textColumn",
            "headerTooltip": "Field: thermocouple1_bottom",
        }))
        .unwrap();
        let col = ColumnDefinition::from_spec(&spec).unwrap();
        assert_eq!(col.kind(), ColumnKind::Text);
        assert_eq!(col.header(), "Thermocouple 1 (Bottom)");
        assert!(col.editable());
    }

    #[test]
    fn test_from_spec_unknown_type() {
        let spec = ColumnSpec {
            field: "x".into(),
            header_name: "X".into(),
            editable: true,
            kind: "pieColumn".into(),
            formula: None,
            format: None,
        };
        assert_eq!(
            ColumnDefinition::from_spec(&spec).unwrap_err(),
            EngineError::UnknownColumnType("pieColumn".into())
        );
    }
}
