//! Cell values and records.
//!
//! A [`Record`] maps column keys to [`Value`]s. Values keep whatever shape the
//! data arrived in (an imported sheet may hold `"36.5"` as text); numeric
//! contexts coerce leniently through [`Value::as_number`].

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use crate::engine::format_number;

/// A single cell value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Value {
        Value::Text(s.into())
    }

    pub fn empty() -> Value {
        Value::Text(String::new())
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Value::Text(s) if s.trim().is_empty())
    }

    /// Lenient numeric reading.
    ///
    /// Numbers are returned as-is, text is read by its longest leading decimal
    /// prefix (`"36.5 C"` reads as `36.5`), dates are not numbers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => parse_leading_float(s),
            Value::Date(_) => None,
        }
    }

    /// Numeric reading with the zero fallback used by formulas and charts.
    pub fn to_number_or_zero(&self) -> f64 {
        self.as_number().filter(|n| n.is_finite()).unwrap_or(0.0)
    }

    /// Convert an arbitrary JSON value received from a backend.
    ///
    /// `null` becomes an empty string; booleans and nested structures are
    /// kept as their text form.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::empty(),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(Value::Number)
                .unwrap_or_else(|| Value::Text(n.to_string())),
            serde_json::Value::String(s) => match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                Ok(d) => Value::Date(d),
                Err(_) => Value::Text(s.clone()),
            },
            serde_json::Value::Bool(b) => Value::Text(b.to_string()),
            other => Value::Text(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

fn leading_float_re() -> &'static Regex {
    static FLOAT_RE: OnceLock<Regex> = OnceLock::new();
    FLOAT_RE.get_or_init(|| {
        Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?")
            .expect("leading float regex must compile")
    })
}

/// Parse the longest decimal prefix of `s`, ignoring leading whitespace.
pub fn parse_leading_float(s: &str) -> Option<f64> {
    let m = leading_float_re().find(s.trim_start())?;
    m.as_str().parse::<f64>().ok()
}

/// One data row: column key to value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Numeric value of a field, zero when missing or non-numeric.
    pub fn number(&self, field: &str) -> f64 {
        self.get(field).map(Value::to_number_or_zero).unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Record(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, Value>> for Record {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Record(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_leading_float() {
        assert_eq!(parse_leading_float("36.5"), Some(36.5));
        assert_eq!(parse_leading_float("  -2.5e1abc"), Some(-25.0));
        assert_eq!(parse_leading_float(".5"), Some(0.5));
        assert_eq!(parse_leading_float("12 C"), Some(12.0));
        assert_eq!(parse_leading_float("abc"), None);
        assert_eq!(parse_leading_float(""), None);
        assert_eq!(parse_leading_float("-"), None);
    }

    #[test]
    fn test_to_number_or_zero() {
        assert_eq!(Value::text("34.0").to_number_or_zero(), 34.0);
        assert_eq!(Value::text("n/a").to_number_or_zero(), 0.0);
        assert_eq!(Value::Number(f64::NAN).to_number_or_zero(), 0.0);
        let d = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(Value::Date(d).to_number_or_zero(), 0.0);
    }

    #[test]
    fn test_from_json() {
        assert_eq!(Value::from_json(&serde_json::json!(null)), Value::empty());
        assert_eq!(Value::from_json(&serde_json::json!(2.5)), Value::Number(2.5));
        assert_eq!(Value::from_json(&serde_json::json!("x")), Value::text("x"));
        assert_eq!(
            Value::from_json(&serde_json::json!("2024-03-01")),
            Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert_eq!(Value::from_json(&serde_json::json!(true)), Value::text("true"));
    }

    #[test]
    fn test_record_json_shape() {
        let record = Record::new().with("a", 1.0).with("b", "x");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({"a": 1.0, "b": "x"}));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(2.5).to_string(), "2.50");
        assert_eq!(Value::text("hi").to_string(), "hi");
    }
}
