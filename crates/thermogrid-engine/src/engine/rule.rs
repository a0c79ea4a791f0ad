//! Derivation rules for computed columns.

use std::fmt;
use std::sync::Arc;

use crate::error::DerivationError;
use crate::value::{Record, Value};

use super::formula::Formula;

type NativeFn = dyn Fn(&Record) -> Result<Value, DerivationError> + Send + Sync;

/// A rule implemented directly in Rust rather than as formula text.
///
/// Native rules cannot be serialized; they travel as plain numeric columns.
#[derive(Clone)]
pub struct NativeRule {
    name: String,
    func: Arc<NativeFn>,
}

impl NativeRule {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Record) -> Result<Value, DerivationError> + Send + Sync + 'static,
    {
        NativeRule {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for NativeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeRule").field("name", &self.name).finish()
    }
}

/// How a computed column derives its value from a record.
#[derive(Clone, Debug)]
pub enum DerivationRule {
    Formula(Formula),
    Native(NativeRule),
}

impl DerivationRule {
    pub fn evaluate(&self, record: &Record) -> Result<Value, DerivationError> {
        match self {
            DerivationRule::Formula(f) => f.evaluate(record).map(Value::Number),
            DerivationRule::Native(rule) => (rule.func)(record),
        }
    }

    /// Fields this rule reads. Native rules are opaque and report none.
    pub fn references(&self) -> &[String] {
        match self {
            DerivationRule::Formula(f) => f.references(),
            DerivationRule::Native(_) => &[],
        }
    }

    pub fn formula(&self) -> Option<&Formula> {
        match self {
            DerivationRule::Formula(f) => Some(f),
            DerivationRule::Native(_) => None,
        }
    }
}

impl From<Formula> for DerivationRule {
    fn from(f: Formula) -> Self {
        DerivationRule::Formula(f)
    }
}
