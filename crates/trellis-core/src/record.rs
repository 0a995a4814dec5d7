// File: crates/trellis-core/src/record.rs
// Summary: Dynamic row model (Value/Record) with explicit numeric coercion rules
//          and a resolved-once field accessor (FieldRef).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A dynamically typed cell value as it arrives from the caller's rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    /// Lossy numeric view: non-numeric values become 0.0.
    /// Contract: never returns NaN or an infinity.
    pub fn coerce(&self) -> f64 {
        match self {
            Value::Number(v) if v.is_finite() => *v,
            Value::Number(_) => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0),
            Value::Null => 0.0,
        }
    }

    /// Strict numeric view: `Some` only for finite numbers (or numeric text).
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) if v.is_finite() => Some(*v),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(v) if v.fract() == 0.0 && v.is_finite() && v.abs() < 1e15 => {
                write!(f, "{}", *v as i64)
            }
            Value::Number(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

/// A row: named fields in deterministic (sorted) order.
pub type Record = BTreeMap<String, Value>;

/// Field accessor resolved once per call instead of stringly lookups at
/// every use site. Holds the field name; the coercion rules live on `Value`.
#[derive(Clone, Debug)]
pub struct FieldRef<'a> {
    name: &'a str,
}

impl<'a> FieldRef<'a> {
    pub fn new(name: &'a str) -> Self {
        Self { name }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn get<'r>(&self, row: &'r Record) -> Option<&'r Value> {
        row.get(self.name)
    }

    /// Strict: `Some` only when the field exists and is numeric.
    pub fn number(&self, row: &Record) -> Option<f64> {
        row.get(self.name).and_then(Value::as_number)
    }

    /// Lossy: missing or non-numeric fields become 0.0.
    pub fn coerce(&self, row: &Record) -> f64 {
        row.get(self.name).map(Value::coerce).unwrap_or(0.0)
    }
}

/// Build a record from `(name, value)` pairs. Test and demo convenience.
pub fn record<I, K, V>(fields: I) -> Record
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}
