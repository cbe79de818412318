use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A scalar cell value.
///
/// Grids are fed heterogeneous row dictionaries, so numbers routinely arrive
/// both as [`Value::Number`] and as numeric text; predicates and the sorter
/// coerce as needed rather than rejecting either shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    /// The raw text rendering, before any normalization.
    pub fn display_text(&self) -> String {
        match self {
            Value::Bool(true) => "true".to_string(),
            Value::Bool(false) => "false".to_string(),
            Value::Number(n) => n.to_string(),
            Value::Text(s) => s.clone(),
        }
    }

    /// Numeric coercion: numbers pass through, booleans count as 0/1 and
    /// numeric text parses. Everything else is non-numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
        }
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

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Trim and lowercase, the normalization applied to every value (and to
/// literal-form filter expressions) before predicate evaluation.
pub fn format_text(text: &str) -> String {
    text.trim().to_lowercase()
}

/// The normalized form of a value that predicates are evaluated against.
pub fn format_value(value: &Value) -> String {
    format_text(&value.display_text())
}

/// Total order used by the sorter.
///
/// Numeric values (numbers, and booleans as 0/1) order numerically and
/// before all text; text orders lexicographically. Missing cells sort as
/// empty text.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (numeric_key(a), numeric_key(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => text_key(a).cmp(text_key(b)),
    }
}

fn numeric_key(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Text(_) => None,
    }
}

fn text_key(value: &Value) -> &str {
    match value {
        Value::Text(s) => s.as_str(),
        // Unreachable for the sorter (numeric values never reach the text
        // branch), kept total for direct callers.
        _ => "",
    }
}

/// A data row: an ordered mapping from column name to scalar value.
///
/// Rows are caller-supplied payloads; the engine never mutates them, it
/// wraps them in view records that carry bookkeeping separately.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row(pub IndexMap<String, Value>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(column.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Row(iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect())
    }
}
