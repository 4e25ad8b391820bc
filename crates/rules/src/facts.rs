//! Facts: the flat key/value view of one control cycle that rules
//! evaluate against.

use std::collections::BTreeMap;

/// A single fact value.
///
/// Comparison is deliberately loose: numeric kinds compare by value
/// with a small tolerance and strings compare case-insensitively, so
/// rule documents do not have to match the producer's exact type.
#[derive(Debug, Clone, PartialEq)]
pub enum FactValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

const FLOAT_TOLERANCE: f64 = 1e-3;

impl FactValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FactValue::Int(n) => Some(*n as f64),
            FactValue::Float(f) => Some(*f),
            FactValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Loose equality for rule conditions.
    pub fn loose_eq(&self, other: &FactValue) -> bool {
        if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
            return (a - b).abs() < FLOAT_TOLERANCE;
        }
        match (self, other) {
            (FactValue::Null, FactValue::Null) => true,
            (FactValue::Str(a), FactValue::Str(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        }
    }

    /// Converts a JSON value from a rule document into a comparable fact.
    pub fn from_json(value: &serde_json::Value) -> FactValue {
        match value {
            serde_json::Value::Null => FactValue::Null,
            serde_json::Value::Bool(b) => FactValue::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FactValue::Int(i)
                } else {
                    FactValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => FactValue::Str(s.clone()),
            other => FactValue::Str(other.to_string()),
        }
    }
}

impl From<bool> for FactValue {
    fn from(v: bool) -> Self {
        FactValue::Bool(v)
    }
}

impl From<i64> for FactValue {
    fn from(v: i64) -> Self {
        FactValue::Int(v)
    }
}

impl From<u32> for FactValue {
    fn from(v: u32) -> Self {
        FactValue::Int(v as i64)
    }
}

impl From<f64> for FactValue {
    fn from(v: f64) -> Self {
        FactValue::Float(v)
    }
}

impl From<&str> for FactValue {
    fn from(v: &str) -> Self {
        FactValue::Str(v.to_owned())
    }
}

impl From<String> for FactValue {
    fn from(v: String) -> Self {
        FactValue::Str(v)
    }
}

/// The fact set for one evaluation cycle.
#[derive(Debug, Clone, Default)]
pub struct Facts {
    values: BTreeMap<String, FactValue>,
}

impl Facts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FactValue>) {
        self.values.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&FactValue> {
        self.values.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FactValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}
