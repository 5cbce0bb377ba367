//! The tagged value type used in `input`/`expect` mappings.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel string meaning "the value exists and is non-empty".
pub const NON_EMPTY: &str = "non-empty";

/// A value appearing in a test-case `input` or `expect` mapping.
///
/// The format restricts values to scalars and nested mappings, so this
/// is a closed variant type rather than a dynamic one; the equality
/// policy can exhaustively match on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Explicit null.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar.
    Int(i64),
    /// Floating-point scalar.
    Float(f64),
    /// String scalar.
    String(String),
    /// Nested mapping with deterministic key order.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Whether this value counts as "empty" for the `"non-empty"`
    /// sentinel: null, `""`, `0`, `0.0`, or an empty mapping.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(_) => false,
            Value::Int(n) => *n == 0,
            Value::Float(f) => *f == 0.0,
            Value::String(s) => s.is_empty(),
            Value::Map(m) => m.is_empty(),
        }
    }

    /// Whether this value is the `"non-empty"` sentinel string.
    pub fn is_non_empty_sentinel(&self) -> bool {
        matches!(self, Value::String(s) if s == NON_EMPTY)
    }

    /// Numeric view of the value, if it is an integer or a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Convert a decoded YAML value into a [`Value`].
    ///
    /// Sequences and tagged values are outside the format's value
    /// grammar and are rejected.
    pub fn from_yaml(yaml: &serde_yaml::Value) -> Result<Self, ValueError> {
        match yaml {
            serde_yaml::Value::Null => Ok(Value::Null),
            serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Float(f))
                } else {
                    Err(ValueError::UnrepresentableNumber(n.to_string()))
                }
            }
            serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
            serde_yaml::Value::Mapping(m) => {
                let mut map = BTreeMap::new();
                for (k, v) in m {
                    let key = match k {
                        serde_yaml::Value::String(s) => s.clone(),
                        other => return Err(ValueError::NonStringKey(yaml_type_name(other))),
                    };
                    map.insert(key, Value::from_yaml(v)?);
                }
                Ok(Value::Map(map))
            }
            serde_yaml::Value::Sequence(_) => Err(ValueError::Sequence),
            serde_yaml::Value::Tagged(_) => Err(ValueError::Tagged),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k:?}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Errors converting a YAML value into a [`Value`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValueError {
    /// Sequences are not part of the value grammar.
    #[error("sequences are not allowed in input/expect values")]
    Sequence,
    /// Tagged YAML values are not part of the value grammar.
    #[error("tagged values are not allowed in input/expect values")]
    Tagged,
    /// Mapping key was not a string.
    #[error("mapping keys must be strings, found {0}")]
    NonStringKey(&'static str),
    /// Number outside i64/f64 range.
    #[error("number {0} is not representable")]
    UnrepresentableNumber(String),
}

fn yaml_type_name(v: &serde_yaml::Value) -> &'static str {
    match v {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "bool",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "sequence",
        serde_yaml::Value::Mapping(_) => "mapping",
        serde_yaml::Value::Tagged(_) => "tagged value",
    }
}
