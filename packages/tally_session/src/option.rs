//! Vote options and the identifiers votes point at.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

/// One entry in the shared, ordered option list.
///
/// The payload is whatever key/value object the client proposed. It is
/// stored and echoed back verbatim; the server never interprets it beyond
/// the convenience accessors below.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VoteOption {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl VoteOption {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Build an option carrying only a `label` field.
    pub fn labeled(label: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("label".to_string(), Value::String(label.into()));
        Self { fields }
    }

    /// The client-supplied `id` field, if it is a string or a number.
    pub fn id(&self) -> Option<OptionId> {
        match self.fields.get("id")? {
            Value::String(s) => Some(OptionId::Text(s.clone())),
            Value::Number(n) => Some(OptionId::from(n.clone())),
            _ => None,
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.fields.get("label").and_then(Value::as_str)
    }
}

impl From<Map<String, Value>> for VoteOption {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// What a vote refers to. Clients send either a list position or a string id.
///
/// Any JSON number is accepted and kept as sent; `Number` holds the ones that
/// do not fit an `i64` (fractions, exponents, large unsigned values).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionId {
    Index(i64),
    Number(Number),
    Text(String),
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionId::Index(i) => write!(f, "{}", i),
            OptionId::Number(n) => write!(f, "{}", n),
            OptionId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for OptionId {
    fn from(index: i64) -> Self {
        OptionId::Index(index)
    }
}

impl From<Number> for OptionId {
    fn from(n: Number) -> Self {
        match n.as_i64() {
            Some(index) => OptionId::Index(index),
            None => OptionId::Number(n),
        }
    }
}

impl From<&str> for OptionId {
    fn from(id: &str) -> Self {
        OptionId::Text(id.to_string())
    }
}
