// ── Field data model ──
//
// Every scraped datum is a `Field`: a normalized primitive value (or
// nothing, when the page didn't expose it) plus optional secondary
// attributes riding along (e.g. per-carrier sub-bands next to the band
// value). Absence is a first-class state, not an error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A normalized scalar scraped off a router page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            #[allow(clippy::cast_precision_loss)]
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

/// One logical field of a module snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Field {
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Option<Value>>,
}

impl Field {
    /// A field the source page didn't expose.
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn of(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            attributes: BTreeMap::new(),
        }
    }

    pub fn maybe<V: Into<Value>>(value: Option<V>) -> Self {
        Self {
            value: value.map(Into::into),
            attributes: BTreeMap::new(),
        }
    }

    /// Attach a secondary attribute, keeping builder-style call sites.
    pub fn with_attr<V: Into<Value>>(mut self, key: &str, value: Option<V>) -> Self {
        self.attributes.insert(key.to_owned(), value.map(Into::into));
        self
    }
}

/// A module's worth of fields, keyed by field name.
pub type FieldMap = BTreeMap<String, Field>;
