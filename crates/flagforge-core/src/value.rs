use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// A dynamically-kinded value held by an [`crate::context::EvaluationContext`]
/// attribute map: boolean, string, integer, floating, temporal, or nested
/// mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(DateTime<Utc>),
    Struct(HashMap<String, AttributeValue>),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Int(i)
    }
}

impl From<f64> for AttributeValue {
    fn from(f: f64) -> Self {
        AttributeValue::Float(f)
    }
}

/// Primitive-only value allowed inside flag metadata: a mapping from string
/// to primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::String(s.to_string())
    }
}
impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::String(s)
    }
}
impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        MetadataValue::Bool(b)
    }
}
impl From<i64> for MetadataValue {
    fn from(i: i64) -> Self {
        MetadataValue::Int(i)
    }
}
impl From<f64> for MetadataValue {
    fn from(f: f64) -> Self {
        MetadataValue::Float(f)
    }
}

pub type FlagMetadata = HashMap<String, MetadataValue>;

/// The dynamic kind of a flag: one variant per typed resolution plus an
/// opaque "object" kind for anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Object(Json),
}

impl FlagValue {
    /// Discriminant-only comparison: are these two values the same flag kind?
    ///
    /// Used by the pipeline's type-check step. Two
    /// [`FlagValue::Object`] values are always kind-compatible with each
    /// other regardless of inner JSON shape: a provider's "object" resolve
    /// op may legitimately return any JSON document for an object-typed
    /// flag. Mismatch is only meaningful when a caller asked for a specific
    /// primitive kind (bool/int/float/string) and got back a JSON value of
    /// a different shape from the provider's object resolve op.
    pub fn same_kind(&self, other: &FlagValue) -> bool {
        match (self, other) {
            (FlagValue::Bool(_), FlagValue::Bool(_)) => true,
            (FlagValue::Int(_), FlagValue::Int(_)) => true,
            (FlagValue::Float(_), FlagValue::Float(_)) => true,
            (FlagValue::String(_), FlagValue::String(_)) => true,
            (FlagValue::Object(_), FlagValue::Object(_)) => true,
            // A primitive default compared against a provider's JSON object
            // resolution: check the JSON's own shape against the requested
            // primitive kind.
            (FlagValue::Bool(_), FlagValue::Object(j)) => j.is_boolean(),
            (FlagValue::Int(_), FlagValue::Object(j)) => j.is_i64() || j.is_u64(),
            (FlagValue::Float(_), FlagValue::Object(j)) => j.is_f64() || j.is_number(),
            (FlagValue::String(_), FlagValue::Object(j)) => j.is_string(),
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlagValue::Bool(b) => Some(*b),
            FlagValue::Object(j) => j.as_bool(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FlagValue::Int(i) => Some(*i),
            FlagValue::Object(j) => j.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FlagValue::Float(f) => Some(*f),
            FlagValue::Object(j) => j.as_f64(),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<String> {
        match self {
            FlagValue::String(s) => Some(s.clone()),
            FlagValue::Object(j) => j.as_str().map(|s| s.to_string()),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Json {
        match self {
            FlagValue::Bool(b) => Json::Bool(*b),
            FlagValue::Int(i) => Json::from(*i),
            FlagValue::Float(f) => Json::from(*f),
            FlagValue::String(s) => Json::String(s.clone()),
            FlagValue::Object(j) => j.clone(),
        }
    }
}

impl From<bool> for FlagValue {
    fn from(b: bool) -> Self {
        FlagValue::Bool(b)
    }
}
impl From<i64> for FlagValue {
    fn from(i: i64) -> Self {
        FlagValue::Int(i)
    }
}
impl From<f64> for FlagValue {
    fn from(f: f64) -> Self {
        FlagValue::Float(f)
    }
}
impl From<String> for FlagValue {
    fn from(s: String) -> Self {
        FlagValue::String(s)
    }
}
impl From<Json> for FlagValue {
    fn from(j: Json) -> Self {
        FlagValue::Object(j)
    }
}
