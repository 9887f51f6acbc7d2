//! # Representations
//!
//! A [`Representation`] is the attribute map describing a resource's state at a
//! point in time. Keys are strings, values are [`AttributeValue`]s, and the map
//! is ordered by key so two representations with the same content always
//! serialize identically.
//!
//! Resource entities read inbound representations with the `opt_*` accessors,
//! which distinguish "key absent" (leave the field alone, the partial-update
//! contract) from "key present with the wrong type" (an [`AttributeError`]).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Reserved key carrying the URI of a resource created by POST.
pub const CREATED_URI_KEY: &str = "createduri";

/// Errors raised while reading or validating attributes.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AttributeError {
    /// A required key is not present in the representation.
    #[error("Missing attribute: {0}")]
    Missing(String),

    /// The key is present but holds a value of another type.
    #[error("Attribute {key} has type {found}, expected {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The value has the right type but is outside the accepted domain.
    #[error("Invalid value for attribute {key}: {reason}")]
    Invalid { key: String, reason: String },

    /// The resource does not accept any updates.
    #[error("Resource {0} is read-only")]
    ReadOnly(String),
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Array(Vec<AttributeValue>),
    Map(Representation),
}

impl AttributeValue {
    /// Name of the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::Null => "null",
            AttributeValue::Bool(_) => "bool",
            AttributeValue::Int(_) => "int",
            AttributeValue::Double(_) => "double",
            AttributeValue::String(_) => "string",
            AttributeValue::Array(_) => "array",
            AttributeValue::Map(_) => "map",
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => f.write_str("null"),
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Int(i) => write!(f, "{}", i),
            AttributeValue::Double(d) => write!(f, "{}", d),
            AttributeValue::String(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", serde_json::Value::from(other.clone())),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Int(value.into())
    }
}

impl From<u32> for AttributeValue {
    fn from(value: u32) -> Self {
        AttributeValue::Int(value.into())
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Double(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<Representation> for AttributeValue {
    fn from(value: Representation) -> Self {
        AttributeValue::Map(value)
    }
}

impl From<Vec<AttributeValue>> for AttributeValue {
    fn from(value: Vec<AttributeValue>) -> Self {
        AttributeValue::Array(value)
    }
}

impl From<serde_json::Value> for AttributeValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => AttributeValue::Null,
            serde_json::Value::Bool(b) => AttributeValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => AttributeValue::Int(i),
                None => AttributeValue::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => AttributeValue::String(s),
            serde_json::Value::Array(items) => {
                AttributeValue::Array(items.into_iter().map(AttributeValue::from).collect())
            }
            serde_json::Value::Object(map) => AttributeValue::Map(Representation {
                attributes: map
                    .into_iter()
                    .map(|(k, v)| (k, AttributeValue::from(v)))
                    .collect(),
            }),
        }
    }
}

impl From<AttributeValue> for serde_json::Value {
    fn from(value: AttributeValue) -> Self {
        match value {
            AttributeValue::Null => serde_json::Value::Null,
            AttributeValue::Bool(b) => serde_json::Value::Bool(b),
            AttributeValue::Int(i) => serde_json::Value::from(i),
            // Non-finite doubles have no JSON form
            AttributeValue::Double(d) => serde_json::Number::from_f64(d)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            AttributeValue::String(s) => serde_json::Value::String(s),
            AttributeValue::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            AttributeValue::Map(rep) => rep.into_json(),
        }
    }
}

/// Ordered attribute map describing resource state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Representation {
    attributes: BTreeMap<String, AttributeValue>,
}

impl Representation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Inserts or replaces a value, returning the previous one.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Option<AttributeValue> {
        self.attributes.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<AttributeValue> {
        self.attributes.remove(key)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// True if any of `keys` is present.
    pub fn contains_any(&self, keys: &[&str]) -> bool {
        keys.iter().any(|k| self.contains(k))
    }

    // --- Required accessors ---

    pub fn get_bool(&self, key: &str) -> Result<bool, AttributeError> {
        self.opt_bool(key)?
            .ok_or_else(|| AttributeError::Missing(key.to_string()))
    }

    pub fn get_int(&self, key: &str) -> Result<i64, AttributeError> {
        self.opt_int(key)?
            .ok_or_else(|| AttributeError::Missing(key.to_string()))
    }

    pub fn get_double(&self, key: &str) -> Result<f64, AttributeError> {
        self.opt_double(key)?
            .ok_or_else(|| AttributeError::Missing(key.to_string()))
    }

    pub fn get_str(&self, key: &str) -> Result<&str, AttributeError> {
        self.opt_str(key)?
            .ok_or_else(|| AttributeError::Missing(key.to_string()))
    }

    // --- Optional accessors (partial updates) ---

    pub fn opt_bool(&self, key: &str) -> Result<Option<bool>, AttributeError> {
        match self.get(key) {
            None => Ok(None),
            Some(AttributeValue::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(mismatch(key, "bool", other)),
        }
    }

    pub fn opt_int(&self, key: &str) -> Result<Option<i64>, AttributeError> {
        match self.get(key) {
            None => Ok(None),
            Some(AttributeValue::Int(i)) => Ok(Some(*i)),
            Some(other) => Err(mismatch(key, "int", other)),
        }
    }

    /// Integers are widened, matching how numeric JSON arrives on the wire.
    pub fn opt_double(&self, key: &str) -> Result<Option<f64>, AttributeError> {
        match self.get(key) {
            None => Ok(None),
            Some(AttributeValue::Double(d)) => Ok(Some(*d)),
            Some(AttributeValue::Int(i)) => Ok(Some(*i as f64)),
            Some(other) => Err(mismatch(key, "double", other)),
        }
    }

    pub fn opt_str(&self, key: &str) -> Result<Option<&str>, AttributeError> {
        match self.get(key) {
            None => Ok(None),
            Some(AttributeValue::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(mismatch(key, "string", other)),
        }
    }

    pub fn opt_map(&self, key: &str) -> Result<Option<&Representation>, AttributeError> {
        match self.get(key) {
            None => Ok(None),
            Some(AttributeValue::Map(m)) => Ok(Some(m)),
            Some(other) => Err(mismatch(key, "map", other)),
        }
    }

    /// URI stored under [`CREATED_URI_KEY`], if any.
    pub fn created_uri(&self) -> Option<&str> {
        match self.get(CREATED_URI_KEY) {
            Some(AttributeValue::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn set_created_uri(&mut self, uri: impl Into<String>) {
        self.set(CREATED_URI_KEY, uri.into());
    }

    /// Parses a JSON object into a representation.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn into_json(self) -> serde_json::Value {
        serde_json::Value::Object(
            self.attributes
                .into_iter()
                .map(|(k, v)| (k, serde_json::Value::from(v)))
                .collect(),
        )
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.attributes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        f.write_str("}")
    }
}

fn mismatch(key: &str, expected: &'static str, found: &AttributeValue) -> AttributeError {
    AttributeError::TypeMismatch {
        key: key.to_string(),
        expected,
        found: found.type_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_accessors_distinguish_absent_and_mismatch() {
        let rep = Representation::new().with("state", true).with("power", 5);

        assert_eq!(rep.opt_bool("state").unwrap(), Some(true));
        assert_eq!(rep.opt_bool("missing").unwrap(), None);
        assert!(matches!(
            rep.opt_bool("power"),
            Err(AttributeError::TypeMismatch { expected: "bool", found: "int", .. })
        ));
        assert_eq!(
            rep.get_str("name"),
            Err(AttributeError::Missing("name".into()))
        );
    }

    #[test]
    fn test_double_accepts_integers() {
        let rep = Representation::new().with("temperature", 21);
        assert_eq!(rep.get_double("temperature").unwrap(), 21.0);
    }

    #[test]
    fn test_json_conversion_keeps_nesting() {
        let rep = Representation::from_json_str(
            r#"{"state": false, "side": "left", "meta": {"rev": 2, "tags": ["a", 1.5]}}"#,
        )
        .unwrap();

        assert_eq!(rep.get_str("side").unwrap(), "left");
        let meta = rep.opt_map("meta").unwrap().unwrap();
        assert_eq!(meta.get_int("rev").unwrap(), 2);
        assert_eq!(
            meta.get("tags"),
            Some(&AttributeValue::Array(vec![
                AttributeValue::String("a".into()),
                AttributeValue::Double(1.5)
            ]))
        );

        let json = rep.clone().into_json();
        assert_eq!(json["meta"]["rev"], serde_json::json!(2));
        assert_eq!(AttributeValue::from(json), AttributeValue::Map(rep));
    }

    #[test]
    fn test_created_uri_slot() {
        let mut rep = Representation::new();
        assert_eq!(rep.created_uri(), None);
        rep.set_created_uri("/a/light/1");
        assert_eq!(rep.created_uri(), Some("/a/light/1"));
    }

    #[test]
    fn test_display_is_ordered_by_key() {
        let rep = Representation::new().with("state", true).with("side", "left");
        assert_eq!(rep.to_string(), r#"{side: "left", state: true}"#);
    }
}
