//! Attribute values and attribute sets.
//!
//! An [`AttributeSet`] is one snapshot of a configuration object: either the
//! desired values from a plan or the observed values from state or a live read.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::schema::{AttributeSchema, ResourceSchema};

/// A single-valued attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    /// A string (also used for enum members and unit-suffixed values).
    String(String),
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
}

impl Scalar {
    /// The JSON form of the value.
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
        }
    }

    /// The string value, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// The value of one attribute in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AttributeValue {
    /// Not specified by the user, or not yet known.
    #[default]
    Absent,
    /// Explicitly cleared.
    Null,
    /// A single value.
    Scalar(Scalar),
    /// A set of strings; order is not significant.
    Set(BTreeSet<String>),
}

static ABSENT: AttributeValue = AttributeValue::Absent;

impl AttributeValue {
    /// Build a set value from any collection of strings, dropping duplicates.
    pub fn set<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Set(values.into_iter().map(Into::into).collect())
    }

    /// Whether the value is [`AttributeValue::Absent`].
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Whether the value carries no data (absent or null).
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Absent | Self::Null)
    }

    /// The scalar, if any.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// The set members, if this is a set.
    pub fn as_set(&self) -> Option<&BTreeSet<String>> {
        match self {
            Self::Set(s) => Some(s),
            _ => None,
        }
    }

    /// Short variant name used in panic and log messages.
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Null => "null",
            Self::Scalar(Scalar::String(_)) => "string",
            Self::Scalar(Scalar::Bool(_)) => "bool",
            Self::Scalar(Scalar::Int(_)) => "int",
            Self::Set(_) => "set",
        }
    }

    /// The value as stored in provider state.
    pub fn to_state_json(&self) -> Value {
        match self {
            Self::Absent | Self::Null => Value::Null,
            Self::Scalar(s) => s.to_json(),
            Self::Set(members) => Value::Array(
                members.iter().map(|m| Value::String(m.clone())).collect(),
            ),
        }
    }
}

impl From<Scalar> for AttributeValue {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.into())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Scalar(value.into())
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Scalar(value.into())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Scalar(value.into())
    }
}

/// Attribute name to value mapping for one configuration object.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttributeSet {
    values: BTreeMap<String, AttributeValue>,
}

impl AttributeSet {
    /// Create an empty set; every attribute reads as absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Set an attribute using builder pattern.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Get an attribute value; missing attributes are [`AttributeValue::Absent`].
    pub fn get(&self, name: &str) -> &AttributeValue {
        self.values.get(name).unwrap_or(&ABSENT)
    }

    /// Iterate over explicitly stored attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of explicitly stored attributes.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no attribute is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Render the snapshot as provider state, keyed by state keys.
    pub fn to_state_object(&self, schema: &ResourceSchema) -> Map<String, Value> {
        schema
            .attributes
            .iter()
            .map(|attr| (attr.state_key(), self.state_value(attr)))
            .collect()
    }

    fn state_value(&self, attr: &AttributeSchema) -> Value {
        self.get(attr.name).to_state_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_attribute_is_absent() {
        let set = AttributeSet::new().with("enabled", true);
        assert_eq!(set.get("enabled"), &AttributeValue::from(true));
        assert!(set.get("log-file").is_absent());
    }

    #[test]
    fn test_set_deduplicates_and_ignores_order() {
        let a = AttributeValue::set(["b", "a", "b"]);
        let b = AttributeValue::set(["a", "b"]);
        assert_eq!(a, b);
        assert_eq!(a.as_set().map(|s| s.len()), Some(2));
    }

    #[test]
    fn test_unset_values() {
        assert!(AttributeValue::Absent.is_unset());
        assert!(AttributeValue::Null.is_unset());
        assert!(!AttributeValue::from("x").is_unset());
        assert!(!AttributeValue::Null.is_absent());
    }

    #[test]
    fn test_to_state_json() {
        assert_eq!(AttributeValue::Absent.to_state_json(), Value::Null);
        assert_eq!(AttributeValue::from(5i64).to_state_json(), json!(5));
        assert_eq!(
            AttributeValue::set(["z", "a"]).to_state_json(),
            json!(["a", "z"])
        );
    }

    #[test]
    fn test_to_state_object_covers_every_attribute() {
        const ATTRS: &[AttributeSchema] = &[
            AttributeSchema::bool("enabled"),
            AttributeSchema::string("log-file"),
        ];
        let schema = ResourceSchema {
            publisher_type: "file-based-access",
            description: "",
            attributes: ATTRS,
        };
        let state = AttributeSet::new()
            .with("log-file", "logs/access")
            .to_state_object(&schema);
        let keys: Vec<&String> = state.keys().collect();
        assert_eq!(keys.len(), 2);
        assert_eq!(state["log_file"], json!("logs/access"));
        assert_eq!(state["enabled"], Value::Null);
    }
}
