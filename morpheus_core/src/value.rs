//! Dynamically-typed value trees that the subset matcher walks.
//!
//! A [`Value`] is built once by the caller, either from decoded JSON
//! (`From<serde_json::Value>`) or from a typed struct via [`to_value`], and is
//! then treated as read-only.

mod key_ser;
mod ser;

use std::fmt::Display;

use indexmap::IndexMap;
use serde_json::Number;

pub use ser::{to_value, to_value_with_hidden, Error as SerializeError};

/// A node in a value tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A keyed collection of named values.
    Record(Record),
    /// An ordered collection of values.
    Sequence(Vec<Value>),
    /// A leaf value.
    Scalar(Scalar),
}

/// The two shapes a keyed collection can take.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Fixed fields in declaration order, as produced by a typed struct.
    Struct(Vec<Field>),
    /// Free-form keys, as produced by a decoded JSON object.
    Map(IndexMap<String, Value>),
}

/// A named field of a [`Record::Struct`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// The field name.
    pub name: String,
    /// The field value.
    pub value: Value,
    /// Whether the field takes part in comparisons at all. Hidden fields are
    /// carried along but never inspected.
    pub comparable: bool,
    /// The value was given explicitly (an `Option` holding `Some`), so it is
    /// specified even when it equals its type's zero value.
    pub explicit: bool,
}

impl Field {
    /// A regular, comparable field.
    pub fn new<S: Into<String>>(name: S, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            comparable: true,
            explicit: false,
        }
    }

    /// A field that is never compared.
    pub fn hidden<S: Into<String>>(name: S, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            comparable: false,
            explicit: false,
        }
    }

    /// Mark the value as explicitly given.
    pub fn explicitly_set(mut self) -> Self {
        self.explicit = true;
        self
    }

    /// Whether the field holds an unset zero value.
    pub fn is_zero(&self) -> bool {
        !self.explicit && self.value.is_zero()
    }
}

/// Leaf values.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// null / None / unit
    Null,
    /// A boolean
    Bool(bool),
    /// Any JSON number
    Number(Number),
    /// A string
    String(String),
}

impl Value {
    /// The null scalar.
    pub fn null() -> Self {
        Value::Scalar(Scalar::Null)
    }

    /// A struct-shaped record made of the given fields.
    pub fn record<I: IntoIterator<Item = Field>>(fields: I) -> Self {
        Value::Record(Record::Struct(fields.into_iter().collect()))
    }

    /// A map-shaped record made of the given entries.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Record(Record::Map(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// A sequence of values.
    pub fn sequence<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Value::Sequence(items.into_iter().collect())
    }

    /// Whether this value equals the zero value of its type: null, `false`,
    /// numeric zero, the empty string, an empty collection, or a struct whose
    /// fields are all zero. A field explicitly set to a zero value is not zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Scalar(Scalar::Null) => true,
            Value::Scalar(Scalar::Bool(b)) => !b,
            Value::Scalar(Scalar::Number(n)) => n.as_f64().map_or(false, |f| f == 0.0),
            Value::Scalar(Scalar::String(s)) => s.is_empty(),
            Value::Sequence(items) => items.is_empty(),
            Value::Record(Record::Map(entries)) => entries.is_empty(),
            Value::Record(Record::Struct(fields)) => fields.iter().all(Field::is_zero),
        }
    }

    /// Short name of the value's shape, used in mismatch reports.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Record(Record::Struct(_)) => "struct",
            Value::Record(Record::Map(_)) => "map",
            Value::Sequence(_) => "sequence",
            Value::Scalar(Scalar::Null) => "null",
            Value::Scalar(Scalar::Bool(_)) => "bool",
            Value::Scalar(Scalar::Number(_)) => "number",
            Value::Scalar(Scalar::String(_)) => "string",
        }
    }

    /// Look up a comparable or hidden struct field, or a map entry, by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(Record::Struct(fields)) => {
                fields.iter().find(|f| f.name == name).map(|f| &f.value)
            }
            Value::Record(Record::Map(entries)) => entries.get(name),
            _ => None,
        }
    }

    /// Render back to JSON. Struct records become objects (hidden fields
    /// included), so the conversion is lossy with respect to record shape.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Record(Record::Struct(fields)) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|f| (f.name.to_owned(), f.value.to_json()))
                    .collect(),
            ),
            Value::Record(Record::Map(entries)) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.to_owned(), v.to_json()))
                    .collect(),
            ),
            Value::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Scalar(Scalar::Null) => serde_json::Value::Null,
            Value::Scalar(Scalar::Bool(b)) => serde_json::Value::Bool(*b),
            Value::Scalar(Scalar::Number(n)) => serde_json::Value::Number(n.to_owned()),
            Value::Scalar(Scalar::String(s)) => serde_json::Value::String(s.to_owned()),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::null(),
            serde_json::Value::Bool(b) => b.into(),
            serde_json::Value::Number(n) => Value::Scalar(Scalar::Number(n)),
            serde_json::Value::String(s) => s.into(),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Record(Record::Map(
                entries.into_iter().map(|(k, v)| (k, v.into())).collect(),
            )),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(Scalar::String(s.to_owned()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(Scalar::String(s))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Scalar(Scalar::Number(n.into()))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Scalar(Scalar::Number(n.into()))
    }
}

impl From<f64> for Value {
    /// Non-finite floats have no JSON representation and become null.
    fn from(n: f64) -> Self {
        Number::from_f64(n)
            .map(|n| Value::Scalar(Scalar::Number(n)))
            .unwrap_or_else(Value::null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn zero_values_are_detected() {
        assert!(Value::null().is_zero());
        assert!(Value::from(false).is_zero());
        assert!(Value::from(0i64).is_zero());
        assert!(Value::from(0.0).is_zero());
        assert!(Value::from("").is_zero());
        assert!(Value::Sequence(vec![]).is_zero());
        assert!(Value::Record(Record::Map(IndexMap::new())).is_zero());
        assert!(Value::record([
            Field::new("a", Value::from("")),
            Field::hidden("b", Value::null())
        ])
        .is_zero());
    }

    #[test]
    fn non_zero_values_are_detected() {
        assert!(!Value::from(true).is_zero());
        assert!(!Value::from(-1i64).is_zero());
        assert!(!Value::from("none").is_zero());
        assert!(!Value::sequence([Value::null()]).is_zero());
        assert!(!Value::map([("a", Value::from(""))]).is_zero());
        assert!(!Value::record([Field::new("a", Value::from(1u64))]).is_zero());
        assert!(!Value::record([Field::new("a", Value::from("")).explicitly_set()]).is_zero());
    }

    #[test]
    fn json_objects_become_maps() {
        let value = Value::from(json!({"code": "a", "access": ["full"]}));
        assert_eq!(value.kind_name(), "map");
        assert_eq!(value.get("code"), Some(&Value::from("a")));
        assert_eq!(
            value.get("access"),
            Some(&Value::sequence([Value::from("full")]))
        );
    }

    #[test]
    fn to_json_renders_struct_fields() {
        let value = Value::record([
            Field::new("code", Value::from("a")),
            Field::hidden("id", Value::from(7u64)),
        ]);
        assert_eq!(value.to_json(), json!({"code": "a", "id": 7}));
        assert_eq!(value.to_string(), r#"{"code":"a","id":7}"#);
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert_eq!(Value::from(f64::NAN), Value::null());
    }
}
