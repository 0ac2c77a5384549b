//! JSON values with reference identity.
//!
//! Resolver outputs and result trees share one value type. Arrays and objects are reference
//! counted so that a previous result can be handed back as-is, and callers can tell that a
//! subtree did not change by comparing identities instead of walking it.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
pub use serde_json::Number;
pub use serde_json_bytes::ByteString;

/// An insertion ordered JSON object.
pub type Object = IndexMap<ByteString, Value>;

/// A JSON value.
///
/// Equality (`==`) is structural. Use [`Value::is_same`] to compare identities.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(ByteString),
    Array(Arc<Vec<Value>>),
    Object(Arc<Object>),
}

impl fmt::Debug for Value {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => formatter.debug_tuple("Null").finish(),
            Value::Bool(v) => formatter.debug_tuple("Bool").field(v).finish(),
            Value::Number(v) => fmt::Debug::fmt(v, formatter),
            Value::String(v) => formatter.debug_tuple("String").field(&v.as_str()).finish(),
            Value::Array(v) => {
                formatter.write_str("Array(")?;
                fmt::Debug::fmt(v, formatter)?;
                formatter.write_str(")")
            }
            Value::Object(v) => {
                formatter.write_str("Object(")?;
                fmt::Debug::fmt(v, formatter)?;
                formatter.write_str(")")
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        formatter.write_str(&json)
    }
}

impl Value {
    /// Returns true if both values are the same value.
    ///
    /// Arrays and objects are the same only if they are the same allocation, whatever their
    /// content. Scalars are the same if they are equal.
    pub fn is_same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => {
                false
            }
            (a, b) => a == b,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object.as_ref()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(array) => Some(array.as_slice()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// The value at `key` if this is an object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object()?.get(key)
    }

    /// The value at `index` if this is an array.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.as_array()?.get(index)
    }
}

/// Identity comparison of optional values, where `None` stands for an absent value.
pub fn same_value(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.is_same(b),
        _ => false,
    }
}

/// Merges `source` into `target`.
///
/// When both sides hold an object under the same key, the objects are merged recursively.
/// Otherwise the source value replaces the target value: scalars, nulls and arrays are never
/// merged. Keys only present in `target` are left untouched.
///
/// Shared objects are copied before being modified, so values reachable from elsewhere (a
/// previous result for instance) are never mutated.
pub fn merge_object(target: &mut Object, source: &Object) {
    for (key, value) in source {
        merge_entry(target, key, value);
    }
}

pub(crate) fn merge_entry(target: &mut Object, key: &ByteString, value: &Value) {
    if let (Some(Value::Object(target_object)), Value::Object(source_object)) =
        (target.get_mut(key), value)
    {
        if !Arc::ptr_eq(target_object, source_object) {
            merge_object(Arc::make_mut(target_object), source_object);
        }
        return;
    }
    target.insert(key.clone(), value.clone());
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s.as_str()),
            Value::Array(array) => serializer.collect_seq(array.iter()),
            Value::Object(object) => {
                serializer.collect_map(object.iter().map(|(k, v)| (k.as_str(), v)))
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_json_bytes::Value::deserialize(deserializer).map(Value::from)
    }
}

impl From<serde_json_bytes::Value> for Value {
    fn from(value: serde_json_bytes::Value) -> Self {
        match value {
            serde_json_bytes::Value::Null => Value::Null,
            serde_json_bytes::Value::Bool(b) => Value::Bool(b),
            serde_json_bytes::Value::Number(n) => Value::Number(n),
            serde_json_bytes::Value::String(s) => Value::String(s),
            serde_json_bytes::Value::Array(array) => {
                Value::Array(Arc::new(array.into_iter().map(Value::from).collect()))
            }
            serde_json_bytes::Value::Object(object) => Value::Object(Arc::new(
                object
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            )),
        }
    }
}

impl From<&Value> for serde_json_bytes::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json_bytes::Value::Null,
            Value::Bool(b) => serde_json_bytes::Value::Bool(*b),
            Value::Number(n) => serde_json_bytes::Value::Number(n.clone()),
            Value::String(s) => serde_json_bytes::Value::String(s.clone()),
            Value::Array(array) => {
                serde_json_bytes::Value::Array(array.iter().map(Into::into).collect())
            }
            Value::Object(object) => serde_json_bytes::Value::Object(
                object
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json_bytes::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json_bytes::Value {
    fn from(value: Value) -> Self {
        (&value).into()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

/// Non finite floats have no JSON representation and become `null`.
impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<ByteString> for Value {
    fn from(s: ByteString) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(array: Vec<Value>) -> Self {
        Value::Array(Arc::new(array))
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(Arc::new(object))
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Value::Array(Arc::new(iter.into_iter().collect()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json_bytes::json;

    use super::*;

    #[test]
    fn identity_of_containers_is_by_reference() {
        let a = Value::from(json!({"a": 1}));
        let b = Value::from(json!({"a": 1}));
        assert_eq!(a, b);
        assert!(!a.is_same(&b));
        assert!(a.is_same(&a.clone()));

        let list = Value::from(json!([1, 2]));
        assert!(list.is_same(&list.clone()));
        assert!(!list.is_same(&Value::from(json!([1, 2]))));
    }

    #[test]
    fn identity_of_scalars_is_by_value() {
        assert!(Value::from(1).is_same(&Value::from(1)));
        assert!(Value::from("a").is_same(&Value::from("a")));
        assert!(Value::Null.is_same(&Value::Null));
        assert!(!Value::from(1).is_same(&Value::from(2)));
        assert!(!Value::Null.is_same(&Value::from(false)));
        assert!(!Value::Null.is_same(&Value::from(json!({}))));
    }

    #[test]
    fn absent_is_only_the_same_as_absent() {
        let null = Value::Null;
        assert!(same_value(None, None));
        assert!(!same_value(None, Some(&null)));
        assert!(!same_value(Some(&null), None));
        assert!(same_value(Some(&null), Some(&null)));
    }

    #[test]
    fn merge_overwrites_scalars_and_lists_and_merges_objects() {
        let mut target = Value::from(json!({
            "scalar": 1,
            "list": [1, 2, 3],
            "object": {"a": 1, "b": {"c": 1}},
            "only_target": true,
            "replaced_by_null": {"a": 1},
        }))
        .as_object()
        .cloned()
        .unwrap();
        let source = Value::from(json!({
            "scalar": 2,
            "list": [4],
            "object": {"b": {"d": 2}, "e": 3},
            "replaced_by_null": null,
            "only_source": "new",
        }));

        merge_object(&mut target, source.as_object().unwrap());

        assert_eq!(
            Value::from(target),
            Value::from(json!({
                "scalar": 2,
                "list": [4],
                "object": {"a": 1, "b": {"c": 1, "d": 2}, "e": 3},
                "only_target": true,
                "replaced_by_null": null,
                "only_source": "new",
            }))
        );
    }

    #[test]
    fn merge_never_mutates_shared_objects() {
        let shared = Value::from(json!({"a": 1}));
        let mut target = Object::new();
        target.insert("nested".into(), shared.clone());
        let source = Value::from(json!({"nested": {"b": 2}}));

        merge_object(&mut target, source.as_object().unwrap());

        assert_eq!(shared, Value::from(json!({"a": 1})));
        assert_eq!(
            Value::from(target),
            Value::from(json!({"nested": {"a": 1, "b": 2}}))
        );
    }

    #[test]
    fn merging_an_object_into_itself_keeps_its_identity() {
        let shared = Value::from(json!({"a": {"b": 1}}));
        let mut target = Object::new();
        target.insert("nested".into(), shared.clone());
        let mut source = Object::new();
        source.insert("nested".into(), shared.clone());

        merge_object(&mut target, &source);

        assert!(target["nested"].is_same(&shared));
    }

    #[test]
    fn serializes_in_insertion_order() {
        let value = Value::from(json!({"z": 1, "a": [true, null, "s"], "m": 1.5}));
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"z":1,"a":[true,null,"s"],"m":1.5}"#
        );
        let back: Value = serde_json::from_str(&value.to_string()).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert_eq!(Value::from(f64::NAN), Value::Null);
        assert_eq!(Value::from(1.5).as_f64(), Some(1.5));
    }
}
