//! Dynamic attribute model underlying every request and response object.
//!
//! # Design
//! The API adds fields without notice, so models are not fixed records. An
//! `AttributeBag` is an insertion-ordered string-to-value map with typed
//! accessors layered on top: explicit coercion per requested type, no
//! reflection. Typed DTOs embed a bag behind `#[serde(flatten)]` so fields
//! the client does not yet model survive a decode/re-encode round trip.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TypeMismatch;

/// Insertion-ordered map from attribute name to JSON value.
///
/// Typed accessors distinguish three outcomes: `Ok(None)` when the key is
/// absent (or JSON null), `Ok(Some)` when the stored value is of the
/// requested type or coerces to it, and `Err(TypeMismatch)` when the stored
/// shape cannot represent the requested type. Numeric coercions stay within
/// the numeric family: a decimal read as an integer truncates toward zero,
/// an integer read as a decimal widens. Nothing else coerces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeBag(Map<String, Value>);

impl AttributeBag {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Store `value` under `key`, overwriting any prior value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Raw value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Attribute names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn get_string(&self, key: &str) -> Result<Option<String>, TypeMismatch> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(self.mismatch(key, "string", other)),
        }
    }

    pub fn get_integer(&self, key: &str) -> Result<Option<i32>, TypeMismatch> {
        let long = self.get_long(key).map_err(|mut e| {
            e.requested = "integer";
            e
        })?;
        match long {
            None => Ok(None),
            Some(l) => i32::try_from(l).map(Some).map_err(|_| TypeMismatch {
                key: key.to_string(),
                requested: "integer",
                found: "long",
            }),
        }
    }

    pub fn get_long(&self, key: &str) -> Result<Option<i64>, TypeMismatch> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => {
                if let Some(l) = n.as_i64() {
                    Ok(Some(l))
                } else if let Some(f) = n.as_f64() {
                    // Decimal requested as integral: truncate toward zero.
                    Ok(Some(f.trunc() as i64))
                } else {
                    Err(self.mismatch(key, "long", &Value::Number(n.clone())))
                }
            }
            Some(other) => Err(self.mismatch(key, "long", other)),
        }
    }

    pub fn get_decimal(&self, key: &str) -> Result<Option<f64>, TypeMismatch> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(other) => Err(self.mismatch(key, "decimal", other)),
        }
    }

    pub fn get_boolean(&self, key: &str) -> Result<Option<bool>, TypeMismatch> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(self.mismatch(key, "boolean", other)),
        }
    }

    /// List of raw values. Scalars do not coerce to one-element lists.
    pub fn get_list(&self, key: &str) -> Result<Option<Vec<Value>>, TypeMismatch> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items.clone())),
            Some(other) => Err(self.mismatch(key, "list", other)),
        }
    }

    /// List with every element coerced to long. Any non-numeric element is
    /// a mismatch for the whole list.
    pub fn get_long_list(&self, key: &str) -> Result<Option<Vec<i64>>, TypeMismatch> {
        let items = match self.get_list(key)? {
            None => return Ok(None),
            Some(items) => items,
        };
        let mut longs = Vec::with_capacity(items.len());
        for item in &items {
            let l = match item {
                Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
                _ => None,
            };
            match l {
                Some(l) => longs.push(l),
                None => return Err(self.mismatch(key, "list of long", item)),
            }
        }
        Ok(Some(longs))
    }

    pub fn get_object(&self, key: &str) -> Result<Option<AttributeBag>, TypeMismatch> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(map)) => Ok(Some(AttributeBag(map.clone()))),
            Some(other) => Err(self.mismatch(key, "object", other)),
        }
    }

    fn mismatch(&self, key: &str, requested: &'static str, found: &Value) -> TypeMismatch {
        TypeMismatch {
            key: key.to_string(),
            requested,
            found: value_type_name(found),
        }
    }
}

impl From<AttributeBag> for Value {
    fn from(bag: AttributeBag) -> Self {
        Value::Object(bag.0)
    }
}

pub(crate) fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "decimal",
        Value::Number(_) => "long",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_every_supported_type() {
        let mut bag = AttributeBag::new();
        bag.set("s", "name__v");
        bag.set("i", 42);
        bag.set("l", 9_000_000_000_i64);
        bag.set("d", 1.5);
        bag.set("b", true);
        bag.set("list", json!([1, 2, 3]));
        let mut nested = AttributeBag::new();
        nested.set("inner", "x");
        bag.set("obj", nested.clone());

        assert_eq!(bag.get_string("s").unwrap(), Some("name__v".to_string()));
        assert_eq!(bag.get_integer("i").unwrap(), Some(42));
        assert_eq!(bag.get_long("l").unwrap(), Some(9_000_000_000));
        assert_eq!(bag.get_decimal("d").unwrap(), Some(1.5));
        assert_eq!(bag.get_boolean("b").unwrap(), Some(true));
        assert_eq!(bag.get_long_list("list").unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(bag.get_object("obj").unwrap(), Some(nested));
    }

    #[test]
    fn round_trip_survives_intervening_keys() {
        let mut bag = AttributeBag::new();
        bag.set("target", 7);
        for i in 0..50 {
            bag.set(format!("filler_{i}"), i);
        }
        assert_eq!(bag.get_integer("target").unwrap(), Some(7));
    }

    #[test]
    fn preserves_insertion_order() {
        let mut bag = AttributeBag::new();
        bag.set("zulu", 1);
        bag.set("alpha", 2);
        bag.set("mike", 3);
        let keys: Vec<&str> = bag.keys().collect();
        assert_eq!(keys, vec!["zulu", "alpha", "mike"]);
    }

    #[test]
    fn overwrite_keeps_last_value() {
        let mut bag = AttributeBag::new();
        bag.set("k", 1);
        bag.set("k", 2);
        assert_eq!(bag.get_integer("k").unwrap(), Some(2));
    }

    #[test]
    fn absent_and_null_are_none_not_errors() {
        let mut bag = AttributeBag::new();
        bag.set("nothing", Value::Null);
        assert_eq!(bag.get_string("missing").unwrap(), None);
        assert_eq!(bag.get_string("nothing").unwrap(), None);
        assert_eq!(bag.get_long("nothing").unwrap(), None);
        assert_eq!(bag.get_list("nothing").unwrap(), None);
    }

    #[test]
    fn decimal_read_as_integer_truncates() {
        let mut bag = AttributeBag::new();
        bag.set("d", 3.9);
        assert_eq!(bag.get_integer("d").unwrap(), Some(3));
        bag.set("neg", -3.9);
        assert_eq!(bag.get_integer("neg").unwrap(), Some(-3));
    }

    #[test]
    fn integer_read_as_decimal_widens() {
        let mut bag = AttributeBag::new();
        bag.set("i", 4);
        assert_eq!(bag.get_decimal("i").unwrap(), Some(4.0));
    }

    #[test]
    fn long_out_of_integer_range_is_mismatch() {
        let mut bag = AttributeBag::new();
        bag.set("big", i64::MAX);
        let err = bag.get_integer("big").unwrap_err();
        assert_eq!(err.requested, "integer");
    }

    #[test]
    fn list_requested_from_scalar_is_mismatch_not_crash() {
        let mut bag = AttributeBag::new();
        bag.set("scalar", 5);
        let err = bag.get_list("scalar").unwrap_err();
        assert_eq!(err.requested, "list");
        assert_eq!(err.found, "long");
    }

    #[test]
    fn decimal_requested_from_object_is_mismatch() {
        let mut bag = AttributeBag::new();
        bag.set("obj", AttributeBag::new());
        let err = bag.get_decimal("obj").unwrap_err();
        assert_eq!(err.requested, "decimal");
        assert_eq!(err.found, "object");
    }

    #[test]
    fn long_list_with_string_element_is_mismatch() {
        let mut bag = AttributeBag::new();
        bag.set("mixed", json!([1, "two", 3]));
        assert!(bag.get_long_list("mixed").is_err());
    }

    #[test]
    fn deserializes_transparently_from_json_object() {
        let bag: AttributeBag =
            serde_json::from_str(r#"{"id": 12, "name__v": "doc", "unknown__c": [1]}"#).unwrap();
        assert_eq!(bag.get_long("id").unwrap(), Some(12));
        assert_eq!(bag.get_string("name__v").unwrap(), Some("doc".to_string()));
        assert!(bag.contains("unknown__c"));
    }
}
