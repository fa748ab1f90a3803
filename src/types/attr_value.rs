//! Normalized attribute values resolved from a request context.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A concrete value an attribute reference resolves to.
///
/// Values are kept in their normalized form: integers stay integers, floats
/// stay floats, strings stay strings. Nested objects are carried as
/// [`AttrValue::Record`] so dotted attribute paths can walk into them.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    #[schema(no_recursion)]
    List(Vec<AttrValue>),
    #[schema(no_recursion)]
    Record(BTreeMap<String, AttrValue>),
}

impl AttrValue {
    /// Equality across values of a comparable type pair.
    ///
    /// Same-type values compare structurally; `Int` and `Float` compare
    /// numerically. `Null` equals only `Null`. Returns `None` for any other
    /// mixed-type pair, which the evaluator treats as a type mismatch.
    pub fn try_eq(&self, other: &AttrValue) -> Option<bool> {
        use AttrValue::*;
        match (self, other) {
            (Null, Null) => Some(true),
            (Null, _) | (_, Null) => Some(false),
            (Bool(a), Bool(b)) => Some(a == b),
            (Int(a), Int(b)) => Some(a == b),
            (Float(a), Float(b)) => Some(a == b),
            (Int(a), Float(b)) | (Float(b), Int(a)) => Some((*a as f64) == *b),
            (String(a), String(b)) => Some(a == b),
            (List(a), List(b)) => {
                if a.len() != b.len() {
                    return Some(false);
                }
                let mut all = true;
                for (x, y) in a.iter().zip(b) {
                    all &= x.try_eq(y)?;
                }
                Some(all)
            }
            (Record(a), Record(b)) => Some(a == b),
            _ => None,
        }
    }

    /// Ordering across values of a comparable type pair.
    ///
    /// Defined for numeric pairs (`Int`/`Float` cross-compare) and string
    /// pairs. Everything else, including `Null`, has no ordering.
    pub fn try_cmp(&self, other: &AttrValue) -> Option<Ordering> {
        use AttrValue::*;
        match (self, other) {
            (Int(a), Int(b)) => Some(a.cmp(b)),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Int(a), Float(b)) => (*a as f64).partial_cmp(b),
            (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)),
            (String(a), String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Membership test against a list value.
    ///
    /// Returns `None` when `list` is not a [`AttrValue::List`] or an element
    /// types out against `self`.
    pub fn try_in(&self, list: &AttrValue) -> Option<bool> {
        let AttrValue::List(items) = list else {
            return None;
        };
        for item in items {
            if self.try_eq(item)? {
                return Some(true);
            }
        }
        Some(false)
    }

    /// Loose boolean interpretation used by `truthy`/`falsy`.
    pub fn truthy(&self) -> bool {
        match self {
            AttrValue::Null => false,
            AttrValue::Bool(b) => *b,
            AttrValue::Int(n) => *n != 0,
            AttrValue::Float(f) => *f != 0.0,
            AttrValue::String(s) => !s.is_empty(),
            AttrValue::List(items) => !items.is_empty(),
            AttrValue::Record(fields) => !fields.is_empty(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttrValue]> {
        match self {
            AttrValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Int(value.into())
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value)
    }
}

impl<T: Into<AttrValue>> From<Vec<T>> for AttrValue {
    fn from(value: Vec<T>) -> Self {
        AttrValue::List(value.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for AttrValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => AttrValue::Null,
            serde_json::Value::Bool(b) => AttrValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    AttrValue::Int(i)
                } else {
                    AttrValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => AttrValue::String(s),
            serde_json::Value::Array(items) => {
                AttrValue::List(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(fields) => AttrValue::Record(
                fields.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}

/// Build an attribute map from key/value pairs.
///
/// Convenience for callers whose actors and subjects are plain data:
/// an attribute map implements [`AttributeSource`](crate::AttributeSource)
/// directly.
pub fn attrs<K, V, I>(pairs: I) -> BTreeMap<String, AttrValue>
where
    K: Into<String>,
    V: Into<AttrValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
