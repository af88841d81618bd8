use std::collections::BTreeMap;

/// The dynamic value tree every `svcbus` envelope is built from.
///
/// A tagged value is the one extension over plain JSON: it carries a class
/// hint drawn from a process-wide registry (see [`crate::HintRegistry`])
/// alongside its payload. On the wire a tagged value is indistinguishable
/// from a two-key JSON object — [`Value::Tagged`] only exists because the
/// codec recognizes that shape and reifies it on decode.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// JSON `null`.
    Null,
    /// JSON `true`/`false`.
    Bool(bool),
    /// A JSON number — integer or IEEE-754 double, whichever the source
    /// text used.
    Number(serde_json::Number),
    /// A UTF-8 string.
    String(String),
    /// An ordered list of values.
    Array(Vec<Value>),
    /// An ordered map of string keys to values. `BTreeMap` keeps key order
    /// deterministic for tests and logs; the wire form preserves whatever
    /// order `serde_json`'s `preserve_order` feature produced on decode.
    Object(BTreeMap<String, Value>),
    /// A class-hinted value: `{"__c": class_hint, "__p": payload}` on the
    /// wire.
    Tagged {
        /// The hint string identifying the semantic class of `payload`.
        class_hint: String,
        /// The tagged value's contents.
        payload: Box<Value>,
    },
}

/// Object key carrying the class hint of a tagged value.
pub const CLASS_HINT_KEY: &str = "__c";
/// Object key carrying the payload of a tagged value.
pub const PAYLOAD_KEY: &str = "__p";

impl Value {
    /// Builds a tagged value.
    #[must_use]
    pub fn tagged(class_hint: impl Into<String>, payload: Value) -> Self {
        Value::Tagged {
            class_hint: class_hint.into(),
            payload: Box::new(payload),
        }
    }

    /// Builds an object from an iterator of key/value pairs.
    #[must_use]
    pub fn object(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Value::Object(entries.into_iter().collect())
    }

    /// The class hint, if this is a tagged value.
    #[must_use]
    pub fn class_hint(&self) -> Option<&str> {
        match self {
            Value::Tagged { class_hint, .. } => Some(class_hint),
            _ => None,
        }
    }

    /// The payload, if this is a tagged value.
    #[must_use]
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Value::Tagged { payload, .. } => Some(payload),
            _ => None,
        }
    }

    /// Borrows this value as a string, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrows this value as an object, if it is one (not a tagged value).
    #[must_use]
    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Borrows this value as an array, if it is one.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Converts to an `f64`, if this is a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Converts to a `u64`, if this is a non-negative integer.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
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

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

/// Converts a decoded `serde_json::Value` into our [`Value`], reifying any
/// `{"__c": ..., "__p": ...}` shape into [`Value::Tagged`]. Recursion is
/// post-order: children are reified before the parent is inspected, so a
/// tagged value nested inside another tagged value's payload is reified
/// correctly.
pub(crate) fn reify(raw: serde_json::Value) -> Value {
    match raw {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(n),
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::Array(items.into_iter().map(reify).collect()),
        serde_json::Value::Object(map) => {
            if let Some(hint) = map.get(CLASS_HINT_KEY).and_then(|v| v.as_str()) {
                // Design note (c): a tagged object whose `__p` is missing
                // decodes to a tagged value with `null` payload.
                let payload = map
                    .get(PAYLOAD_KEY)
                    .cloned()
                    .map(reify)
                    .unwrap_or(Value::Null);
                Value::Tagged {
                    class_hint: hint.to_string(),
                    payload: Box::new(payload),
                }
            } else {
                Value::Object(
                    map.into_iter()
                        .map(|(k, v)| (k, reify(v)))
                        .collect(),
                )
            }
        }
    }
}

/// Converts a [`Value`] back into a plain `serde_json::Value`, emitting the
/// `{"__c": ..., "__p": ...}` shape for tagged values.
pub(crate) fn dereify(value: Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(b),
        Value::Number(n) => serde_json::Value::Number(n),
        Value::String(s) => serde_json::Value::String(s),
        Value::Array(items) => serde_json::Value::Array(items.into_iter().map(dereify).collect()),
        Value::Object(map) => {
            serde_json::Value::Object(map.into_iter().map(|(k, v)| (k, dereify(v))).collect())
        }
        Value::Tagged { class_hint, payload } => {
            let mut obj = serde_json::Map::new();
            obj.insert(CLASS_HINT_KEY.to_string(), serde_json::Value::String(class_hint));
            obj.insert(PAYLOAD_KEY.to_string(), dereify(*payload));
            serde_json::Value::Object(obj)
        }
    }
}
