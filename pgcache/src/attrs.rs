//! Attribute bags exchanged with the proxy host.
//!
//! Every hook receives a JSON object describing one proxied message and
//! returns one. Byte-valued fields (`request`, `response`, `query`,
//! `startupMessage`) travel base64-encoded; address fields live in nested
//! `client`/`server` objects with `remote`/`local` keys.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single proxied message's attributes.
///
/// Thin wrapper over a JSON object providing the typed accessors the
/// hooks need. Missing or differently-typed fields read as absent; the
/// hooks treat absence as "not my message" and pass through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attrs {
    inner: Map<String, Value>,
}

impl Attrs {
    /// Creates an empty attribute bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a JSON value, if it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(inner) => Some(Self { inner }),
            _ => None,
        }
    }

    /// Returns a string attribute, or `""` when absent or non-string.
    pub fn str(&self, key: &str) -> &str {
        self.inner.get(key).and_then(Value::as_str).unwrap_or("")
    }

    /// Returns a string field of a nested object attribute, or `""`.
    ///
    /// `nested_str("client", "remote")` reads `attrs["client"]["remote"]`.
    pub fn nested_str(&self, key: &str, field: &str) -> &str {
        self.inner
            .get(key)
            .and_then(Value::as_object)
            .and_then(|obj| obj.get(field))
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// True when the attribute is a non-empty array.
    pub fn has_items(&self, key: &str) -> bool {
        self.inner
            .get(key)
            .and_then(Value::as_array)
            .is_some_and(|items| !items.is_empty())
    }

    /// True when the attribute exists at all, regardless of type.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// True when the bag carries the terminate signal.
    pub fn is_terminate(&self) -> bool {
        self.inner
            .get("terminate")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Sets a string attribute.
    pub fn set_str(&mut self, key: &str, value: impl Into<String>) {
        self.inner.insert(key.to_string(), Value::String(value.into()));
    }

    /// Sets an arbitrary JSON attribute.
    pub fn set(&mut self, key: &str, value: Value) {
        self.inner.insert(key.to_string(), value);
    }

    /// Builds the hit response: terminate signal plus the cached bytes.
    ///
    /// The host abandons its pipeline for this message and returns
    /// `response` to the client verbatim.
    pub fn terminate_with(response: impl Into<String>) -> Self {
        let mut attrs = Self::new();
        attrs.set("terminate", Value::Bool(true));
        attrs.set_str("response", response);
        attrs
    }

    /// Consumes the bag into a plain JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.inner)
    }
}
