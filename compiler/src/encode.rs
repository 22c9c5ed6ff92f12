//! JSON encoding shared by every serializable declaration.
//!
//! The host reads a typed value as a single-key object whose key is the
//! class path and whose value holds the constructor arguments, e.g.
//! `{"/state/chain/sync": [...]}`.

use serde_json::{Map, Value};

/// Encodes a declaration in the host configuration format.
pub trait ToJson {
    /// Returns the JSON form of `self`.
    fn to_json(&self) -> Value;
}

/// Builds `{path: args}`.
pub(crate) fn class_form(path: impl Into<String>, args: Value) -> Value {
    let mut form = Map::with_capacity(1);
    form.insert(path.into(), args);
    Value::Object(form)
}
