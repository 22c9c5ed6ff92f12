//! The output of compiling one unit.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::uri::Uri;

/// A compiled unit: one top-level key, the unit's URI, mapping to its
/// members and exports by name.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledDocument {
    uri: Uri,
    members: Map<String, Value>,
}

impl CompiledDocument {
    pub(crate) fn new(uri: Uri, members: Map<String, Value>) -> Self {
        Self { uri, members }
    }

    /// The unit's URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// The top-level key: the canonical string form of the unit's URI.
    #[must_use]
    pub fn key(&self) -> String {
        self.uri.to_string()
    }

    /// Serialized members and exports by name.
    #[must_use]
    pub fn members(&self) -> &Map<String, Value> {
        &self.members
    }

    /// Looks up one serialized member or export.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.members.get(name)
    }

    /// The full document, `{"<uri>": {...}}`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut doc = Map::with_capacity(1);
        doc.insert(self.key(), Value::Object(self.members.clone()));
        Value::Object(doc)
    }

    /// Consumes the document, returning its JSON form.
    #[must_use]
    pub fn into_json(self) -> Value {
        let mut doc = Map::with_capacity(1);
        doc.insert(self.uri.to_string(), Value::Object(self.members));
        Value::Object(doc)
    }
}

impl Serialize for CompiledDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_top_level_key() {
        let mut members = Map::new();
        members.insert("up".into(), json!(true));
        let doc = CompiledDocument::new("/test/app".parse().unwrap(), members);

        assert_eq!(doc.key(), "/test/app");
        assert_eq!(doc.get("up"), Some(&json!(true)));
        assert_eq!(doc.to_json(), json!({"/test/app": {"up": true}}));
        assert_eq!(serde_json::to_value(&doc).unwrap(), doc.clone().into_json());
    }
}
