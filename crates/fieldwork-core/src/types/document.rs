use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Raw document body as held by the store
pub type DocumentData = serde_json::Map<String, Value>;

/// Reference to a single document: `{collection path}/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocRef {
    path: String,
}

impl DocRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Reference to document `id` inside `collection`.
    pub fn child(collection: &str, id: &str) -> Self {
        Self {
            path: format!("{}/{}", collection.trim_end_matches('/'), id),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment.
    pub fn id(&self) -> &str {
        match self.path.rsplit_once('/') {
            Some((_, id)) => id,
            None => &self.path,
        }
    }

    /// Everything before the last path segment.
    pub fn collection(&self) -> &str {
        match self.path.rsplit_once('/') {
            Some((collection, _)) => collection,
            None => "",
        }
    }
}

impl fmt::Display for DocRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// A document read from the store
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub reference: DocRef,
    pub data: DocumentData,
}

impl Document {
    pub fn new(reference: DocRef, data: DocumentData) -> Self {
        Self { reference, data }
    }

    pub fn id(&self) -> &str {
        self.reference.id()
    }
}

/// Lenient field readers. Every reader falls back to an empty value instead of
/// failing, so a malformed document still decodes into a usable record.
pub(crate) mod fields {
    use super::DocumentData;
    use serde_json::Value;

    /// Scalar rendered as a string; anything else is `""`.
    pub fn string(data: &DocumentData, key: &str) -> String {
        match data.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    /// Integer from a number (floats truncate) or a numeric string; else `0`.
    pub fn int(data: &DocumentData, key: &str) -> i64 {
        match data.get(key) {
            Some(value) => value_as_int(value).unwrap_or(0),
            None => 0,
        }
    }

    pub fn optional_int(data: &DocumentData, key: &str) -> Option<i64> {
        data.get(key).and_then(value_as_int)
    }

    /// Finite float from a number or numeric string; else `0.0`.
    pub fn float(data: &DocumentData, key: &str) -> f64 {
        let value = match data.get(key) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };
        value.filter(|f: &f64| f.is_finite()).unwrap_or(0.0)
    }

    pub fn boolean(data: &DocumentData, key: &str) -> bool {
        match data.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == "true",
            Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
            _ => false,
        }
    }

    /// List of scalar ids. A lone scalar is treated as a one-element list.
    pub fn string_list(data: &DocumentData, key: &str) -> Vec<String> {
        match data.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
            Some(Value::Number(n)) => vec![n.to_string()],
            _ => Vec::new(),
        }
    }

    pub fn object<'a>(data: &'a DocumentData, key: &str) -> Option<&'a DocumentData> {
        match data.get(key) {
            Some(Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    fn value_as_int(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}
