//! JSON fixtures: a single object mapping document paths to document bodies.
//!
//! ```json
//! {
//!   "congregations/c1/territories/t1": { "code": "T1", "name": "North" },
//!   "congregations/c1/maps/m1": { "territory": "t1", "name": "Blk 1" }
//! }
//! ```

use crate::store::MemoryStore;
use fieldwork_core::error::{FieldworkError, Result};
use serde_json::Value;
use std::path::Path;

impl MemoryStore {
    /// Build a store from a fixture value.
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(entries) = value else {
            return Err(FieldworkError::Config(
                "fixture must be a JSON object keyed by document path".to_string(),
            ));
        };

        let store = MemoryStore::new();
        for (path, body) in entries {
            match body {
                Value::Object(data) => store.insert(path, data),
                other => {
                    return Err(FieldworkError::Config(format!(
                        "fixture entry {} is not an object: {}",
                        path, other
                    )))
                }
            }
        }
        Ok(store)
    }

    /// Every document, keyed by path.
    pub fn to_json(&self) -> Value {
        let state = self.state.lock();
        Value::Object(
            state
                .documents
                .iter()
                .map(|(path, data)| (path.clone(), Value::Object(data.clone())))
                .collect(),
        )
    }

    pub fn load_fixture(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let store = Self::from_json(serde_json::from_str(&raw)?)?;
        tracing::info!(path = %path.display(), documents = store.len(), "Loaded fixture");
        Ok(store)
    }

    pub fn save_fixture(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(&self.to_json())?;
        std::fs::write(path, data)?;
        tracing::debug!(path = %path.display(), "Saved fixture");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_fixture_roundtrip_through_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fixture.json");

        let store = MemoryStore::from_json(json!({
            "congregations/c1/territories/t1": {"code": "T1", "name": "North"},
            "congregations/c1/maps/m1": {"territory": "t1", "name": "Blk 1"},
        }))
        .unwrap();
        store.save_fixture(&path).unwrap();

        let loaded = MemoryStore::load_fixture(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(
            loaded.document("congregations/c1/maps/m1").unwrap()["name"],
            json!("Blk 1")
        );
    }

    #[test]
    fn test_rejects_malformed_fixture() {
        assert!(matches!(
            MemoryStore::from_json(json!([1, 2])),
            Err(FieldworkError::Config(_))
        ));
        assert!(matches!(
            MemoryStore::from_json(json!({"a/b": 3})),
            Err(FieldworkError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = MemoryStore::load_fixture(&temp_dir.path().join("nope.json"));
        assert!(matches!(result, Err(FieldworkError::Io(_))));
    }
}
