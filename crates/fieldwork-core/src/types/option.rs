use super::document::{fields, DocumentData};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Household-type option configured per congregation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HouseholdTypeOption {
    pub id: String,
    pub code: String,
    pub description: String,
    /// Units tagged with this option take part in completion math.
    pub is_countable: bool,
    /// Tag applied to newly provisioned units.
    pub is_default: bool,
    /// Display order.
    pub sequence: i64,
}

impl HouseholdTypeOption {
    pub fn new(id: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            ..Default::default()
        }
    }

    pub fn countable(mut self, is_countable: bool) -> Self {
        self.is_countable = is_countable;
        self
    }

    pub fn default_option(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    pub fn with_sequence(mut self, sequence: i64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn from_document(id: &str, data: &DocumentData) -> Self {
        Self {
            id: id.to_string(),
            code: fields::string(data, "code"),
            description: fields::string(data, "description"),
            is_countable: fields::boolean(data, "isCountable"),
            is_default: fields::boolean(data, "isDefault"),
            sequence: fields::int(data, "sequence"),
        }
    }

    pub fn to_document(&self) -> DocumentData {
        match json!({
            "code": self.code,
            "description": self.description,
            "isCountable": self.is_countable,
            "isDefault": self.is_default,
            "sequence": self.sequence,
        }) {
            Value::Object(map) => map,
            _ => DocumentData::new(),
        }
    }
}
