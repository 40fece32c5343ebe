use super::document::{fields, DocumentData};
use serde::{Deserialize, Serialize};

/// Administrative grouping of addresses
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Territory {
    pub id: String,
    pub code: String,
    pub name: String,
}

impl Territory {
    pub fn new(id: impl Into<String>, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            name: name.into(),
        }
    }

    pub fn from_document(id: &str, data: &DocumentData) -> Self {
        Self {
            id: id.to_string(),
            code: fields::string(data, "code"),
            name: fields::string(data, "name"),
        }
    }
}
