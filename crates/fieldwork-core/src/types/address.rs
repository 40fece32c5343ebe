use super::document::{fields, DocumentData};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    #[default]
    Public,
    Private,
    SingleStory,
    MultiStory,
}

impl AddressType {
    pub fn code(self) -> i64 {
        match self {
            AddressType::Public => 1,
            AddressType::Private => 2,
            AddressType::SingleStory => 3,
            AddressType::MultiStory => 4,
        }
    }

    /// Decode a numeric code or a type name; unknown values are `Public`.
    pub fn from_value(value: Option<&Value>) -> Self {
        let code = match value {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => match s.trim() {
                "public" => return AddressType::Public,
                "private" => return AddressType::Private,
                "single_story" => return AddressType::SingleStory,
                "multi_story" => return AddressType::MultiStory,
                other => other.parse().ok(),
            },
            _ => None,
        };
        match code {
            Some(2) => AddressType::Private,
            Some(3) => AddressType::SingleStory,
            Some(4) => AddressType::MultiStory,
            _ => AddressType::Public,
        }
    }

    /// Floors are listed top-down only for multi-story buildings.
    pub fn floors_descending(self) -> bool {
        matches!(self, AddressType::MultiStory)
    }
}

/// Pre-aggregated progress kept on the address document
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AddressProgress {
    /// Completion percentage, 0..=100
    pub aggregate: f64,
    pub done: u64,
    pub notdone: u64,
    pub nothome: u64,
}

impl AddressProgress {
    pub fn from_document(data: &DocumentData) -> Self {
        let count = |key: &str| fields::int(data, key).max(0) as u64;
        Self {
            aggregate: fields::float(data, "value").clamp(0.0, 100.0),
            done: count("done"),
            notdone: count("notdone"),
            nothome: count("nothome"),
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "value": self.aggregate,
            "done": self.done,
            "notdone": self.notdone,
            "nothome": self.nothome,
        })
    }
}

/// An address ("map"): a building or address grouping of floors and units
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Address {
    pub id: String,
    pub territory: String,
    pub name: String,
    pub postal: String,
    pub location: String,
    pub address_type: AddressType,
    pub progress: AddressProgress,
    pub feedback: String,
    pub instructions: String,
}

impl Address {
    pub fn new(id: impl Into<String>, territory: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            territory: territory.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, address_type: AddressType) -> Self {
        self.address_type = address_type;
        self
    }

    pub fn with_aggregate(mut self, aggregate: f64) -> Self {
        self.progress.aggregate = aggregate;
        self
    }

    pub fn from_document(id: &str, data: &DocumentData) -> Self {
        Self {
            id: id.to_string(),
            territory: fields::string(data, "territory"),
            name: fields::string(data, "name"),
            postal: fields::string(data, "postal"),
            location: fields::string(data, "location"),
            address_type: AddressType::from_value(data.get("type")),
            progress: fields::object(data, "aggregates")
                .map(AddressProgress::from_document)
                .unwrap_or_default(),
            feedback: fields::string(data, "feedback"),
            instructions: fields::string(data, "instructions"),
        }
    }

    pub fn to_document(&self) -> DocumentData {
        match json!({
            "territory": self.territory,
            "name": self.name,
            "postal": self.postal,
            "location": self.location,
            "type": self.address_type.code(),
            "aggregates": self.progress.to_value(),
            "feedback": self.feedback,
            "instructions": self.instructions,
        }) {
            Value::Object(map) => map,
            _ => DocumentData::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_document() {
        let data = match json!({
            "territory": "t1",
            "name": "Blk 10",
            "type": 4,
            "aggregates": {"value": 55, "done": 11, "notdone": 9, "nothome": "2"}
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        let address = Address::from_document("m1", &data);
        assert_eq!(address.address_type, AddressType::MultiStory);
        assert_eq!(address.progress.aggregate, 55.0);
        assert_eq!(address.progress.done, 11);
        assert_eq!(address.progress.nothome, 2);
        assert_eq!(address.feedback, "");

        let back = Address::from_document("m1", &address.to_document());
        assert_eq!(back, address);
    }

    #[test]
    fn test_missing_aggregates_default_to_zero() {
        let address = Address::from_document("m1", &DocumentData::new());
        assert_eq!(address.progress, AddressProgress::default());
        assert_eq!(address.address_type, AddressType::Public);
    }

    #[test]
    fn test_non_finite_aggregate_reads_as_zero() {
        let data = match json!({"aggregates": {"value": "NaN", "done": 1}}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        let progress = Address::from_document("m1", &data).progress;
        assert_eq!(progress.aggregate, 0.0);
        assert_eq!(progress.done, 1);
    }
}
