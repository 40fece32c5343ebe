use super::document::{fields, DocumentData};
use super::unit::Unit;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    #[default]
    Assignment,
    Personal,
}

impl LinkType {
    pub fn code(self) -> i64 {
        match self {
            LinkType::Assignment => 1,
            LinkType::Personal => 2,
        }
    }

    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Number(n)) if n.as_i64() == Some(2) => LinkType::Personal,
            Some(Value::String(s)) if s == "2" || s == "personal" => LinkType::Personal,
            _ => LinkType::Assignment,
        }
    }
}

/// Time-boxed shareable access to part of an address
///
/// Read-only to the assignee. A link is never revoked; it simply stops being
/// valid once the wall clock passes `end_timestamp`, or it is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkSession {
    pub id: String,
    pub link_type: LinkType,
    pub congregation: String,
    pub map: String,
    pub territory: String,
    /// Expiry in epoch milliseconds
    pub end_timestamp: i64,
    pub min_floor: Option<i64>,
    pub max_floor: Option<i64>,
    pub min_sequence: Option<i64>,
    pub max_sequence: Option<i64>,
    pub publisher_name: String,
    /// Creation time in epoch milliseconds
    pub created_at: i64,
}

impl LinkSession {
    /// New link for `map`, created at `now` and valid for `hours`.
    pub fn new(
        id: impl Into<String>,
        link_type: LinkType,
        map: impl Into<String>,
        now: DateTime<Utc>,
        hours: u32,
    ) -> Self {
        let created_at = now.timestamp_millis();
        Self {
            id: id.into(),
            link_type,
            map: map.into(),
            end_timestamp: created_at + Duration::hours(i64::from(hours)).num_milliseconds(),
            created_at,
            ..Default::default()
        }
    }

    pub fn with_floor_range(mut self, min: i64, max: i64) -> Self {
        self.min_floor = Some(min);
        self.max_floor = Some(max);
        self
    }

    pub fn with_sequence_range(mut self, min: i64, max: i64) -> Self {
        self.min_sequence = Some(min);
        self.max_sequence = Some(max);
        self
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.end_timestamp)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.end_timestamp <= now.timestamp_millis()
    }

    /// Time left before expiry, zero once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let left = self.end_timestamp - now.timestamp_millis();
        Duration::milliseconds(left.max(0))
    }

    /// Whether `unit` falls inside this link's map and floor/sequence bounds.
    pub fn covers(&self, unit: &Unit) -> bool {
        let within = |value: i64, min: Option<i64>, max: Option<i64>| {
            min.map_or(true, |min| value >= min) && max.map_or(true, |max| value <= max)
        };
        unit.map == self.map
            && within(unit.floor, self.min_floor, self.max_floor)
            && within(unit.sequence, self.min_sequence, self.max_sequence)
    }

    pub fn from_document(id: &str, data: &DocumentData) -> Self {
        Self {
            id: id.to_string(),
            link_type: LinkType::from_value(data.get("type")),
            congregation: fields::string(data, "congregation"),
            map: fields::string(data, "map"),
            territory: fields::string(data, "territory"),
            end_timestamp: fields::int(data, "endTimestamp"),
            min_floor: fields::optional_int(data, "minFloor"),
            max_floor: fields::optional_int(data, "maxFloor"),
            min_sequence: fields::optional_int(data, "minSequence"),
            max_sequence: fields::optional_int(data, "maxSequence"),
            publisher_name: fields::string(data, "publisherName"),
            created_at: fields::int(data, "createdAt"),
        }
    }

    pub fn to_document(&self) -> DocumentData {
        match json!({
            "type": self.link_type.code(),
            "congregation": self.congregation,
            "map": self.map,
            "territory": self.territory,
            "endTimestamp": self.end_timestamp,
            "minFloor": self.min_floor,
            "maxFloor": self.max_floor,
            "minSequence": self.min_sequence,
            "maxSequence": self.max_sequence,
            "publisherName": self.publisher_name,
            "createdAt": self.created_at,
        }) {
            Value::Object(map) => map,
            _ => DocumentData::new(),
        }
    }
}
