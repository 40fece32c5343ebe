use super::document::{fields, DocumentData};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Visitation status of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    #[default]
    Default,
    Done,
    NotHome,
    DoNotCall,
    Invalid,
}

impl UnitStatus {
    /// Statuses that may take part in completion math.
    pub const COUNTABLE: [UnitStatus; 3] = [UnitStatus::Default, UnitStatus::Done, UnitStatus::NotHome];

    /// Numeric code used in store documents.
    pub fn code(self) -> i64 {
        match self {
            UnitStatus::Default => -1,
            UnitStatus::Done => 1,
            UnitStatus::NotHome => 2,
            UnitStatus::DoNotCall => 4,
            UnitStatus::Invalid => 5,
        }
    }

    /// Unknown codes decode to `Default`.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => UnitStatus::Done,
            2 => UnitStatus::NotHome,
            4 => UnitStatus::DoNotCall,
            5 => UnitStatus::Invalid,
            _ => UnitStatus::Default,
        }
    }

    /// Decode a stored status: numeric code, code string or status name.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .map(Self::from_code)
                .unwrap_or_default(),
            Some(Value::String(s)) => {
                let s = s.trim();
                if let Ok(code) = s.parse::<i64>() {
                    return Self::from_code(code);
                }
                Self::from_name(s).unwrap_or_default()
            }
            _ => UnitStatus::Default,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(UnitStatus::Default),
            "done" => Some(UnitStatus::Done),
            "not_home" => Some(UnitStatus::NotHome),
            "do_not_call" => Some(UnitStatus::DoNotCall),
            "invalid" => Some(UnitStatus::Invalid),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UnitStatus::Default => "default",
            UnitStatus::Done => "done",
            UnitStatus::NotHome => "not_home",
            UnitStatus::DoNotCall => "do_not_call",
            UnitStatus::Invalid => "invalid",
        }
    }

    pub fn is_countable(self) -> bool {
        Self::COUNTABLE.contains(&self)
    }
}

/// A single household within an address
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub map: String,
    pub territory: String,
    pub number: String,
    pub floor: i64,
    pub sequence: i64,
    pub status: UnitStatus,
    /// Household-type option ids. Ids of deleted options are kept as-is.
    pub types: Vec<String>,
    /// Not-home attempt count exactly as stored; may be non-numeric.
    pub nhcount: String,
    /// Do-not-call timestamp in epoch milliseconds, `0` when unset.
    pub dnctime: i64,
    pub note: String,
}

impl Unit {
    pub fn new(id: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            number: number.into(),
            ..Default::default()
        }
    }

    pub fn with_map(mut self, map: impl Into<String>) -> Self {
        self.map = map.into();
        self
    }

    pub fn with_floor(mut self, floor: i64) -> Self {
        self.floor = floor;
        self
    }

    pub fn with_sequence(mut self, sequence: i64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn with_status(mut self, status: UnitStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_nhcount(mut self, nhcount: impl ToString) -> Self {
        self.nhcount = nhcount.to_string();
        self
    }

    /// Decode a unit document, defaulting every missing or mistyped field.
    pub fn from_document(id: &str, data: &DocumentData) -> Self {
        Self {
            id: id.to_string(),
            map: fields::string(data, "map"),
            territory: fields::string(data, "territory"),
            number: fields::string(data, "number"),
            floor: fields::int(data, "floor"),
            sequence: fields::int(data, "sequence"),
            status: UnitStatus::from_value(data.get("status")),
            types: fields::string_list(data, "type"),
            nhcount: fields::string(data, "nhcount"),
            dnctime: fields::int(data, "dnctime"),
            note: fields::string(data, "note"),
        }
    }

    pub fn to_document(&self) -> DocumentData {
        let value = json!({
            "map": self.map,
            "territory": self.territory,
            "number": self.number,
            "floor": self.floor,
            "sequence": self.sequence,
            "status": self.status.code(),
            "type": self.types,
            "nhcount": self.nhcount,
            "dnctime": self.dnctime,
            "note": self.note,
        });
        match value {
            Value::Object(map) => map,
            _ => DocumentData::new(),
        }
    }

    /// Not-home attempts parsed the way the web client's `parseInt` does.
    ///
    /// Returns `None` when `nhcount` has no leading integer.
    pub fn not_home_tries(&self) -> Option<i64> {
        parse_int_prefix(&self.nhcount)
    }
}

/// Parse a leading decimal integer: optional whitespace, optional sign, then
/// digits. Trailing characters are ignored; no digits means no number.
pub fn parse_int_prefix(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    let digits = &rest[..digits_len];
    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}
