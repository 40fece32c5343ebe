use serde::Serialize;
use std::fmt;

/// Kind of live subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Addresses of a territory, keyed by territory id
    Map,
    /// Units of one address, keyed by map id
    Address,
    /// Link sessions of a territory, keyed by territory id
    Link,
    /// Territories of a congregation, keyed by congregation id
    Territory,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Map,
        Category::Address,
        Category::Link,
        Category::Territory,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Map => "map",
            Category::Address => "address",
            Category::Link => "link",
            Category::Territory => "territory",
        }
    }

    /// Whether at most one key may be open at a time. Address listeners are
    /// keyed per map and any number may be live.
    pub fn is_single_scope(self) -> bool {
        !matches!(self, Category::Address)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of one category's listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerPhase {
    /// Never opened
    #[default]
    Inactive,
    /// Subscribed, waiting for the first snapshot
    Subscribing,
    /// At least one snapshot applied
    Active,
    /// Closed; state cleared
    TornDown,
}

/// Result of [`ListenerRegistry::open`](crate::ListenerRegistry::open)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// A new store subscription was opened.
    Subscribed,
    /// The key was already live; nothing changed.
    AlreadyOpen,
    /// An already-live address was opened again and its visibility flipped.
    Toggled { visible: bool },
}
