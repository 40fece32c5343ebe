use serde::{Deserialize, Serialize};

/// Access role of the current user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Administrator,
    Conductor,
    ReadOnly,
    Publisher,
    #[default]
    Unknown,
}

impl Role {
    /// Decode a role name or an access-level code. Anything unrecognised is
    /// `Unknown`.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "administrator" | "3" => Role::Administrator,
            "conductor" | "2" => Role::Conductor,
            "read_only" | "1" => Role::ReadOnly,
            "publisher" | "-1" => Role::Publisher,
            _ => Role::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::Conductor => "conductor",
            Role::ReadOnly => "read_only",
            Role::Publisher => "publisher",
            Role::Unknown => "unknown",
        }
    }

    /// Roles that reach the engine through the admin console.
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Administrator | Role::Conductor | Role::ReadOnly)
    }
}
