//! Profile roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Who a profile belongs to. Staff and owners may review and enforce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Player,
    Staff,
    Owner,
}

impl Role {
    pub fn is_staff(&self) -> bool {
        matches!(self, Self::Staff | Self::Owner)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Staff => "staff",
            Self::Owner => "owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "player" => Ok(Self::Player),
            // Legacy role names from the dashboard
            "staff" | "admin" | "dm" => Ok(Self::Staff),
            "owner" => Ok(Self::Owner),
            other => Err(DomainError::parse(format!("Unknown role: {other}"))),
        }
    }
}
