//! Citation tokens for skill casts.
//!
//! A reference encodes who cast, when, and how the roll went, e.g.
//! `SKL-3F9A12032025-T15-R17-S`. It is a display token only: two casts by the
//! same player on the same day with the same threshold and roll produce the
//! same reference. Nothing looks casts up by it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProfileId;

/// Where the cast skill came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastSource {
    Pathway,
    Granted,
}

impl CastSource {
    fn prefix(&self) -> &'static str {
        match self {
            Self::Pathway => "SKL",
            Self::Granted => "GS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CastReference(String);

impl CastReference {
    pub fn new(
        source: CastSource,
        player: ProfileId,
        (day, month, year): (u32, u32, i32),
        threshold: i32,
        roll: i32,
        success: bool,
    ) -> Self {
        let hex = player.as_uuid().simple().to_string().to_uppercase();
        let fragment = &hex[hex.len().saturating_sub(4)..];
        let flag = if success { 'S' } else { 'F' };
        Self(format!(
            "{}-{fragment}{day:02}{month:02}{year:04}-T{threshold}-R{roll}-{flag}",
            source.prefix()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CastReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn encodes_player_date_and_roll() {
        let player = ProfileId::from_uuid(
            Uuid::parse_str("0b8c2f0e-4d1a-4c7e-9a55-12ab34cd3f9a").unwrap(),
        );
        let reference = CastReference::new(CastSource::Pathway, player, (3, 7, 2025), 15, 17, true);
        assert_eq!(reference.as_str(), "SKL-3F9A03072025-T15-R17-S");

        let granted = CastReference::new(CastSource::Granted, player, (3, 7, 2025), 15, 2, false);
        assert_eq!(granted.as_str(), "GS-3F9A03072025-T15-R2-F");
    }
}
