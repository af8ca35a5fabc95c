//! Domain events
//!
//! Mutations return these so callers can report what actually changed.

use serde::{Deserialize, Serialize};

use crate::value_objects::Vitals;

/// Vitals before and after a ledger application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerChange {
    pub before: Vitals,
    pub after: Vitals,
}

impl LedgerChange {
    /// Net change in sanity.
    pub fn sanity_gained(&self) -> i32 {
        self.after.sanity() - self.before.sanity()
    }
}
