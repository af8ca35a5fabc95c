//! Dice values for skill casts.

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Number of faces on the cast die.
pub const CAST_DIE_FACES: i32 = 20;

/// The success threshold a reviewer communicates for a cast (1-20).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct SuccessThreshold(i32);

impl SuccessThreshold {
    pub fn new(value: i32) -> Result<Self, DomainError> {
        if !(1..=CAST_DIE_FACES).contains(&value) {
            return Err(DomainError::validation(format!(
                "threshold must be between 1 and {CAST_DIE_FACES}, got {value}"
            )));
        }
        Ok(Self(value))
    }

    #[inline]
    pub fn value(&self) -> i32 {
        self.0
    }

    /// A roll meets the threshold when it is greater than or equal to it.
    pub fn is_met_by(&self, roll: i32) -> bool {
        roll >= self.0
    }
}

impl TryFrom<i32> for SuccessThreshold {
    type Error = DomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SuccessThreshold> for i32 {
    fn from(value: SuccessThreshold) -> Self {
        value.0
    }
}
