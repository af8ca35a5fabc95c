//! Evidence attached to a submission or a prayer.

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Opaque evidence references (usually image URLs), trimmed, never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Evidence(Vec<String>);

impl Evidence {
    /// Trims every entry and drops blanks; fails when nothing remains.
    pub fn new<I, S>(entries: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cleaned: Vec<String> = entries
            .into_iter()
            .map(|e| e.as_ref().trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();

        if cleaned.is_empty() {
            return Err(DomainError::validation("evidence required"));
        }
        Ok(Self(cleaned))
    }

    /// Evidence that must contain at least `min` entries.
    pub fn with_minimum<I, S>(entries: I, min: usize) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let evidence = Self::new(entries)?;
        if evidence.len() < min {
            return Err(DomainError::validation(format!(
                "at least {min} evidence entries required"
            )));
        }
        Ok(evidence)
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<String>> for Evidence {
    type Error = DomainError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Evidence> for Vec<String> {
    fn from(value: Evidence) -> Self {
        value.0
    }
}
