//! Shared port data types.

/// Result of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The guard held and every paired write committed.
    Applied,
    /// The guard failed (another writer got there first); nothing was written.
    AlreadyResolved,
}

impl TransitionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}
