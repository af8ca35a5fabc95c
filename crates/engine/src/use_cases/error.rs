//! Error taxonomy shared by every use case.

use covenant_domain::{DomainError, PolicyViolation, PunishmentUpdateError};

use crate::infrastructure::ports::RepoError;

#[derive(Debug, thiserror::Error)]
pub enum UseCaseError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A conditional transition lost, or the target is already terminal.
    #[error("{0}")]
    AlreadyResolved(String),

    /// A game rule refused the operation.
    #[error(transparent)]
    Policy(#[from] PolicyViolation),

    /// The store failed after validation passed.
    #[error("Repository error: {0}")]
    Persistence(RepoError),
}

impl UseCaseError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn already_resolved(message: impl Into<String>) -> Self {
        Self::AlreadyResolved(message.into())
    }

    /// Stable machine-readable name, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::AlreadyResolved(_) => "already_resolved",
            Self::Policy(_) => "policy_violation",
            Self::Persistence(_) => "persistence",
        }
    }
}

impl From<RepoError> for UseCaseError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound { entity_type, id } => Self::NotFound {
                entity: entity_type,
                id,
            },
            other => Self::Persistence(other),
        }
    }
}

impl From<DomainError> for UseCaseError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::Parse(msg) => Self::Validation(msg),
            DomainError::InvalidStateTransition(msg) => Self::AlreadyResolved(msg),
        }
    }
}

impl From<PunishmentUpdateError> for UseCaseError {
    fn from(err: PunishmentUpdateError) -> Self {
        match err {
            PunishmentUpdateError::Policy(violation) => Self::Policy(violation),
            PunishmentUpdateError::Invalid(domain) => domain.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_not_found_stays_not_found() {
        let err: UseCaseError = RepoError::not_found("Code", "abc").into();
        assert!(matches!(err, UseCaseError::NotFound { entity: "Code", .. }));

        let err: UseCaseError = RepoError::database("codes.get", "locked").into();
        assert_eq!(err.kind(), "persistence");
    }

    #[test]
    fn terminal_transition_maps_to_already_resolved() {
        let err: UseCaseError = DomainError::invalid_state_transition("already approved").into();
        assert!(matches!(err, UseCaseError::AlreadyResolved(_)));
    }

    #[test]
    fn policy_message_is_user_facing() {
        let err: UseCaseError = PolicyViolation::RepeatLimitReached { used: 2, max: 2 }.into();
        assert_eq!(err.to_string(), "repeat limit reached (2/2)");
        assert_eq!(err.kind(), "policy_violation");
    }

    #[test]
    fn validation_drops_domain_prefix() {
        let err: UseCaseError = DomainError::validation("evidence required").into();
        assert_eq!(err.to_string(), "evidence required");
    }
}
