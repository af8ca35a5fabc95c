//! Submission aggregate - one reviewed player attempt.
//!
//! `pending -[approve]-> approved`, `pending -[reject]-> rejected`; both
//! terminal. The in-memory transition here is only half the story: the store
//! must persist it with a conditional write keyed on `status = pending`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Evidence;
use crate::{CodeId, CodeKind, DomainError, ProfileId, SubmissionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionKind {
    Action,
    Quest,
    Sleep,
}

impl SubmissionKind {
    /// Lookup precedence for prefix searches.
    pub const SEARCH_ORDER: [SubmissionKind; 3] = [Self::Action, Self::Quest, Self::Sleep];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Quest => "quest",
            Self::Sleep => "sleep",
        }
    }

    /// Action and quest rejections must explain themselves.
    pub fn requires_rejection_reason(&self) -> bool {
        !matches!(self, Self::Sleep)
    }
}

impl From<CodeKind> for SubmissionKind {
    fn from(kind: CodeKind) -> Self {
        match kind {
            CodeKind::Action => Self::Action,
            CodeKind::Quest => Self::Quest,
        }
    }
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "action" => Ok(Self::Action),
            "quest" => Ok(Self::Quest),
            "sleep" => Ok(Self::Sleep),
            other => Err(DomainError::parse(format!("Unknown submission kind: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(DomainError::parse(format!("Unknown submission status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    id: SubmissionId,
    kind: SubmissionKind,
    player_id: ProfileId,
    code_id: Option<CodeId>,
    evidence: Evidence,
    status: SubmissionStatus,
    reviewed_by: Option<ProfileId>,
    reviewed_at: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl Submission {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// A pending submission against an action or quest code.
    pub fn for_code(
        kind: CodeKind,
        player_id: ProfileId,
        code_id: CodeId,
        evidence: Evidence,
        now: DateTime<Utc>,
    ) -> Self {
        Self::pending(kind.into(), player_id, Some(code_id), evidence, now)
    }

    /// A pending sleep request (no code).
    pub fn sleep(player_id: ProfileId, evidence: Evidence, now: DateTime<Utc>) -> Self {
        Self::pending(SubmissionKind::Sleep, player_id, None, evidence, now)
    }

    fn pending(
        kind: SubmissionKind,
        player_id: ProfileId,
        code_id: Option<CodeId>,
        evidence: Evidence,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SubmissionId::new(),
            kind,
            player_id,
            code_id,
            evidence,
            status: SubmissionStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            created_at: now,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> SubmissionId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> SubmissionKind {
        self.kind
    }

    #[inline]
    pub fn player_id(&self) -> ProfileId {
        self.player_id
    }

    #[inline]
    pub fn code_id(&self) -> Option<CodeId> {
        self.code_id
    }

    #[inline]
    pub fn evidence(&self) -> &Evidence {
        &self.evidence
    }

    #[inline]
    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.status == SubmissionStatus::Pending
    }

    /// `None` when the automatic resolver approved it.
    #[inline]
    pub fn reviewed_by(&self) -> Option<ProfileId> {
        self.reviewed_by
    }

    #[inline]
    pub fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.reviewed_at
    }

    #[inline]
    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }


    // =========================================================================
    // Transitions
    // =========================================================================

    pub fn approve(
        &mut self,
        reviewer: Option<ProfileId>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.ensure_pending()?;
        self.status = SubmissionStatus::Approved;
        self.reviewed_by = reviewer;
        self.reviewed_at = Some(now);
        Ok(())
    }

    /// Rejects the submission. Action and quest rejections need a non-blank reason.
    pub fn reject(
        &mut self,
        reviewer: Option<ProfileId>,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.ensure_pending()?;
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        if reason.is_none() && self.kind.requires_rejection_reason() {
            return Err(DomainError::validation("rejection reason required"));
        }

        self.status = SubmissionStatus::Rejected;
        self.reviewed_by = reviewer;
        self.reviewed_at = Some(now);
        self.rejection_reason = reason;
        Ok(())
    }

    fn ensure_pending(&self) -> Result<(), DomainError> {
        if self.is_pending() {
            Ok(())
        } else {
            Err(DomainError::invalid_state_transition(format!(
                "{} submission {} is already {}",
                self.kind, self.id, self.status
            )))
        }
    }
}
