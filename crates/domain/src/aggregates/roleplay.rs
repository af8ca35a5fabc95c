//! Roleplay aggregate - a player's daily batch of roleplay links.
//!
//! Each link is reviewed once by staff, who grade it with a [`DigestLevel`].
//! The grade feeds potion-digest progress on the player's profile. Like
//! submissions, the store persists a review only while the link is unreviewed.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{DomainError, ProfileId, RoleplayLinkId, RoleplaySubmissionId};

/// Staff grading of one roleplay link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestLevel {
    None,
    Low,
    Medium,
    High,
}

impl DigestLevel {
    /// Potion-digest progress this grade is worth.
    pub fn percent(&self) -> i32 {
        match self {
            Self::None => 0,
            Self::Low => 2,
            Self::Medium => 10,
            Self::High => 25,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for DigestLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigestLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(DomainError::parse(format!("unknown digest level: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkReview {
    pub level: DigestLevel,
    pub note: String,
    pub reviewed_by: ProfileId,
    pub reviewed_at: DateTime<Utc>,
}

/// One URL inside a roleplay submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleplayLink {
    id: RoleplayLinkId,
    submission_id: RoleplaySubmissionId,
    player_id: ProfileId,
    url: String,
    review: Option<LinkReview>,
}

impl RoleplayLink {
    #[inline]
    pub fn id(&self) -> RoleplayLinkId {
        self.id
    }

    #[inline]
    pub fn submission_id(&self) -> RoleplaySubmissionId {
        self.submission_id
    }

    #[inline]
    pub fn player_id(&self) -> ProfileId {
        self.player_id
    }

    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[inline]
    pub fn review(&self) -> Option<&LinkReview> {
        self.review.as_ref()
    }

    pub fn is_reviewed(&self) -> bool {
        self.review.is_some()
    }

    /// Grades the link. The note is mandatory and a link is graded once.
    pub fn review_with(
        &mut self,
        level: DigestLevel,
        note: &str,
        reviewer: ProfileId,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if self.is_reviewed() {
            return Err(DomainError::invalid_state_transition(format!(
                "roleplay link {} already reviewed",
                self.id
            )));
        }
        let note = note.trim();
        if note.is_empty() {
            return Err(DomainError::validation("review note required"));
        }
        self.review = Some(LinkReview {
            level,
            note: note.to_string(),
            reviewed_by: reviewer,
            reviewed_at: now,
        });
        Ok(())
    }
}

/// A player's roleplay links for one local day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleplaySubmission {
    id: RoleplaySubmissionId,
    player_id: ProfileId,
    submitted_on: NaiveDate,
    links: Vec<RoleplayLink>,
    created_at: DateTime<Utc>,
}

impl RoleplaySubmission {
    /// Trims the urls and drops blanks. At least one must remain.
    pub fn new<I, S>(
        player_id: ProfileId,
        urls: I,
        submitted_on: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let id = RoleplaySubmissionId::new();
        let links: Vec<RoleplayLink> = urls
            .into_iter()
            .map(|u| u.as_ref().trim().to_string())
            .filter(|u| !u.is_empty())
            .map(|url| RoleplayLink {
                id: RoleplayLinkId::new(),
                submission_id: id,
                player_id,
                url,
                review: None,
            })
            .collect();
        if links.is_empty() {
            return Err(DomainError::validation("at least one roleplay link required"));
        }

        Ok(Self {
            id,
            player_id,
            submitted_on,
            links,
            created_at: now,
        })
    }

    #[inline]
    pub fn id(&self) -> RoleplaySubmissionId {
        self.id
    }

    #[inline]
    pub fn player_id(&self) -> ProfileId {
        self.player_id
    }

    /// The player's local calendar day.
    #[inline]
    pub fn submitted_on(&self) -> NaiveDate {
        self.submitted_on
    }

    #[inline]
    pub fn links(&self) -> &[RoleplayLink] {
        &self.links
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
