//! Notification records handed to the dispatcher after a resolved transition.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{NotificationId, ProfileId, SubmissionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ActionApproved,
    QuestApproved,
    SleepApproved,
    ActionRejected,
    QuestRejected,
    SleepRejected,
    PunishmentMercy,
    PunishmentPenalty,
}

impl NotificationKind {
    pub fn approved(kind: SubmissionKind) -> Self {
        match kind {
            SubmissionKind::Action => Self::ActionApproved,
            SubmissionKind::Quest => Self::QuestApproved,
            SubmissionKind::Sleep => Self::SleepApproved,
        }
    }

    pub fn rejected(kind: SubmissionKind) -> Self {
        match kind {
            SubmissionKind::Action => Self::ActionRejected,
            SubmissionKind::Quest => Self::QuestRejected,
            SubmissionKind::Sleep => Self::SleepRejected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActionApproved => "action_approved",
            Self::QuestApproved => "quest_approved",
            Self::SleepApproved => "sleep_approved",
            Self::ActionRejected => "action_rejected",
            Self::QuestRejected => "quest_rejected",
            Self::SleepRejected => "sleep_rejected",
            Self::PunishmentMercy => "punishment_mercy",
            Self::PunishmentPenalty => "punishment_penalty",
        }
    }

    /// Dashboard page the notification points at.
    pub fn link(&self) -> &'static str {
        match self {
            Self::ActionApproved | Self::ActionRejected => "/dashboard/action-quest/actions",
            Self::QuestApproved | Self::QuestRejected => "/dashboard/action-quest/quests",
            Self::SleepApproved | Self::SleepRejected => "/dashboard/action-quest/sleep",
            Self::PunishmentMercy | Self::PunishmentPenalty => {
                "/dashboard/action-quest/punishments"
            }
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub target: ProfileId,
    pub actor: Option<ProfileId>,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        target: ProfileId,
        actor: Option<ProfileId>,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            target,
            actor,
            kind,
            title: title.into(),
            message: message.into(),
            link: kind.link().to_string(),
            created_at: now,
        }
    }
}
