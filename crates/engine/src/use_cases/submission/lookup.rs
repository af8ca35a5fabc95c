//! Reviewer lookup of pending submissions by a short id fragment.

use std::sync::Arc;

use covenant_domain::{Submission, SubmissionId, SubmissionKind};
use uuid::Uuid;

use crate::infrastructure::ports::SubmissionRepo;
use crate::use_cases::UseCaseError;

/// Shortest fragment accepted for a prefix match.
const MIN_PREFIX_LEN: usize = 4;

/// Finds a pending submission from a full id or an id prefix.
///
/// Kinds are searched in [`SubmissionKind::SEARCH_ORDER`]; within a kind an
/// exact id wins over a prefix, and among prefix matches the oldest wins.
pub struct FindPendingSubmission {
    submissions: Arc<dyn SubmissionRepo>,
}

impl FindPendingSubmission {
    pub fn new(submissions: Arc<dyn SubmissionRepo>) -> Self {
        Self { submissions }
    }

    pub async fn execute(&self, raw: &str) -> Result<Option<Submission>, UseCaseError> {
        let needle = raw.trim().to_lowercase();
        if needle.is_empty() {
            return Err(UseCaseError::validation("submission id required"));
        }
        if !needle.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
            return Err(UseCaseError::validation(
                "submission id may only contain hex digits and dashes",
            ));
        }

        let exact = Uuid::parse_str(&needle).ok().map(SubmissionId::from);

        for kind in SubmissionKind::SEARCH_ORDER {
            if let Some(id) = exact {
                if let Some(found) = self.submissions.get_pending(kind, id).await? {
                    return Ok(Some(found));
                }
            }
            if needle.len() >= MIN_PREFIX_LEN {
                if let Some(found) = self.submissions.find_pending_by_prefix(kind, &needle).await? {
                    return Ok(Some(found));
                }
            }
        }

        tracing::debug!(prefix = %needle, "No pending submission matched");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use covenant_domain::{CodeId, CodeKind, Evidence, ProfileId};

    use super::*;
    use crate::infrastructure::ports::MockSubmissionRepo;

    fn quest() -> Submission {
        Submission::for_code(
            CodeKind::Quest,
            ProfileId::new(),
            CodeId::new(),
            Evidence::new(["https://img/q.png"]).unwrap(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn searches_action_before_quest() {
        let found = quest();
        let expected = found.id();

        let mut repo = MockSubmissionRepo::new();
        repo.expect_find_pending_by_prefix()
            .withf(|kind, prefix| *kind == SubmissionKind::Action && prefix == "ab12")
            .times(1)
            .returning(|_, _| Ok(None));
        repo.expect_find_pending_by_prefix()
            .withf(|kind, _| *kind == SubmissionKind::Quest)
            .times(1)
            .returning(move |_, _| Ok(Some(found.clone())));

        let use_case = FindPendingSubmission::new(Arc::new(repo));
        let result = use_case.execute("  AB12 ").await.unwrap().unwrap();
        assert_eq!(result.id(), expected);
    }

    #[tokio::test]
    async fn exact_id_is_tried_first() {
        let found = quest();
        let id = found.id();

        let mut repo = MockSubmissionRepo::new();
        repo.expect_get_pending()
            .withf(move |kind, candidate| *kind == SubmissionKind::Action && *candidate == id)
            .returning(|_, _| Ok(None));
        repo.expect_find_pending_by_prefix()
            .withf(|kind, _| *kind == SubmissionKind::Action)
            .returning(|_, _| Ok(None));
        repo.expect_get_pending()
            .withf(move |kind, candidate| *kind == SubmissionKind::Quest && *candidate == id)
            .returning(move |_, _| Ok(Some(found.clone())));

        let use_case = FindPendingSubmission::new(Arc::new(repo));
        let result = use_case.execute(&id.to_string()).await.unwrap().unwrap();
        assert_eq!(result.id(), id);
    }

    #[tokio::test]
    async fn short_fragment_skips_prefix_search() {
        // No expectations: any repo call would panic.
        let use_case = FindPendingSubmission::new(Arc::new(MockSubmissionRepo::new()));
        assert!(use_case.execute("ab1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn non_hex_input_is_rejected() {
        let use_case = FindPendingSubmission::new(Arc::new(MockSubmissionRepo::new()));
        let err = use_case.execute("ab%1").await.unwrap_err();
        assert!(matches!(err, UseCaseError::Validation(_)));
    }
}
