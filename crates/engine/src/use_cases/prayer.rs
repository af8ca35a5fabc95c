//! Prayer: a player at a church of their own religion recovers sanity.

use std::sync::Arc;

use covenant_domain::{
    ActivityEntry, ActivityLog, Evidence, LandmarkId, LedgerChange, PolicyViolation, ProfileId,
    ResourceDelta,
};

use super::shared::{load_profile, record_activity};
use super::UseCaseError;
use crate::infrastructure::ports::{ActivityLogRepo, ClockPort, MapRepo, ProfileRepo};

/// Fewest evidence entries a prayer accepts.
pub const MIN_PRAYER_EVIDENCE: usize = 2;

#[derive(Debug, Clone)]
pub struct PrayerOutcome {
    pub landmark_id: LandmarkId,
    pub sanity_gained: i32,
    pub change: LedgerChange,
}

pub struct SubmitPrayer {
    profiles: Arc<dyn ProfileRepo>,
    map: Arc<dyn MapRepo>,
    activity: Arc<dyn ActivityLogRepo>,
    clock: Arc<dyn ClockPort>,
}

impl SubmitPrayer {
    pub fn new(
        profiles: Arc<dyn ProfileRepo>,
        map: Arc<dyn MapRepo>,
        activity: Arc<dyn ActivityLogRepo>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            profiles,
            map,
            activity,
            clock,
        }
    }

    /// Gain is one sanity per evidence entry, capped at what is missing.
    pub async fn execute(
        &self,
        player_id: ProfileId,
        evidence: Vec<String>,
    ) -> Result<PrayerOutcome, UseCaseError> {
        let mut profile = load_profile(self.profiles.as_ref(), player_id).await?;
        let religion = profile.religion_id().ok_or(PolicyViolation::NoReligion)?;
        let vitals = profile.vitals();
        if vitals.sanity() >= vitals.max_sanity() {
            return Err(PolicyViolation::SanityFull.into());
        }

        let token = self
            .map
            .get_player_token(player_id)
            .await?
            .ok_or(PolicyViolation::NotInRequiredLocation)?;
        let church = self
            .map
            .list_landmarks(token.map_id)
            .await?
            .into_iter()
            .find(|l| l.is_church_of(religion) && l.contains(token.position))
            .ok_or(PolicyViolation::NotNearChurch)?;

        let evidence = Evidence::with_minimum(evidence, MIN_PRAYER_EVIDENCE)?;

        let missing = vitals.max_sanity() - vitals.sanity();
        let count = i32::try_from(evidence.len()).unwrap_or(i32::MAX);
        let gain = count.min(missing);
        let change = profile.apply_delta(&ResourceDelta::ZERO.with_sanity(gain));
        self.profiles.save(&profile).await?;

        let sanity_gained = change.sanity_gained();
        tracing::info!(
            player_id = %player_id,
            landmark_id = %church.id,
            sanity_gained,
            "Prayer accepted"
        );

        record_activity(
            self.activity.as_ref(),
            ActivityLog::new(
                player_id,
                Some(player_id),
                ActivityEntry::Prayer {
                    landmark_id: church.id,
                    evidence_count: evidence.len(),
                    sanity_gained,
                },
                self.clock.now(),
            ),
        )
        .await;

        Ok(PrayerOutcome {
            landmark_id: church.id,
            sanity_gained,
            change,
        })
    }
}
