//! Skill entity - a pathway ability players cast by spending spirit.

use serde::{Deserialize, Serialize};

use crate::{DomainError, PathwayId, Profile, SkillId};

/// A castable skill definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    pub description: String,
    /// Pathway the skill belongs to; `None` for skills anyone may learn.
    pub pathway_id: Option<PathwayId>,
    /// Players at this rank or lower (more advanced) may cast it.
    pub sequence: u8,
    pub spirit_cost: i32,
}

impl Skill {
    pub fn new(
        name: impl Into<String>,
        sequence: u8,
        spirit_cost: i32,
    ) -> Result<Self, DomainError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("Skill name cannot be empty"));
        }
        if spirit_cost < 0 {
            return Err(DomainError::validation("Spirit cost cannot be negative"));
        }
        Ok(Self {
            id: SkillId::new(),
            name,
            description: String::new(),
            pathway_id: None,
            sequence,
            spirit_cost,
        })
    }


    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_pathway(mut self, pathway_id: PathwayId) -> Self {
        self.pathway_id = Some(pathway_id);
        self
    }

    /// Rank check only: a player's sequence must not exceed the skill's.
    pub fn rank_allows(&self, profile: &Profile) -> bool {
        profile.sequence() <= self.sequence
    }

    /// Pathway check: pathway-bound skills require the same pathway.
    pub fn pathway_allows(&self, profile: &Profile) -> bool {
        match self.pathway_id {
            Some(required) => profile.pathway_id() == Some(required),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::Role;

    #[test]
    fn lower_rank_number_is_more_advanced() {
        let pathway = PathwayId::new();
        let skill = Skill::new("Spirit Vision", 8, 2).unwrap().with_pathway(pathway);

        let novice = Profile::new("a", Role::Player, Utc::now()).with_pathway(pathway, 9);
        let adept = Profile::new("b", Role::Player, Utc::now()).with_pathway(pathway, 7);
        let exact = Profile::new("c", Role::Player, Utc::now()).with_pathway(pathway, 8);

        assert!(!skill.rank_allows(&novice));
        assert!(skill.rank_allows(&adept));
        assert!(skill.rank_allows(&exact));
    }

    #[test]
    fn pathway_bound_skill_requires_matching_pathway() {
        let skill = Skill::new("Flame Jump", 7, 3)
            .unwrap()
            .with_pathway(PathwayId::new());
        let outsider =
            Profile::new("d", Role::Player, Utc::now()).with_pathway(PathwayId::new(), 5);
        assert!(!skill.pathway_allows(&outsider));

        let open = Skill::new("Meditation", 9, 1).unwrap();
        assert!(open.pathway_allows(&outsider));
    }

    #[test]
    fn negative_cost_is_rejected() {
        assert!(Skill::new("Broken", 9, -1).is_err());
    }
}
