use crate::types::Skill;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SkillProfile
// ---------------------------------------------------------------------------

/// Current soft-skill scores for one user, each in [0, 100]. Owned by the
/// scoring pipeline; the plan engine reads it and only mutates it through
/// the level-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillProfile {
    pub communication: f64,
    pub emotional_intelligence: f64,
    pub critical_thinking: f64,
    pub time_management: f64,
    pub leadership: f64,
    pub updated_at: DateTime<Utc>,
}

impl SkillProfile {
    pub fn new(
        communication: f64,
        emotional_intelligence: f64,
        critical_thinking: f64,
        time_management: f64,
        leadership: f64,
    ) -> Self {
        Self {
            communication: clamp(communication),
            emotional_intelligence: clamp(emotional_intelligence),
            critical_thinking: clamp(critical_thinking),
            time_management: clamp(time_management),
            leadership: clamp(leadership),
            updated_at: Utc::now(),
        }
    }

    pub fn score(&self, skill: Skill) -> f64 {
        match skill {
            Skill::Communication => self.communication,
            Skill::EmotionalIntelligence => self.emotional_intelligence,
            Skill::CriticalThinking => self.critical_thinking,
            Skill::TimeManagement => self.time_management,
            Skill::Leadership => self.leadership,
        }
    }

    pub fn score_mut(&mut self, skill: Skill) -> &mut f64 {
        match skill {
            Skill::Communication => &mut self.communication,
            Skill::EmotionalIntelligence => &mut self.emotional_intelligence,
            Skill::CriticalThinking => &mut self.critical_thinking,
            Skill::TimeManagement => &mut self.time_management,
            Skill::Leadership => &mut self.leadership,
        }
    }

    pub fn average(&self) -> f64 {
        Skill::all().iter().map(|&s| self.score(s)).sum::<f64>() / Skill::all().len() as f64
    }

    /// The three lowest-scoring skills, weakest first. Stable sort, so ties
    /// break by skill declaration order.
    pub fn weaknesses(&self) -> Vec<Skill> {
        let mut skills: Vec<Skill> = Skill::all().to_vec();
        skills.sort_by(|a, b| {
            self.score(*a)
                .partial_cmp(&self.score(*b))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        skills.truncate(3);
        skills
    }

    /// Blend new analysis scores in with a weighted average. `weight` is the
    /// share of the new scores, in [0, 1]. Results stay clamped to [0, 100].
    pub fn apply_scores(&mut self, new: &SkillScores, weight: f64) {
        let w = weight.clamp(0.0, 1.0);
        for &skill in Skill::all() {
            let old = self.score(skill);
            *self.score_mut(skill) = clamp(old * (1.0 - w) + new.score(skill) * w);
        }
        self.updated_at = Utc::now();
    }

    /// Raise each score to at least `floor`, but always by at least `step`,
    /// capped at 100. Used by the level-up.
    pub fn raise_to_floor(&mut self, floor: f64, step: f64) {
        for &skill in Skill::all() {
            let current = self.score(skill);
            *self.score_mut(skill) = clamp((current + step).max(floor));
        }
        self.updated_at = Utc::now();
    }

    pub fn snapshot(&self) -> ProfileSnapshot {
        ProfileSnapshot {
            communication: self.communication,
            emotional_intelligence: self.emotional_intelligence,
            critical_thinking: self.critical_thinking,
            time_management: self.time_management,
            leadership: self.leadership,
            created_at: Utc::now(),
        }
    }
}

fn clamp(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

// ---------------------------------------------------------------------------
// SkillScores / ProfileSnapshot
// ---------------------------------------------------------------------------

/// One set of analysis scores, as produced by the scoring pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillScores {
    pub communication: f64,
    pub emotional_intelligence: f64,
    pub critical_thinking: f64,
    pub time_management: f64,
    pub leadership: f64,
}

impl SkillScores {
    pub fn score(&self, skill: Skill) -> f64 {
        match skill {
            Skill::Communication => self.communication,
            Skill::EmotionalIntelligence => self.emotional_intelligence,
            Skill::CriticalThinking => self.critical_thinking,
            Skill::TimeManagement => self.time_management,
            Skill::Leadership => self.leadership,
        }
    }
}

/// Point-in-time copy of a profile, appended to history before every update
/// and after every level-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub communication: f64,
    pub emotional_intelligence: f64,
    pub critical_thinking: f64,
    pub time_management: f64,
    pub leadership: f64,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(c: f64, e: f64, ct: f64, t: f64, l: f64) -> SkillProfile {
        SkillProfile::new(c, e, ct, t, l)
    }

    #[test]
    fn average_of_five() {
        let p = profile(10.0, 20.0, 30.0, 40.0, 50.0);
        assert_eq!(p.average(), 30.0);
    }

    #[test]
    fn weaknesses_are_bottom_three() {
        let p = profile(80.0, 20.0, 60.0, 10.0, 40.0);
        assert_eq!(
            p.weaknesses(),
            vec![
                Skill::TimeManagement,
                Skill::EmotionalIntelligence,
                Skill::Leadership
            ]
        );
    }

    #[test]
    fn weakness_ties_break_by_declaration_order() {
        let p = profile(50.0, 50.0, 50.0, 50.0, 50.0);
        assert_eq!(
            p.weaknesses(),
            vec![
                Skill::Communication,
                Skill::EmotionalIntelligence,
                Skill::CriticalThinking
            ]
        );
    }

    #[test]
    fn weaknesses_always_three_distinct() {
        let p = profile(1.0, 2.0, 3.0, 4.0, 5.0);
        let w = p.weaknesses();
        assert_eq!(w.len(), 3);
        assert!(w.windows(2).all(|pair| pair[0] != pair[1]));
    }

    #[test]
    fn apply_scores_blends_and_clamps() {
        let mut p = profile(50.0, 50.0, 50.0, 50.0, 50.0);
        let new = SkillScores {
            communication: 100.0,
            emotional_intelligence: 0.0,
            critical_thinking: 50.0,
            time_management: 90.0,
            leadership: 10.0,
        };
        p.apply_scores(&new, 0.3);
        assert_eq!(p.communication, 65.0);
        assert_eq!(p.emotional_intelligence, 35.0);
        assert_eq!(p.critical_thinking, 50.0);
    }

    #[test]
    fn raise_to_floor_applies_step_and_cap() {
        let mut p = profile(30.0, 44.0, 45.0, 98.0, 10.0);
        p.raise_to_floor(45.0, 8.0);
        assert_eq!(p.communication, 45.0); // floor wins over 30+8
        assert_eq!(p.emotional_intelligence, 52.0); // 44+8 wins over floor
        assert_eq!(p.critical_thinking, 53.0);
        assert_eq!(p.time_management, 100.0); // capped
        assert_eq!(p.leadership, 45.0);
    }

    #[test]
    fn constructor_clamps() {
        let p = profile(-5.0, 105.0, 50.0, 50.0, 50.0);
        assert_eq!(p.communication, 0.0);
        assert_eq!(p.emotional_intelligence, 100.0);
    }
}
