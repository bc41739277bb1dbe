use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Skill
// ---------------------------------------------------------------------------

/// The five tracked soft skills. Declaration order is load-bearing: ties in
/// score sorts are broken by this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    Communication,
    EmotionalIntelligence,
    CriticalThinking,
    TimeManagement,
    Leadership,
}

impl Skill {
    pub fn all() -> &'static [Skill] {
        &[
            Skill::Communication,
            Skill::EmotionalIntelligence,
            Skill::CriticalThinking,
            Skill::TimeManagement,
            Skill::Leadership,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Skill::Communication => "communication",
            Skill::EmotionalIntelligence => "emotional_intelligence",
            Skill::CriticalThinking => "critical_thinking",
            Skill::TimeManagement => "time_management",
            Skill::Leadership => "leadership",
        }
    }

    /// Human-facing name used in plan weaknesses and recommendations.
    pub fn display_name(self) -> &'static str {
        match self {
            Skill::Communication => "Communication",
            Skill::EmotionalIntelligence => "Emotional Intelligence",
            Skill::CriticalThinking => "Critical Thinking",
            Skill::TimeManagement => "Time Management",
            Skill::Leadership => "Leadership",
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Skill {
    type Err = crate::error::PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "communication" => Ok(Skill::Communication),
            "emotional_intelligence" => Ok(Skill::EmotionalIntelligence),
            "critical_thinking" => Ok(Skill::CriticalThinking),
            "time_management" => Ok(Skill::TimeManagement),
            "leadership" => Ok(Skill::Leadership),
            _ => Err(crate::error::PlanError::InvalidSkill(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn all() -> &'static [Difficulty] {
        &[
            Difficulty::Beginner,
            Difficulty::Intermediate,
            Difficulty::Advanced,
        ]
    }

    /// Resolve a block difficulty from the average of the five scores.
    pub fn from_average(avg: f64) -> Difficulty {
        if avg < 40.0 {
            Difficulty::Beginner
        } else if avg < 70.0 {
            Difficulty::Intermediate
        } else {
            Difficulty::Advanced
        }
    }

    /// Score floor applied by the level-up when a block of this difficulty
    /// completes.
    pub fn level_up_floor(self) -> f64 {
        match self {
            Difficulty::Beginner => 45.0,
            Difficulty::Intermediate => 75.0,
            Difficulty::Advanced => 85.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Difficulty {
    type Err = crate::error::PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            _ => Err(crate::error::PlanError::InvalidDifficulty(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// MaterialType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialType {
    Article,
    Video,
    Course,
}

impl fmt::Display for MaterialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MaterialType::Article => "article",
            MaterialType::Video => "video",
            MaterialType::Course => "course",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// AssessmentType / AssessmentKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentType {
    Quiz,
    Case,
    Simulation,
}

impl fmt::Display for AssessmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssessmentType::Quiz => "quiz",
            AssessmentType::Case => "case",
            AssessmentType::Simulation => "simulation",
        };
        f.write_str(s)
    }
}

/// Role of an assessment within a block. Final items used to be identified by
/// reserved title text; the explicit kind replaces that, with title matching
/// kept only as a migration fallback in the provisioner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentKind {
    #[default]
    Regular,
    FinalTest,
    FinalSimulation,
}

impl fmt::Display for AssessmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssessmentKind::Regular => "regular",
            AssessmentKind::FinalTest => "final_test",
            AssessmentKind::FinalSimulation => "final_simulation",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// TaskStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_boundaries() {
        assert_eq!(Difficulty::from_average(0.0), Difficulty::Beginner);
        assert_eq!(Difficulty::from_average(39.0), Difficulty::Beginner);
        assert_eq!(Difficulty::from_average(39.99), Difficulty::Beginner);
        assert_eq!(Difficulty::from_average(40.0), Difficulty::Intermediate);
        assert_eq!(Difficulty::from_average(69.0), Difficulty::Intermediate);
        assert_eq!(Difficulty::from_average(70.0), Difficulty::Advanced);
        assert_eq!(Difficulty::from_average(100.0), Difficulty::Advanced);
    }

    #[test]
    fn difficulty_is_monotone() {
        let mut prev = Difficulty::Beginner;
        for avg in 0..=100 {
            let d = Difficulty::from_average(avg as f64);
            assert!(d >= prev);
            prev = d;
        }
    }

    #[test]
    fn level_up_floors() {
        assert_eq!(Difficulty::Beginner.level_up_floor(), 45.0);
        assert_eq!(Difficulty::Intermediate.level_up_floor(), 75.0);
        assert_eq!(Difficulty::Advanced.level_up_floor(), 85.0);
    }

    #[test]
    fn skill_roundtrip() {
        use std::str::FromStr;
        for skill in Skill::all() {
            assert_eq!(Skill::from_str(skill.as_str()).unwrap(), *skill);
        }
    }

    #[test]
    fn difficulty_roundtrip() {
        use std::str::FromStr;
        for d in Difficulty::all() {
            assert_eq!(Difficulty::from_str(d.as_str()).unwrap(), *d);
        }
    }

    #[test]
    fn assessment_kind_defaults_to_regular() {
        // Legacy catalog entries have no kind field.
        let a: AssessmentKind = serde_yaml::from_str("regular").unwrap();
        assert_eq!(a, AssessmentKind::Regular);
        assert_eq!(AssessmentKind::default(), AssessmentKind::Regular);
    }
}
