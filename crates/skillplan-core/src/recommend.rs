use crate::assessment::Assessment;
use crate::plan::TestRecommendation;
use crate::types::{AssessmentType, Difficulty, Skill};
use std::collections::BTreeSet;

/// How many tests a plan recommends.
pub const MAX_RECOMMENDATIONS: usize = 3;

/// Map weaknesses to the best-matching existing assessments.
///
/// Advanced users are steered to case studies, everyone else to quizzes,
/// before other types. Per weakness the first candidate that is both
/// unpicked and uncompleted wins, falling back to merely unpicked; the list
/// is then padded from the remaining practice assessments, uncompleted
/// ones first.
pub fn recommend_tests(
    weaknesses: &[Skill],
    target_difficulty: Difficulty,
    completed_ids: &BTreeSet<u32>,
    assessments: &[Assessment],
) -> Vec<TestRecommendation> {
    let preferred = preferred_type(target_difficulty);
    let mut candidates: Vec<&Assessment> = assessments.iter().filter(|a| a.is_practice()).collect();
    // Preferred type first, then stable by id.
    candidates.sort_by_key(|a| (a.assessment_type != preferred, a.id));

    let mut picked: Vec<TestRecommendation> = Vec::new();

    for &weakness in weaknesses {
        if picked.len() >= MAX_RECOMMENDATIONS {
            break;
        }
        let matches: Vec<&&Assessment> = candidates
            .iter()
            .filter(|a| matches_skill(a, weakness))
            .collect();
        let choice = matches
            .iter()
            .find(|a| !is_picked(&picked, a.id) && !completed_ids.contains(&a.id))
            .or_else(|| matches.iter().find(|a| !is_picked(&picked, a.id)));
        if let Some(a) = choice {
            picked.push(TestRecommendation {
                test_id: a.id,
                title: a.title.clone(),
                reason: format!("Targets your {} development area", weakness.display_name()),
            });
        }
    }

    // Pad with whatever practice remains, uncompleted first.
    let mut rest: Vec<&&Assessment> = candidates
        .iter()
        .filter(|a| !is_picked(&picked, a.id))
        .collect();
    rest.sort_by_key(|a| (completed_ids.contains(&a.id), a.id));
    for a in rest {
        if picked.len() >= MAX_RECOMMENDATIONS {
            break;
        }
        let reason = if completed_ids.contains(&a.id) {
            "Worth revisiting to consolidate your practice".to_string()
        } else {
            "Fills out your assessment coverage".to_string()
        };
        picked.push(TestRecommendation {
            test_id: a.id,
            title: a.title.clone(),
            reason,
        });
    }

    picked
}

fn preferred_type(difficulty: Difficulty) -> AssessmentType {
    if difficulty == Difficulty::Advanced {
        AssessmentType::Case
    } else {
        AssessmentType::Quiz
    }
}

fn matches_skill(assessment: &Assessment, skill: Skill) -> bool {
    if assessment.skill == Some(skill) {
        return true;
    }
    let keyword = skill.display_name().to_lowercase();
    let haystack = format!(
        "{} {}",
        assessment.title.to_lowercase(),
        assessment.description.to_lowercase()
    );
    haystack.contains(&keyword)
}

fn is_picked(picked: &[TestRecommendation], id: u32) -> bool {
    picked.iter().any(|r| r.test_id == id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
