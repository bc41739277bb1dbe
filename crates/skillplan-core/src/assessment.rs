use crate::error::Result;
use crate::store::Store;
use crate::types::{AssessmentKind, AssessmentType, Difficulty, Skill};
use serde::{Deserialize, Serialize};
use tracing::info;

// ---------------------------------------------------------------------------
// Assessment
// ---------------------------------------------------------------------------

/// One multiple-choice scenario question. Simulations carry a single
/// question with no options: the prompt is the narrative brief.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<usize>,
}

impl Question {
    pub fn choice(prompt: &str, options: &[&str], answer: usize) -> Self {
        Self {
            prompt: prompt.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            answer: Some(answer),
        }
    }

    pub fn narrative(prompt: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            options: Vec::new(),
            answer: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: u32,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub assessment_type: AssessmentType,
    #[serde(default)]
    pub kind: AssessmentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<Skill>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<Question>,
}

impl Assessment {
    /// Eligible as a practice binding for a material: not a simulation and
    /// not part of any final stage.
    pub fn is_practice(&self) -> bool {
        self.kind == AssessmentKind::Regular && self.assessment_type != AssessmentType::Simulation
    }
}

// ---------------------------------------------------------------------------
// Final-stage provisioner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalPair {
    pub final_test_id: u32,
    pub final_simulation_id: u32,
}

pub fn final_test_title(difficulty: Difficulty) -> String {
    format!("Final Test: {}", difficulty.display_name())
}

pub fn final_simulation_title(difficulty: Difficulty) -> String {
    format!("Final Simulation: {}", difficulty.display_name())
}

// Pre-kind-field records were identified by these title patterns.
fn legacy_final_test_title(difficulty: Difficulty) -> String {
    format!("Final test ({})", difficulty.as_str())
}

fn legacy_final_simulation_title(difficulty: Difficulty) -> String {
    format!("Final simulation ({})", difficulty.as_str())
}

/// Ensure the paired final test and final simulation exist for `difficulty`,
/// creating or repairing them as needed. `stored` carries the ids the plan
/// already references, which win over any lookup when still valid.
pub fn ensure_final_stage(
    store: &Store,
    difficulty: Difficulty,
    stored_test_id: Option<u32>,
    stored_simulation_id: Option<u32>,
) -> Result<FinalPair> {
    let final_test_id = ensure_final_item(
        store,
        difficulty,
        stored_test_id,
        AssessmentKind::FinalTest,
        AssessmentType::Quiz,
        final_test_title(difficulty),
        legacy_final_test_title(difficulty),
        format!(
            "Scenario quiz closing out the {} block. Passing it is half of unlocking the next block.",
            difficulty.as_str()
        ),
        final_test_questions(difficulty),
    )?;
    let final_simulation_id = ensure_final_item(
        store,
        difficulty,
        stored_simulation_id,
        AssessmentKind::FinalSimulation,
        AssessmentType::Simulation,
        final_simulation_title(difficulty),
        legacy_final_simulation_title(difficulty),
        format!(
            "Role-play simulation closing out the {} block, paired with the final test.",
            difficulty.as_str()
        ),
        final_simulation_questions(difficulty),
    )?;
    Ok(FinalPair {
        final_test_id,
        final_simulation_id,
    })
}

#[allow(clippy::too_many_arguments)]
fn ensure_final_item(
    store: &Store,
    difficulty: Difficulty,
    stored_id: Option<u32>,
    kind: AssessmentKind,
    assessment_type: AssessmentType,
    title: String,
    legacy_title: String,
    description: String,
    questions: Vec<Question>,
) -> Result<u32> {
    let assessments = store.list_assessments()?;

    let found = assessments
        .iter()
        .find(|a| Some(a.id) == stored_id && (a.kind == kind || a.title == legacy_title))
        .or_else(|| {
            assessments
                .iter()
                .find(|a| a.kind == kind && a.difficulty == Some(difficulty))
        })
        // One-time migration fallback: records written before the kind field
        // existed are found by title only.
        .or_else(|| {
            assessments
                .iter()
                .find(|a| a.title == title || a.title == legacy_title)
        });

    match found {
        Some(existing) => {
            let mut updated = existing.clone();
            updated.title = title;
            updated.description = description;
            updated.assessment_type = assessment_type;
            updated.kind = kind;
            updated.difficulty = Some(difficulty);
            updated.questions = questions;
            // Diff-and-replace: write only on actual mismatch.
            if updated != *existing {
                info!(id = existing.id, %kind, %difficulty, "refreshing final-stage assessment");
                store.save_assessment(&updated)?;
            }
            Ok(existing.id)
        }
        None => {
            let created = store.create_assessment(
                &title,
                &description,
                assessment_type,
                kind,
                None,
                Some(difficulty),
                questions,
            )?;
            info!(id = created.id, %kind, %difficulty, "provisioned final-stage assessment");
            Ok(created.id)
        }
    }
}

// ---------------------------------------------------------------------------
// Fixed question sets
// ---------------------------------------------------------------------------

fn final_test_questions(difficulty: Difficulty) -> Vec<Question> {
    match difficulty {
        Difficulty::Beginner => vec![
            Question::choice(
                "A colleague explains a problem while you are mid-task. What is the strongest first move?",
                &[
                    "Keep working and nod along",
                    "Stop, face them, and paraphrase what you heard",
                    "Ask them to email you instead",
                    "Offer a solution before they finish",
                ],
                1,
            ),
            Question::choice(
                "You notice you are irritated before a meeting. What helps most?",
                &[
                    "Suppress it and push through",
                    "Cancel the meeting",
                    "Name the feeling to yourself and decide how you want to show up",
                    "Mention your irritation to everyone first thing",
                ],
                2,
            ),
            Question::choice(
                "A claim in a report seems off. What do you do first?",
                &[
                    "Accept it, reports are usually checked",
                    "Ask what evidence supports it",
                    "Rewrite the report yourself",
                    "Escalate to a manager",
                ],
                1,
            ),
            Question::choice(
                "Your day has ten tasks and time for six. What is the best start?",
                &[
                    "Start with the quickest wins",
                    "Rank by impact and deadline, then cut from the bottom",
                    "Work the list top to bottom",
                    "Ask someone else to pick for you",
                ],
                1,
            ),
        ],
        Difficulty::Intermediate => vec![
            Question::choice(
                "Two teammates disagree sharply in a design review you run. Best move?",
                &[
                    "Pick the more senior person's option",
                    "Table the topic indefinitely",
                    "Restate both positions, find the shared constraint, and decide on criteria",
                    "Put it to an immediate vote",
                ],
                2,
            ),
            Question::choice(
                "A stakeholder reacts angrily to a slipped deadline. First response?",
                &[
                    "Defend the team's effort",
                    "Acknowledge the impact on them before explaining causes",
                    "Forward the project log",
                    "Promise it will not happen again",
                ],
                1,
            ),
            Question::choice(
                "Your metrics improved after a change, but traffic also shifted. What do you conclude?",
                &[
                    "The change worked",
                    "The change failed",
                    "Attribution is unclear; isolate the variables before concluding",
                    "Metrics are unreliable in general",
                ],
                2,
            ),
            Question::choice(
                "Mid-sprint, an urgent request arrives that would consume two days. You should:",
                &[
                    "Absorb it silently",
                    "Refuse it outright",
                    "Surface the trade-off and renegotiate scope with the requester",
                    "Work evenings to fit both",
                ],
                2,
            ),
            Question::choice(
                "A quieter teammate's idea gets talked over. As the meeting lead you:",
                &[
                    "Move on, the group has momentum",
                    "Return to the idea explicitly and credit its author",
                    "Raise the idea later as your own",
                    "Ask them to be more assertive next time",
                ],
                1,
            ),
        ],
        Difficulty::Advanced => vec![
            Question::choice(
                "You must deliver unwelcome strategy news to a skeptical senior audience. Best framing?",
                &[
                    "Lead with the data dump",
                    "Lead with the decision, then the reasoning and the trade-offs you rejected",
                    "Soften the message until objections stop",
                    "Let a deputy present it",
                ],
                1,
            ),
            Question::choice(
                "Two of your leads are in a cold conflict that is slowing delivery. You:",
                &[
                    "Reassign one of them",
                    "Mediate directly: surface the underlying interests, agree observable behaviors",
                    "Wait for it to resolve naturally",
                    "Raise it in the team retro publicly",
                ],
                1,
            ),
            Question::choice(
                "An analysis supports your preferred option suspiciously well. You:",
                &[
                    "Ship it while the window is open",
                    "Have someone argue the opposing case against the same data",
                    "Collect more data until certain",
                    "Discard the analysis",
                ],
                1,
            ),
            Question::choice(
                "Your roadmap has three initiatives and capacity for two. The dropped one has a vocal sponsor. You:",
                &[
                    "Run all three at reduced quality",
                    "Drop it quietly",
                    "Decide on explicit criteria and tell the sponsor the reasoning yourself",
                    "Delegate the message to the sponsor's peer",
                ],
                2,
            ),
            Question::choice(
                "A high performer wants a growth path you cannot offer this year. You:",
                &[
                    "Promise it anyway to retain them",
                    "Explore what need underlies the ask and co-design the nearest honest step",
                    "Tell them to be patient",
                    "Start a backfill search preemptively",
                ],
                1,
            ),
        ],
    }
}

fn final_simulation_questions(difficulty: Difficulty) -> Vec<Question> {
    let prompt = match difficulty {
        Difficulty::Beginner => {
            "You join a new team and your onboarding buddy seems overloaded and short with you. \
             Play out the conversation where you ask for the help you need while easing their load. \
             Narrate what you say, what you watch for in their reaction, and how you close."
        }
        Difficulty::Intermediate => {
            "A project you coordinate is one week late and two stakeholders blame each other in a \
             shared channel. Run the conversation that moves the group from blame to a recovery \
             plan: open it, handle the emotions in the room, and land concrete commitments."
        }
        Difficulty::Advanced => {
            "Your organization must cut one of two programs, each championed by a director who \
             reports to you. Lead the decision meeting: frame the criteria, draw out the honest \
             cases, manage the loser's reaction, and leave both directors committed to the outcome."
        }
    };
    vec![Question::narrative(prompt)]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::init(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn provisions_both_final_items() {
        let (_dir, store) = store();
        let pair = ensure_final_stage(&store, Difficulty::Beginner, None, None).unwrap();
        assert_ne!(pair.final_test_id, pair.final_simulation_id);

        let all = store.list_assessments().unwrap();
        let test = all.iter().find(|a| a.id == pair.final_test_id).unwrap();
        assert_eq!(test.kind, AssessmentKind::FinalTest);
        assert_eq!(test.assessment_type, AssessmentType::Quiz);
        assert_eq!(test.difficulty, Some(Difficulty::Beginner));
        assert!(test.questions.len() >= 4);

        let sim = all.iter().find(|a| a.id == pair.final_simulation_id).unwrap();
        assert_eq!(sim.kind, AssessmentKind::FinalSimulation);
        assert_eq!(sim.assessment_type, AssessmentType::Simulation);
        assert_eq!(sim.questions.len(), 1);
        assert!(sim.questions[0].options.is_empty());
    }

    #[test]
    fn provisioning_is_idempotent() {
        let (_dir, store) = store();
        let first = ensure_final_stage(&store, Difficulty::Intermediate, None, None).unwrap();
        let second = ensure_final_stage(
            &store,
            Difficulty::Intermediate,
            Some(first.final_test_id),
            Some(first.final_simulation_id),
        )
        .unwrap();
        assert_eq!(first, second);
        let finals = store
            .list_assessments()
            .unwrap()
            .into_iter()
            .filter(|a| a.kind != AssessmentKind::Regular)
            .count();
        assert_eq!(finals, 2);
    }

    #[test]
    fn repairs_drifted_question_set() {
        let (_dir, store) = store();
        let pair = ensure_final_stage(&store, Difficulty::Advanced, None, None).unwrap();

        let mut drifted = store
            .list_assessments()
            .unwrap()
            .into_iter()
            .find(|a| a.id == pair.final_test_id)
            .unwrap();
        drifted.questions.pop();
        store.save_assessment(&drifted).unwrap();

        ensure_final_stage(&store, Difficulty::Advanced, Some(pair.final_test_id), None).unwrap();
        let repaired = store
            .list_assessments()
            .unwrap()
            .into_iter()
            .find(|a| a.id == pair.final_test_id)
            .unwrap();
        assert_eq!(repaired.questions, final_test_questions(Difficulty::Advanced));
    }

    #[test]
    fn adopts_legacy_title_record() {
        let (_dir, store) = store();
        // A record written before the kind field: final identified by title.
        let legacy = store
            .create_assessment(
                "Final test (beginner)",
                "old description",
                AssessmentType::Quiz,
                AssessmentKind::Regular,
                None,
                None,
                Vec::new(),
            )
            .unwrap();

        let pair = ensure_final_stage(&store, Difficulty::Beginner, None, None).unwrap();
        assert_eq!(pair.final_test_id, legacy.id);

        let adopted = store
            .list_assessments()
            .unwrap()
            .into_iter()
            .find(|a| a.id == legacy.id)
            .unwrap();
        assert_eq!(adopted.kind, AssessmentKind::FinalTest);
        assert_eq!(adopted.title, final_test_title(Difficulty::Beginner));
    }

    #[test]
    fn different_difficulties_get_distinct_pairs() {
        let (_dir, store) = store();
        let beginner = ensure_final_stage(&store, Difficulty::Beginner, None, None).unwrap();
        let advanced = ensure_final_stage(&store, Difficulty::Advanced, None, None).unwrap();
        assert_ne!(beginner.final_test_id, advanced.final_test_id);
        assert_ne!(beginner.final_simulation_id, advanced.final_simulation_id);
    }

    #[test]
    fn practice_excludes_simulations_and_finals() {
        let sim = Assessment {
            id: 1,
            title: "t".into(),
            description: "d".into(),
            assessment_type: AssessmentType::Simulation,
            kind: AssessmentKind::Regular,
            skill: None,
            difficulty: None,
            questions: Vec::new(),
        };
        assert!(!sim.is_practice());
        let final_quiz = Assessment {
            assessment_type: AssessmentType::Quiz,
            kind: AssessmentKind::FinalTest,
            ..sim.clone()
        };
        assert!(!final_quiz.is_practice());
        let quiz = Assessment {
            assessment_type: AssessmentType::Quiz,
            kind: AssessmentKind::Regular,
            ..sim
        };
        assert!(quiz.is_practice());
    }
}
