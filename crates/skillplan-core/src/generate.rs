use crate::achievements::aggregate_achievements;
use crate::catalog::select_materials;
use crate::error::{PlanError, Result};
use crate::plan::{DevelopmentPlan, MaterialItem, PlanContent, TaskItem, TestRecommendation};
use crate::profile::SkillProfile;
use crate::recommend::recommend_tests;
use crate::store::Store;
use crate::sync::synchronize;
use crate::types::{Difficulty, Skill};
use chrono::Utc;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{info, warn};

/// Analyses a user must have before the first plan can be generated.
pub const MIN_ANALYSES_FOR_PLAN: usize = 3;
/// A plan older than this is refreshed regardless of progress.
pub const REGENERATION_WINDOW_DAYS: i64 = 7;
/// How many past plans feed the anti-repetition exclusion set.
pub const MATERIAL_HISTORY_PLANS: usize = 3;
/// Advisory floor for new-material share against the previous plan.
pub const UNIQUENESS_THRESHOLD_PCT: f64 = 70.0;

// ---------------------------------------------------------------------------
// Content generation seam
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
#[error("content generation unavailable: {0}")]
pub struct GenerationError(pub String);

#[derive(Debug, Clone, Default)]
pub struct GeneratedContent {
    pub materials: Vec<MaterialItem>,
    pub tasks: Vec<TaskItem>,
    pub recommended_tests: Vec<TestRecommendation>,
}

/// External natural-language content collaborator. Failures never surface:
/// the generator falls back to [`bootstrap_content`] locally.
pub trait ContentGenerator {
    fn generate(
        &self,
        profile: &SkillProfile,
        weaknesses: &[Skill],
        history: &[DevelopmentPlan],
    ) -> std::result::Result<GeneratedContent, GenerationError>;
}

/// Stand-in for an unreachable generation backend; always fails, which
/// routes every plan through the static bootstrap.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableGenerator;

impl ContentGenerator for UnavailableGenerator {
    fn generate(
        &self,
        _profile: &SkillProfile,
        _weaknesses: &[Skill],
        _history: &[DevelopmentPlan],
    ) -> std::result::Result<GeneratedContent, GenerationError> {
        Err(GenerationError("no backend configured".to_string()))
    }
}

/// Fixed three-task fallback used whenever the content collaborator fails.
/// It supplies tasks only: materials and recommendations always come from
/// the curated selector and recommender, never from generated content.
pub fn bootstrap_content(weaknesses: &[Skill]) -> GeneratedContent {
    let focus = |i: usize| weaknesses.get(i).copied().unwrap_or(Skill::Communication);
    GeneratedContent {
        tasks: vec![
            TaskItem::pending(
                "task_reflect_1",
                "After your next difficult conversation, write down three points: what went \
                 well, what you would change, and your next concrete step.",
                focus(0),
            ),
            TaskItem::pending(
                "task_reflect_2",
                "In your next tense situation, name the other person's emotions to yourself \
                 and check your read with a clarifying question.",
                focus(1),
            ),
            TaskItem::pending(
                "task_reflect_3",
                "Before solving your next sizeable problem, write five clarifying questions: \
                 what is unknown, what constrains you, what would change your mind.",
                focus(2),
            ),
        ],
        ..GeneratedContent::default()
    }
}

// ---------------------------------------------------------------------------
// Plan generation
// ---------------------------------------------------------------------------

/// Build and persist a new plan for `user`, archiving the current one.
/// The content collaborator is attempted first, but its materials and
/// recommendations are never trusted: both are overwritten by the curated
/// selector and recommender so every link and id comes from known catalogs.
pub fn generate_plan(
    store: &Store,
    generator: &dyn ContentGenerator,
    user: &str,
) -> Result<DevelopmentPlan> {
    let profile = store
        .profile(user)?
        .ok_or_else(|| PlanError::ProfileNotFound(user.to_string()))?;
    generate_plan_for_profile(store, generator, user, &profile)
}

/// Same as [`generate_plan`] but with the profile already in hand; the
/// level-up calls this with the freshly raised scores.
pub fn generate_plan_for_profile(
    store: &Store,
    generator: &dyn ContentGenerator,
    user: &str,
    profile: &SkillProfile,
) -> Result<DevelopmentPlan> {
    // Archive-before-create: exactly one non-archived plan per user.
    if let Some(mut active) = store.active_plan(user)? {
        active.is_archived = true;
        store.save_plan(user, &mut active)?;
        info!(plan_id = active.id, user, "archived active plan");
    }

    let weaknesses = profile.weaknesses();
    let difficulty = Difficulty::from_average(profile.average());
    let history = store.list_plans(user)?;

    let excluded: BTreeSet<String> = history
        .iter()
        .take(MATERIAL_HISTORY_PLANS)
        .flat_map(|p| p.content.materials.iter().map(|m| m.id.clone()))
        .collect();

    let generated = generator
        .generate(profile, &weaknesses, &history)
        .unwrap_or_else(|e| {
            warn!(user, error = %e, "content generation failed, using bootstrap");
            bootstrap_content(&weaknesses)
        });

    let materials = select_materials(&weaknesses, difficulty, &excluded);

    let assessments = store.list_assessments()?;
    let practice_ids: Vec<u32> = assessments
        .iter()
        .filter(|a| a.is_practice())
        .map(|a| a.id)
        .collect();
    let completed = store.completed_assessment_ids(user, &practice_ids, None, None)?;
    let recommended_tests = recommend_tests(&weaknesses, difficulty, &completed, &assessments);

    if let Some(previous) = history.first() {
        let pct = material_uniqueness_pct(&materials, &previous.content.materials);
        if pct < UNIQUENESS_THRESHOLD_PCT {
            // Advisory only: a repeat-heavy plan beats an empty one.
            warn!(user, uniqueness = pct, "new plan repeats materials from the previous block");
        }
    }

    let content = PlanContent {
        weaknesses: weaknesses.iter().map(|w| w.display_name().to_string()).collect(),
        materials,
        tasks: generated.tasks,
        recommended_tests,
        target_difficulty: difficulty,
        block_achievements: aggregate_achievements(&history),
        ..PlanContent::default()
    };

    let mut plan = DevelopmentPlan::new(store.next_plan_id(user)?, user, content);
    store.save_plan(user, &mut plan)?;

    // First sync fills the derived state: bindings, progress, final stage.
    synchronize(store, &mut plan)?;
    info!(plan_id = plan.id, user, %difficulty, "generated development plan");
    Ok(plan)
}

/// Share of `new` materials that do not appear in `previous`, as a
/// percentage. Empty inputs count as fully unique.
pub fn material_uniqueness_pct(new: &[MaterialItem], previous: &[MaterialItem]) -> f64 {
    if new.is_empty() {
        return 100.0;
    }
    let previous_ids: BTreeSet<&str> = previous.iter().map(|m| m.id.as_str()).collect();
    let unique = new
        .iter()
        .filter(|m| !previous_ids.contains(m.id.as_str()))
        .count();
    unique as f64 / new.len() as f64 * 100.0
}

// ---------------------------------------------------------------------------
// Trigger policy
// ---------------------------------------------------------------------------

/// Generate a plan only when a trigger condition holds: no active plan, the
/// active plan is stale, its block leveled up, or the profile has drifted
/// to a different difficulty. Below the minimum-analyses threshold this is
/// always a no-op.
pub fn check_and_generate(
    store: &Store,
    generator: &dyn ContentGenerator,
    user: &str,
) -> Result<Option<DevelopmentPlan>> {
    let analyses = store.analysis_count(user)?;
    if analyses < MIN_ANALYSES_FOR_PLAN {
        info!(user, analyses, "below analysis threshold, skipping generation");
        return Ok(None);
    }
    let profile = store
        .profile(user)?
        .ok_or_else(|| PlanError::ProfileNotFound(user.to_string()))?;

    let should_generate = match store.active_plan(user)? {
        None => true,
        Some(active) => {
            let age_days = (Utc::now() - active.generated_at).num_days();
            if age_days > REGENERATION_WINDOW_DAYS {
                info!(user, age_days, "active plan is stale");
                true
            } else if active.content.final_stage.level_up_applied {
                // The block is finished; the gate that blocks mid-block
                // difficulty switches is open.
                true
            } else {
                let current = Difficulty::from_average(profile.average());
                current != active.content.target_difficulty
            }
        }
    };

    if !should_generate {
        return Ok(None);
    }
    generate_plan_for_profile(store, generator, user, &profile).map(Some)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct FailingGenerator;
    impl ContentGenerator for FailingGenerator {
        fn generate(
            &self,
            _: &SkillProfile,
            _: &[Skill],
            _: &[DevelopmentPlan],
        ) -> std::result::Result<GeneratedContent, GenerationError> {
            Err(GenerationError("upstream down".into()))
        }
    }

    struct CannedGenerator;
    impl ContentGenerator for CannedGenerator {
        fn generate(
            &self,
            _: &SkillProfile,
            weaknesses: &[Skill],
            _: &[DevelopmentPlan],
        ) -> std::result::Result<GeneratedContent, GenerationError> {
            Ok(GeneratedContent {
                // Untrusted free-text output: must be overwritten.
                materials: vec![MaterialItem {
                    id: "hallucinated".into(),
                    title: "Not a real page".into(),
                    url: "https://nonsense.invalid".into(),
                    material_type: crate::types::MaterialType::Article,
                    skill: Skill::Communication,
                    difficulty: Difficulty::Advanced,
                }],
                tasks: vec![TaskItem::pending("task_gen_1", "Generated task", weaknesses[0])],
                recommended_tests: vec![TestRecommendation {
                    test_id: 999,
                    title: "Invented test".into(),
                    reason: "made up".into(),
                }],
            })
        }
    }

    fn setup(avg_profile: f64) -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::init(dir.path()).unwrap();
        let p = avg_profile;
        store
            .save_profile("alice", &SkillProfile::new(p, p, p, p, p))
            .unwrap();
        (dir, store)
    }

    #[test]
    fn bootstrap_supplies_tasks_only() {
        let content =
            bootstrap_content(&[Skill::Communication, Skill::Leadership, Skill::TimeManagement]);
        assert_eq!(content.tasks.len(), 3);
        assert!(content.materials.is_empty());
        assert!(content.recommended_tests.is_empty());
    }

    #[test]
    fn generation_survives_upstream_failure() {
        let (_dir, store) = setup(35.0);
        let plan = generate_plan(&store, &FailingGenerator, "alice").unwrap();
        assert_eq!(plan.content.target_difficulty, Difficulty::Beginner);
        assert_eq!(plan.content.tasks.len(), 3);
        assert!(!plan.content.materials.is_empty());
        assert_eq!(plan.content.weaknesses.len(), 3);
    }

    #[test]
    fn generated_materials_and_tests_are_overwritten() {
        let (_dir, store) = setup(35.0);
        let plan = generate_plan(&store, &CannedGenerator, "alice").unwrap();
        assert!(plan.content.materials.iter().all(|m| m.id != "hallucinated"));
        assert!(plan
            .content
            .recommended_tests
            .iter()
            .all(|r| r.test_id != 999));
        // Generated tasks are kept.
        assert_eq!(plan.content.tasks[0].id, "task_gen_1");
    }

    #[test]
    fn archives_previous_plan() {
        let (_dir, store) = setup(35.0);
        let first = generate_plan(&store, &FailingGenerator, "alice").unwrap();
        let second = generate_plan(&store, &FailingGenerator, "alice").unwrap();
        assert_ne!(first.id, second.id);

        let plans = store.list_plans("alice").unwrap();
        let active: Vec<_> = plans.iter().filter(|p| !p.is_archived).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.id);
        assert!(plans.iter().any(|p| p.id == first.id && p.is_archived));
    }

    #[test]
    fn avoids_recent_materials() {
        let (_dir, store) = setup(35.0);
        let first = generate_plan(&store, &FailingGenerator, "alice").unwrap();
        let second = generate_plan(&store, &FailingGenerator, "alice").unwrap();
        let first_ids: BTreeSet<&str> =
            first.content.materials.iter().map(|m| m.id.as_str()).collect();
        assert!(second
            .content
            .materials
            .iter()
            .all(|m| !first_ids.contains(m.id.as_str())));
    }

    #[test]
    fn difficulty_tracks_profile() {
        let (_dir, store) = setup(75.0);
        let plan = generate_plan(&store, &FailingGenerator, "alice").unwrap();
        assert_eq!(plan.content.target_difficulty, Difficulty::Advanced);
        assert!(plan
            .content
            .materials
            .iter()
            .all(|m| m.difficulty == Difficulty::Advanced));
    }

    #[test]
    fn check_requires_minimum_analyses() {
        let (_dir, store) = setup(35.0);
        store.record_analysis("alice").unwrap();
        assert!(check_and_generate(&store, &FailingGenerator, "alice")
            .unwrap()
            .is_none());

        store.record_analysis("alice").unwrap();
        store.record_analysis("alice").unwrap();
        assert!(check_and_generate(&store, &FailingGenerator, "alice")
            .unwrap()
            .is_some());
    }

    #[test]
    fn check_is_noop_for_fresh_active_plan() {
        let (_dir, store) = setup(35.0);
        for _ in 0..3 {
            store.record_analysis("alice").unwrap();
        }
        assert!(check_and_generate(&store, &FailingGenerator, "alice")
            .unwrap()
            .is_some());
        // Fresh plan, no level-up, same difficulty: nothing to do.
        assert!(check_and_generate(&store, &FailingGenerator, "alice")
            .unwrap()
            .is_none());
    }

    #[test]
    fn check_regenerates_on_difficulty_drift() {
        let (_dir, store) = setup(35.0);
        for _ in 0..3 {
            store.record_analysis("alice").unwrap();
        }
        check_and_generate(&store, &FailingGenerator, "alice").unwrap();

        store
            .save_profile("alice", &SkillProfile::new(60.0, 60.0, 60.0, 60.0, 60.0))
            .unwrap();
        let refreshed = check_and_generate(&store, &FailingGenerator, "alice")
            .unwrap()
            .unwrap();
        assert_eq!(refreshed.content.target_difficulty, Difficulty::Intermediate);
    }

    #[test]
    fn uniqueness_pct() {
        let mk = |id: &str| MaterialItem {
            id: id.into(),
            title: String::new(),
            url: String::new(),
            material_type: crate::types::MaterialType::Article,
            skill: Skill::Communication,
            difficulty: Difficulty::Beginner,
        };
        let new = vec![mk("a"), mk("b"), mk("c"), mk("d")];
        let prev = vec![mk("a")];
        assert_eq!(material_uniqueness_pct(&new, &prev), 75.0);
        assert_eq!(material_uniqueness_pct(&[], &prev), 100.0);
    }
}
