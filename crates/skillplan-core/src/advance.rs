use crate::achievements::{achievement_id, achievement_title};
use crate::error::{PlanError, Result};
use crate::generate::{generate_plan_for_profile, ContentGenerator};
use crate::plan::BlockAchievement;
use crate::store::Store;
use crate::sync::synchronize;
use chrono::Utc;
use tracing::info;

/// Uniform bump applied to every skill score on level-up.
pub const LEVEL_UP_STEP: f64 = 8.0;

#[derive(Debug, Clone)]
pub struct AdvanceOutcome {
    pub level_up_applied: bool,
    pub already_applied: bool,
    pub new_plan_id: u32,
    pub achievement_title: String,
}

/// Close out the current block: raise the profile, record the achievement,
/// archive the plan, and generate the next one.
///
/// Preconditions are checked against freshly synchronized state. A retry
/// after a partial failure is safe: once `level_up_applied` is set the
/// score raise is skipped and only the next plan is (re)generated.
pub fn advance_to_next_block(
    store: &Store,
    generator: &dyn ContentGenerator,
    user: &str,
) -> Result<AdvanceOutcome> {
    let mut plan = store
        .active_plan(user)?
        .ok_or_else(|| PlanError::NoActivePlan(user.to_string()))?;
    synchronize(store, &mut plan)?;

    if !plan.content.final_stage.unlocked {
        return Err(PlanError::InvalidState {
            reason: format!(
                "final stage is locked: plan progress is {:.0}%, needs 100%",
                plan.content.progress.percentage
            ),
        });
    }
    if !plan.content.final_stage.completed {
        return Err(PlanError::InvalidState {
            reason: "final test and final simulation must both be completed".to_string(),
        });
    }

    let difficulty = plan.content.target_difficulty;
    let title = achievement_title(difficulty);
    let already_applied = plan.content.final_stage.level_up_applied;

    let mut profile = store
        .profile(user)?
        .ok_or_else(|| PlanError::ProfileNotFound(user.to_string()))?;

    if !already_applied {
        // History first, so the pre-raise scores are never lost.
        store.append_profile_history(user, profile.snapshot())?;
        profile.raise_to_floor(difficulty.level_up_floor(), LEVEL_UP_STEP);
        store.save_profile(user, &profile)?;

        let now = Utc::now();
        let stage = &mut plan.content.final_stage;
        stage.level_up_applied = true;
        stage.completed_at = Some(now);
        stage.achievement_title = Some(title.clone());
        plan.content.push_achievement(BlockAchievement {
            id: achievement_id(plan.id, difficulty),
            title: title.clone(),
            achieved_at: Some(now),
        });
        store.save_plan(user, &mut plan)?;
        info!(user, plan_id = plan.id, %difficulty, "level-up applied");
    } else {
        info!(user, plan_id = plan.id, "level-up already applied, regenerating only");
    }

    let next = generate_plan_for_profile(store, generator, user, &profile)?;
    Ok(AdvanceOutcome {
        level_up_applied: !already_applied,
        already_applied,
        new_plan_id: next.id,
        achievement_title: title,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
