use crate::achievements::aggregate_achievements;
use crate::advance::{advance_to_next_block, AdvanceOutcome};
use crate::error::{PlanError, Result};
use crate::generate::{check_and_generate, generate_plan, ContentGenerator};
use crate::plan::{BlockAchievement, DevelopmentPlan};
use crate::store::Store;
use crate::sync::synchronize;

/// Facade over the plan lifecycle. Built fresh per unit of work from a
/// store handle and a content collaborator; holds no state of its own.
pub struct PlanEngine<'a> {
    store: &'a Store,
    generator: &'a dyn ContentGenerator,
}

impl<'a> PlanEngine<'a> {
    pub fn new(store: &'a Store, generator: &'a dyn ContentGenerator) -> Self {
        Self { store, generator }
    }

    /// The user's active plan with progress recomputed from the current
    /// completion events. Reading is a synchronization point.
    pub fn active_plan_with_progress(&self, user: &str) -> Result<DevelopmentPlan> {
        let mut plan = self
            .store
            .active_plan(user)?
            .ok_or_else(|| PlanError::NoActivePlan(user.to_string()))?;
        synchronize(self.store, &mut plan)?;
        Ok(plan)
    }

    pub fn mark_task_completed(
        &self,
        user: &str,
        plan_id: u32,
        task_id: &str,
    ) -> Result<DevelopmentPlan> {
        let mut plan = self.active_plan_checked(user, plan_id)?;
        plan.mark_task_completed(task_id)?;
        self.store.save_plan(user, &mut plan)?;
        synchronize(self.store, &mut plan)?;
        Ok(plan)
    }

    pub fn mark_material_article_opened(
        &self,
        user: &str,
        plan_id: u32,
        material_id: &str,
    ) -> Result<DevelopmentPlan> {
        let mut plan = self.active_plan_checked(user, plan_id)?;
        plan.mark_article_opened(material_id)?;
        self.store.save_plan(user, &mut plan)?;
        synchronize(self.store, &mut plan)?;
        Ok(plan)
    }

    /// Mutations address a plan by id; a stale id (an archived plan, or one
    /// that never existed) must not touch whatever plan is active now.
    fn active_plan_checked(&self, user: &str, plan_id: u32) -> Result<DevelopmentPlan> {
        let plan = self
            .store
            .active_plan(user)?
            .ok_or_else(|| PlanError::NoActivePlan(user.to_string()))?;
        if plan.id != plan_id {
            return Err(PlanError::PlanNotFound {
                user: user.to_string(),
                plan_id,
            });
        }
        Ok(plan)
    }

    /// Level up out of a finished block and start the next one.
    pub fn advance_to_next_block(&self, user: &str) -> Result<AdvanceOutcome> {
        advance_to_next_block(self.store, self.generator, user)
    }

    /// Unconditionally generate a new plan, archiving the current one.
    pub fn generate_plan(&self, user: &str) -> Result<DevelopmentPlan> {
        generate_plan(self.store, self.generator, user)
    }

    /// Generate a plan only when a trigger condition holds; `None` means
    /// the active plan is still the right one.
    pub fn generate_or_refresh_plan(&self, user: &str) -> Result<Option<DevelopmentPlan>> {
        check_and_generate(self.store, self.generator, user)
    }

    /// Achievement history across every plan the user ever had.
    pub fn achievements(&self, user: &str) -> Result<Vec<BlockAchievement>> {
        let plans = self.store.list_plans(user)?;
        Ok(aggregate_achievements(&plans))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
