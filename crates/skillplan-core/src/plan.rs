use crate::error::{PlanError, Result};
use crate::types::{Difficulty, MaterialType, Skill, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Content items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialItem {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub material_type: MaterialType,
    pub skill: Skill,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskItem {
    pub id: String,
    pub description: String,
    pub skill: Skill,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskItem {
    pub fn pending(id: impl Into<String>, description: impl Into<String>, skill: Skill) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            skill,
            status: TaskStatus::Pending,
            completed_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecommendation {
    pub test_id: u32,
    pub title: String,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Derived progress state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialProgress {
    pub material_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_test_id: Option<u32>,
    #[serde(default)]
    pub article_opened: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_opened_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub test_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_completed_at: Option<DateTime<Utc>>,
    /// 0, 50, or 100: half for opening the material, half for the linked test.
    #[serde(default)]
    pub percentage: f64,
}

impl MaterialProgress {
    pub fn new(material_id: impl Into<String>) -> Self {
        Self {
            material_id: material_id.into(),
            linked_test_id: None,
            article_opened: false,
            article_opened_at: None,
            test_completed: false,
            test_completed_at: None,
            percentage: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProgressSummary {
    pub completed: u32,
    pub total: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FinalStage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_test_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_simulation_id: Option<u32>,
    #[serde(default)]
    pub unlocked: bool,
    #[serde(default)]
    pub final_test_completed: bool,
    #[serde(default)]
    pub final_simulation_completed: bool,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub level_up_applied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achievement_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockAchievement {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achieved_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// PlanContent
// ---------------------------------------------------------------------------

fn default_schema_version() -> u32 {
    1
}

/// The persisted plan document. Every sub-section defaults so documents
/// written by older builds still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanContent {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub materials: Vec<MaterialItem>,
    #[serde(default)]
    pub tasks: Vec<TaskItem>,
    #[serde(default)]
    pub recommended_tests: Vec<TestRecommendation>,
    #[serde(default = "default_target_difficulty")]
    pub target_difficulty: Difficulty,
    /// Derived cache: material id to bound practice assessment id.
    #[serde(default)]
    pub material_test_map: BTreeMap<String, u32>,
    #[serde(default)]
    pub material_progress: Vec<MaterialProgress>,
    #[serde(default)]
    pub progress: ProgressSummary,
    #[serde(default)]
    pub final_stage: FinalStage,
    /// Append-only, id-unique achievement history for this user's blocks.
    #[serde(default)]
    pub block_achievements: Vec<BlockAchievement>,
}

fn default_target_difficulty() -> Difficulty {
    Difficulty::Beginner
}

impl Default for PlanContent {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            weaknesses: Vec::new(),
            materials: Vec::new(),
            tasks: Vec::new(),
            recommended_tests: Vec::new(),
            target_difficulty: Difficulty::Beginner,
            material_test_map: BTreeMap::new(),
            material_progress: Vec::new(),
            progress: ProgressSummary::default(),
            final_stage: FinalStage::default(),
            block_achievements: Vec::new(),
        }
    }
}

impl PlanContent {
    pub fn material(&self, material_id: &str) -> Option<&MaterialItem> {
        self.materials.iter().find(|m| m.id == material_id)
    }

    pub fn material_progress(&self, material_id: &str) -> Option<&MaterialProgress> {
        self.material_progress
            .iter()
            .find(|p| p.material_id == material_id)
    }

    pub fn material_progress_mut(&mut self, material_id: &str) -> Option<&mut MaterialProgress> {
        self.material_progress
            .iter_mut()
            .find(|p| p.material_id == material_id)
    }

    /// Append an achievement unless its id is already present.
    pub fn push_achievement(&mut self, achievement: BlockAchievement) {
        if !self
            .block_achievements
            .iter()
            .any(|a| a.id == achievement.id)
        {
            self.block_achievements.push(achievement);
        }
    }
}

// ---------------------------------------------------------------------------
// DevelopmentPlan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentPlan {
    pub id: u32,
    pub user_id: String,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub is_archived: bool,
    /// Optimistic concurrency counter, bumped by `Store::save_plan`.
    #[serde(default)]
    pub version: u64,
    pub content: PlanContent,
}

impl DevelopmentPlan {
    pub fn new(id: u32, user_id: impl Into<String>, content: PlanContent) -> Self {
        Self {
            id,
            user_id: user_id.into(),
            generated_at: Utc::now(),
            is_archived: false,
            version: 0,
            content,
        }
    }

    /// Mark a task completed, stamping the time on the first transition only.
    pub fn mark_task_completed(&mut self, task_id: &str) -> Result<()> {
        let task = self
            .content
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| PlanError::TaskNotFound(task_id.to_string()))?;
        if task.status != TaskStatus::Completed {
            task.status = TaskStatus::Completed;
            task.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Record a material open. Monotone: once opened, stays opened, and the
    /// first-open timestamp is preserved.
    pub fn mark_article_opened(&mut self, material_id: &str) -> Result<()> {
        if self.content.material(material_id).is_none() {
            return Err(PlanError::MaterialNotFound(material_id.to_string()));
        }
        if self.content.material_progress(material_id).is_none() {
            self.content
                .material_progress
                .push(MaterialProgress::new(material_id));
        }
        let progress = self
            .content
            .material_progress_mut(material_id)
            .expect("progress entry just ensured");
        if !progress.article_opened {
            progress.article_opened = true;
            progress.article_opened_at = Some(Utc::now());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_with_material() -> DevelopmentPlan {
        let mut content = PlanContent::default();
        content.materials.push(MaterialItem {
            id: "mat-1".into(),
            title: "Active Listening".into(),
            url: "https://example.org/listening".into(),
            material_type: MaterialType::Article,
            skill: Skill::Communication,
            difficulty: Difficulty::Beginner,
        });
        content
            .tasks
            .push(TaskItem::pending("task-1", "Practice summarizing", Skill::Communication));
        DevelopmentPlan::new(1, "alice", content)
    }

    #[test]
    fn task_completion_is_idempotent() {
        let mut plan = plan_with_material();
        plan.mark_task_completed("task-1").unwrap();
        let first = plan.content.tasks[0].completed_at;
        assert!(first.is_some());
        plan.mark_task_completed("task-1").unwrap();
        assert_eq!(plan.content.tasks[0].completed_at, first);
    }

    #[test]
    fn unknown_task_is_not_found() {
        let mut plan = plan_with_material();
        assert!(matches!(
            plan.mark_task_completed("nope"),
            Err(PlanError::TaskNotFound(_))
        ));
    }

    #[test]
    fn article_open_is_monotone() {
        let mut plan = plan_with_material();
        plan.mark_article_opened("mat-1").unwrap();
        let first = plan.content.material_progress("mat-1").unwrap().article_opened_at;
        plan.mark_article_opened("mat-1").unwrap();
        let progress = plan.content.material_progress("mat-1").unwrap();
        assert!(progress.article_opened);
        assert_eq!(progress.article_opened_at, first);
    }

    #[test]
    fn unknown_material_is_not_found() {
        let mut plan = plan_with_material();
        assert!(matches!(
            plan.mark_article_opened("ghost"),
            Err(PlanError::MaterialNotFound(_))
        ));
    }

    #[test]
    fn achievements_are_id_unique() {
        let mut content = PlanContent::default();
        content.push_achievement(BlockAchievement {
            id: "block_1_beginner".into(),
            title: "Beginner Block Complete".into(),
            achieved_at: None,
        });
        content.push_achievement(BlockAchievement {
            id: "block_1_beginner".into(),
            title: "Duplicate".into(),
            achieved_at: None,
        });
        assert_eq!(content.block_achievements.len(), 1);
        assert_eq!(content.block_achievements[0].title, "Beginner Block Complete");
    }

    #[test]
    fn legacy_document_loads_with_defaults() {
        // A minimal document written before progress tracking existed.
        let yaml = r#"
id: 7
user_id: alice
generated_at: 2026-01-10T00:00:00Z
content:
  weaknesses: ["Communication"]
  materials: []
  tasks: []
  recommended_tests: []
"#;
        let plan: DevelopmentPlan = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(plan.version, 0);
        assert!(!plan.is_archived);
        assert_eq!(plan.content.schema_version, 1);
        assert_eq!(plan.content.target_difficulty, Difficulty::Beginner);
        assert!(plan.content.material_test_map.is_empty());
        assert!(!plan.content.final_stage.unlocked);
    }
}
