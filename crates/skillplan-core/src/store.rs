use crate::assessment::{Assessment, Question};
use crate::error::{PlanError, Result};
use crate::io::{atomic_write, ensure_dir};
use crate::paths;
use crate::plan::DevelopmentPlan;
use crate::profile::{ProfileSnapshot, SkillProfile};
use crate::types::{AssessmentKind, AssessmentType, Difficulty, Skill};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Record types
// ---------------------------------------------------------------------------

/// One completed-analysis marker. Only the count and recency matter to the
/// plan engine; the analysis payload lives with the scoring pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub created_at: DateTime<Utc>,
}

/// One completion event for an assessment, recorded by the testing
/// subsystem. Read-only for the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub assessment_id: u32,
    pub submitted_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// File-backed persistence handle. Constructed per unit of work and passed
/// into engine components explicitly; holds no state beyond the root path.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Open an existing store root.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !paths::store_dir(&root).is_dir() {
            return Err(PlanError::NotInitialized);
        }
        Ok(Self { root })
    }

    /// Create the store directory tree, idempotent.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        ensure_dir(&paths::store_dir(&root))?;
        ensure_dir(&root.join(paths::USERS_DIR))?;
        let assessments = paths::assessments_path(&root);
        if !assessments.exists() {
            atomic_write(&assessments, b"[]\n")?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ---------------------------------------------------------------------------
    // Assessments
    // ---------------------------------------------------------------------------

    pub fn list_assessments(&self) -> Result<Vec<Assessment>> {
        let path = paths::assessments_path(&self.root);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&path)?;
        let mut assessments: Vec<Assessment> = serde_yaml::from_str(&data)?;
        assessments.sort_by_key(|a| a.id);
        Ok(assessments)
    }

    pub fn get_assessment(&self, id: u32) -> Result<Assessment> {
        self.list_assessments()?
            .into_iter()
            .find(|a| a.id == id)
            .ok_or(PlanError::AssessmentNotFound(id))
    }

    /// Insert or replace by id.
    pub fn save_assessment(&self, assessment: &Assessment) -> Result<()> {
        let mut assessments = self.list_assessments()?;
        assessments.retain(|a| a.id != assessment.id);
        assessments.push(assessment.clone());
        assessments.sort_by_key(|a| a.id);
        self.write_assessments(&assessments)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_assessment(
        &self,
        title: &str,
        description: &str,
        assessment_type: AssessmentType,
        kind: AssessmentKind,
        skill: Option<Skill>,
        difficulty: Option<Difficulty>,
        questions: Vec<Question>,
    ) -> Result<Assessment> {
        let mut assessments = self.list_assessments()?;
        let id = assessments.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        let assessment = Assessment {
            id,
            title: title.to_string(),
            description: description.to_string(),
            assessment_type,
            kind,
            skill,
            difficulty,
            questions,
        };
        assessments.push(assessment.clone());
        self.write_assessments(&assessments)?;
        Ok(assessment)
    }

    fn write_assessments(&self, assessments: &[Assessment]) -> Result<()> {
        let data = serde_yaml::to_string(assessments)?;
        atomic_write(&paths::assessments_path(&self.root), data.as_bytes())
    }

    // ---------------------------------------------------------------------------
    // Profile
    // ---------------------------------------------------------------------------

    pub fn profile(&self, user: &str) -> Result<Option<SkillProfile>> {
        paths::validate_user_slug(user)?;
        let path = paths::profile_path(&self.root, user);
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(Some(serde_yaml::from_str(&data)?))
    }

    pub fn save_profile(&self, user: &str, profile: &SkillProfile) -> Result<()> {
        paths::validate_user_slug(user)?;
        let data = serde_yaml::to_string(profile)?;
        atomic_write(&paths::profile_path(&self.root, user), data.as_bytes())
    }

    pub fn profile_history(&self, user: &str) -> Result<Vec<ProfileSnapshot>> {
        paths::validate_user_slug(user)?;
        let path = paths::profile_history_path(&self.root, user);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&data)?)
    }

    pub fn append_profile_history(&self, user: &str, snapshot: ProfileSnapshot) -> Result<()> {
        let mut history = self.profile_history(user)?;
        history.push(snapshot);
        let data = serde_yaml::to_string(&history)?;
        atomic_write(
            &paths::profile_history_path(&self.root, user),
            data.as_bytes(),
        )
    }

    // ---------------------------------------------------------------------------
    // Analyses
    // ---------------------------------------------------------------------------

    pub fn analysis_count(&self, user: &str) -> Result<usize> {
        paths::validate_user_slug(user)?;
        let path = paths::analyses_path(&self.root, user);
        if !path.exists() {
            return Ok(0);
        }
        let data = std::fs::read_to_string(&path)?;
        let records: Vec<AnalysisRecord> = serde_yaml::from_str(&data)?;
        Ok(records.len())
    }

    pub fn record_analysis(&self, user: &str) -> Result<usize> {
        paths::validate_user_slug(user)?;
        let path = paths::analyses_path(&self.root, user);
        let mut records: Vec<AnalysisRecord> = if path.exists() {
            serde_yaml::from_str(&std::fs::read_to_string(&path)?)?
        } else {
            Vec::new()
        };
        records.push(AnalysisRecord {
            created_at: Utc::now(),
        });
        let data = serde_yaml::to_string(&records)?;
        atomic_write(&path, data.as_bytes())?;
        Ok(records.len())
    }

    // ---------------------------------------------------------------------------
    // Submissions (completion events)
    // ---------------------------------------------------------------------------

    pub fn submissions(&self, user: &str) -> Result<Vec<Submission>> {
        paths::validate_user_slug(user)?;
        let path = paths::submissions_path(&self.root, user);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&data)?)
    }

    pub fn record_submission(&self, user: &str, assessment_id: u32) -> Result<()> {
        self.record_submission_at(user, assessment_id, Utc::now())
    }

    pub fn record_submission_at(
        &self,
        user: &str,
        assessment_id: u32,
        submitted_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut submissions = self.submissions(user)?;
        submissions.push(Submission {
            assessment_id,
            submitted_at,
        });
        let data = serde_yaml::to_string(&submissions)?;
        atomic_write(&paths::submissions_path(&self.root, user), data.as_bytes())
    }

    /// Which of `assessment_ids` the user has a completion event for, within
    /// an optional `[after, before)` window.
    pub fn completed_assessment_ids(
        &self,
        user: &str,
        assessment_ids: &[u32],
        after: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
    ) -> Result<BTreeSet<u32>> {
        let wanted: BTreeSet<u32> = assessment_ids.iter().copied().collect();
        let completed = self
            .submissions(user)?
            .into_iter()
            .filter(|s| wanted.contains(&s.assessment_id))
            .filter(|s| after.map(|t| s.submitted_at >= t).unwrap_or(true))
            .filter(|s| before.map(|t| s.submitted_at < t).unwrap_or(true))
            .map(|s| s.assessment_id)
            .collect();
        Ok(completed)
    }

    // ---------------------------------------------------------------------------
    // Plans
    // ---------------------------------------------------------------------------

    /// All plans for a user, newest first. Archived plans are never deleted,
    /// so this is the full block history.
    pub fn list_plans(&self, user: &str) -> Result<Vec<DevelopmentPlan>> {
        paths::validate_user_slug(user)?;
        let dir = paths::plans_dir(&self.root, user);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut plans = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with("plan-") && name.ends_with(".yaml") {
                let data = std::fs::read_to_string(entry.path())?;
                plans.push(serde_yaml::from_str::<DevelopmentPlan>(&data)?);
            }
        }
        plans.sort_by(|a, b| b.generated_at.cmp(&a.generated_at).then(b.id.cmp(&a.id)));
        Ok(plans)
    }

    /// The single non-archived plan, if any.
    pub fn active_plan(&self, user: &str) -> Result<Option<DevelopmentPlan>> {
        Ok(self
            .list_plans(user)?
            .into_iter()
            .find(|p| !p.is_archived))
    }

    pub fn load_plan(&self, user: &str, plan_id: u32) -> Result<DevelopmentPlan> {
        paths::validate_user_slug(user)?;
        let path = paths::plan_path(&self.root, user, plan_id);
        if !path.exists() {
            return Err(PlanError::PlanNotFound {
                user: user.to_string(),
                plan_id,
            });
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&data)?)
    }

    pub fn next_plan_id(&self, user: &str) -> Result<u32> {
        Ok(self
            .list_plans(user)?
            .iter()
            .map(|p| p.id)
            .max()
            .unwrap_or(0)
            + 1)
    }

    /// Save a plan under an optimistic version check: the on-disk version
    /// must equal the version the caller read, or the write is rejected with
    /// `Conflict` so overlapping syncs cannot clobber each other.
    pub fn save_plan(&self, user: &str, plan: &mut DevelopmentPlan) -> Result<()> {
        paths::validate_user_slug(user)?;
        let path = paths::plan_path(&self.root, user, plan.id);
        if path.exists() {
            let on_disk: DevelopmentPlan = serde_yaml::from_str(&std::fs::read_to_string(&path)?)?;
            if on_disk.version != plan.version {
                return Err(PlanError::Conflict { plan_id: plan.id });
            }
        }
        plan.version += 1;
        let data = serde_yaml::to_string(plan)?;
        atomic_write(&path, data.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
