use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("store not initialized: run 'skillplan init'")]
    NotInitialized,

    #[error("invalid user slug '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidUserSlug(String),

    #[error("no skill profile for user: {0}")]
    ProfileNotFound(String),

    #[error("plan {plan_id} not found for user {user}")]
    PlanNotFound { user: String, plan_id: u32 },

    #[error("no active plan for user: {0}")]
    NoActivePlan(String),

    #[error("task not found in plan: {0}")]
    TaskNotFound(String),

    #[error("material not found in plan: {0}")]
    MaterialNotFound(String),

    #[error("assessment not found: {0}")]
    AssessmentNotFound(u32),

    #[error("invalid state: {reason}")]
    InvalidState { reason: String },

    #[error("concurrent write on plan {plan_id}: retry the operation")]
    Conflict { plan_id: u32 },

    #[error("invalid skill: {0}")]
    InvalidSkill(String),

    #[error("invalid difficulty: {0}")]
    InvalidDifficulty(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PlanError>;
