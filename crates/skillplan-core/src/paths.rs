use crate::error::{PlanError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const STORE_DIR: &str = ".skillplan";
pub const USERS_DIR: &str = ".skillplan/users";

pub const ASSESSMENTS_FILE: &str = ".skillplan/assessments.yaml";

pub const PROFILE_FILE: &str = "profile.yaml";
pub const PROFILE_HISTORY_FILE: &str = "profile_history.yaml";
pub const ANALYSES_FILE: &str = "analyses.yaml";
pub const SUBMISSIONS_FILE: &str = "submissions.yaml";
pub const PLANS_DIR: &str = "plans";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn store_dir(root: &Path) -> PathBuf {
    root.join(STORE_DIR)
}

pub fn assessments_path(root: &Path) -> PathBuf {
    root.join(ASSESSMENTS_FILE)
}

pub fn user_dir(root: &Path, user: &str) -> PathBuf {
    root.join(USERS_DIR).join(user)
}

pub fn profile_path(root: &Path, user: &str) -> PathBuf {
    user_dir(root, user).join(PROFILE_FILE)
}

pub fn profile_history_path(root: &Path, user: &str) -> PathBuf {
    user_dir(root, user).join(PROFILE_HISTORY_FILE)
}

pub fn analyses_path(root: &Path, user: &str) -> PathBuf {
    user_dir(root, user).join(ANALYSES_FILE)
}

pub fn submissions_path(root: &Path, user: &str) -> PathBuf {
    user_dir(root, user).join(SUBMISSIONS_FILE)
}

pub fn plans_dir(root: &Path, user: &str) -> PathBuf {
    user_dir(root, user).join(PLANS_DIR)
}

pub fn plan_path(root: &Path, user: &str, plan_id: u32) -> PathBuf {
    plans_dir(root, user).join(format!("plan-{plan_id}.yaml"))
}

// ---------------------------------------------------------------------------
// Slug validation
// ---------------------------------------------------------------------------

fn user_slug_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9-]*$").expect("valid regex"))
}

/// User slugs are lowercase alphanumeric with hyphens, and double as
/// directory names under the store root.
pub fn validate_user_slug(slug: &str) -> Result<()> {
    if slug.is_empty() || slug.len() > 64 || !user_slug_regex().is_match(slug) {
        return Err(PlanError::InvalidUserSlug(slug.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_slugs() {
        assert!(validate_user_slug("alice").is_ok());
        assert!(validate_user_slug("user-42").is_ok());
        assert!(validate_user_slug("7th-user").is_ok());
    }

    #[test]
    fn invalid_slugs() {
        assert!(validate_user_slug("").is_err());
        assert!(validate_user_slug("Alice").is_err());
        assert!(validate_user_slug("-leading").is_err());
        assert!(validate_user_slug("has space").is_err());
        assert!(validate_user_slug("dot.dot").is_err());
    }

    #[test]
    fn plan_path_layout() {
        let p = plan_path(Path::new("/tmp/x"), "alice", 3);
        assert_eq!(
            p,
            Path::new("/tmp/x/.skillplan/users/alice/plans/plan-3.yaml")
        );
    }
}
