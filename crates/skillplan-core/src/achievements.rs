use crate::plan::{BlockAchievement, DevelopmentPlan};
use crate::types::Difficulty;
use std::collections::BTreeSet;

pub fn achievement_id(plan_id: u32, difficulty: Difficulty) -> String {
    format!("block_{}_{}", plan_id, difficulty.as_str())
}

pub fn achievement_title(difficulty: Difficulty) -> String {
    format!("{} Block Complete", difficulty.display_name())
}

/// Merge the achievement history across all of a user's plans, newest
/// first. Plans written before `block_achievements` existed contribute a
/// synthesized entry from their final stage. Entries dedupe by id, then by
/// (title, achieved_at); the result sorts newest first with unparseable or
/// missing timestamps last.
pub fn aggregate_achievements(plans: &[DevelopmentPlan]) -> Vec<BlockAchievement> {
    let mut seen_ids: BTreeSet<String> = BTreeSet::new();
    let mut seen_pairs: BTreeSet<(String, Option<i64>)> = BTreeSet::new();
    let mut merged: Vec<BlockAchievement> = Vec::new();

    for plan in plans {
        let entries: Vec<BlockAchievement> = if !plan.content.block_achievements.is_empty() {
            plan.content.block_achievements.clone()
        } else if plan.content.final_stage.level_up_applied {
            // Legacy record: the block finished before achievements were
            // written into the document.
            vec![BlockAchievement {
                id: achievement_id(plan.id, plan.content.target_difficulty),
                title: plan
                    .content
                    .final_stage
                    .achievement_title
                    .clone()
                    .unwrap_or_else(|| achievement_title(plan.content.target_difficulty)),
                achieved_at: plan.content.final_stage.completed_at,
            }]
        } else {
            Vec::new()
        };

        for entry in entries {
            let pair = (entry.title.clone(), entry.achieved_at.map(|t| t.timestamp_millis()));
            if seen_ids.contains(&entry.id) || seen_pairs.contains(&pair) {
                continue;
            }
            seen_ids.insert(entry.id.clone());
            seen_pairs.insert(pair);
            merged.push(entry);
        }
    }

    // Newest first; entries without a timestamp sink to the end.
    merged.sort_by(|a, b| match (a.achieved_at, b.achieved_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    merged
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlanContent;
    use chrono::{Duration, Utc};

    fn plan(id: u32, content: PlanContent) -> DevelopmentPlan {
        DevelopmentPlan::new(id, "alice", content)
    }

    fn achievement(id: &str, title: &str, days_ago: i64) -> BlockAchievement {
        BlockAchievement {
            id: id.to_string(),
            title: title.to_string(),
            achieved_at: Some(Utc::now() - Duration::days(days_ago)),
        }
    }

    #[test]
    fn merges_and_sorts_newest_first() {
        let mut old = PlanContent::default();
        old.block_achievements.push(achievement("block_1_beginner", "Beginner Block Complete", 10));
        let mut new = PlanContent::default();
        new.block_achievements.push(achievement("block_2_intermediate", "Intermediate Block Complete", 2));
        new.block_achievements.push(achievement("block_1_beginner", "Beginner Block Complete", 10));

        let merged = aggregate_achievements(&[plan(2, new), plan(1, old)]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, "block_2_intermediate");
        assert_eq!(merged[1].id, "block_1_beginner");
    }

    #[test]
    fn synthesizes_from_legacy_final_stage() {
        let mut legacy = PlanContent::default();
        legacy.target_difficulty = Difficulty::Beginner;
        legacy.final_stage.level_up_applied = true;
        legacy.final_stage.completed_at = Some(Utc::now() - Duration::days(30));

        let merged = aggregate_achievements(&[plan(1, legacy)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, "block_1_beginner");
        assert_eq!(merged[0].title, "Beginner Block Complete");
    }

    #[test]
    fn no_double_count_when_both_exist() {
        // The same block appears both as a stored achievement and as a
        // level-up-applied final stage on the same plan.
        let mut content = PlanContent::default();
        content.target_difficulty = Difficulty::Beginner;
        content.final_stage.level_up_applied = true;
        content.final_stage.completed_at = Some(Utc::now() - Duration::days(5));
        content
            .block_achievements
            .push(achievement("block_1_beginner", "Beginner Block Complete", 5));

        let merged = aggregate_achievements(&[plan(1, content)]);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn dedupes_by_title_and_timestamp_across_ids() {
        let when = Utc::now() - Duration::days(3);
        let mut a = PlanContent::default();
        a.block_achievements.push(BlockAchievement {
            id: "block_1_beginner".into(),
            title: "Beginner Block Complete".into(),
            achieved_at: Some(when),
        });
        let mut b = PlanContent::default();
        b.block_achievements.push(BlockAchievement {
            id: "legacy_1".into(),
            title: "Beginner Block Complete".into(),
            achieved_at: Some(when),
        });

        let merged = aggregate_achievements(&[plan(2, a), plan(1, b)]);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn missing_timestamps_sort_last() {
        let mut content = PlanContent::default();
        content.block_achievements.push(BlockAchievement {
            id: "undated".into(),
            title: "Undated".into(),
            achieved_at: None,
        });
        content.block_achievements.push(achievement("dated", "Dated", 1));

        let merged = aggregate_achievements(&[plan(1, content)]);
        assert_eq!(merged[0].id, "dated");
        assert_eq!(merged[1].id, "undated");
    }

    #[test]
    fn incomplete_legacy_plan_contributes_nothing() {
        let mut content = PlanContent::default();
        content.final_stage.completed = true; // but no level-up
        let merged = aggregate_achievements(&[plan(1, content)]);
        assert!(merged.is_empty());
    }
}
