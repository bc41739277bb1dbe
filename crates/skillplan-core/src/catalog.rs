use crate::plan::MaterialItem;
use crate::types::{Difficulty, MaterialType, Skill};
use std::collections::BTreeSet;

/// Most materials a single plan carries.
pub const MAX_MATERIALS: usize = 7;
/// Per-skill cap inside one plan, relaxed only when the catalog runs short.
pub const SKILL_CAP: usize = 3;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

struct CatalogEntry {
    id: &'static str,
    title: &'static str,
    url: &'static str,
    material_type: MaterialType,
    skill: Skill,
}

const fn entry(
    id: &'static str,
    title: &'static str,
    url: &'static str,
    material_type: MaterialType,
    skill: Skill,
) -> CatalogEntry {
    CatalogEntry {
        id,
        title,
        url,
        material_type,
        skill,
    }
}

// Five entries per skill, grouped in skill declaration order. Within a
// skill the order is the pick order.
const CATALOG: &[CatalogEntry] = &[
    entry(
        "mat_communication_active_listening",
        "Active Listening: Hear What People Really Say",
        "https://en.wikipedia.org/wiki/Active_listening",
        MaterialType::Article,
        Skill::Communication,
    ),
    entry(
        "mat_communication_nonviolent",
        "Nonviolent Communication in Everyday Conversations",
        "https://en.wikipedia.org/wiki/Nonviolent_Communication",
        MaterialType::Article,
        Skill::Communication,
    ),
    entry(
        "mat_communication_feedback_video",
        "Giving Feedback That Lands",
        "https://www.youtube.com/watch?v=wtl5UrrgU8c",
        MaterialType::Video,
        Skill::Communication,
    ),
    entry(
        "mat_communication_writing",
        "Writing Clearly at Work",
        "https://en.wikipedia.org/wiki/Plain_language",
        MaterialType::Article,
        Skill::Communication,
    ),
    entry(
        "mat_communication_course",
        "Structured Conversations: A Short Course",
        "https://www.coursera.org/learn/wharton-communication-skills",
        MaterialType::Course,
        Skill::Communication,
    ),
    entry(
        "mat_ei_basics",
        "Emotional Intelligence: The Core Model",
        "https://en.wikipedia.org/wiki/Emotional_intelligence",
        MaterialType::Article,
        Skill::EmotionalIntelligence,
    ),
    entry(
        "mat_ei_self_awareness",
        "Self-Awareness Before Self-Management",
        "https://en.wikipedia.org/wiki/Self-awareness",
        MaterialType::Article,
        Skill::EmotionalIntelligence,
    ),
    entry(
        "mat_ei_empathy_video",
        "Empathy Is a Skill, Not a Trait",
        "https://www.youtube.com/watch?v=1Evwgu369Jw",
        MaterialType::Video,
        Skill::EmotionalIntelligence,
    ),
    entry(
        "mat_ei_regulation",
        "Emotion Regulation Under Pressure",
        "https://en.wikipedia.org/wiki/Emotional_self-regulation",
        MaterialType::Article,
        Skill::EmotionalIntelligence,
    ),
    entry(
        "mat_ei_course",
        "Working With Emotions: A Practical Course",
        "https://www.coursera.org/learn/emotional-intelligence-ei",
        MaterialType::Course,
        Skill::EmotionalIntelligence,
    ),
    entry(
        "mat_ct_questions",
        "Critical Thinking: Asking the Right Questions",
        "https://en.wikipedia.org/wiki/Critical_thinking",
        MaterialType::Article,
        Skill::CriticalThinking,
    ),
    entry(
        "mat_ct_biases",
        "A Field Guide to Cognitive Biases",
        "https://en.wikipedia.org/wiki/List_of_cognitive_biases",
        MaterialType::Article,
        Skill::CriticalThinking,
    ),
    entry(
        "mat_ct_argument_video",
        "Spotting Weak Arguments Fast",
        "https://www.youtube.com/watch?v=iSZ3BUru59A",
        MaterialType::Video,
        Skill::CriticalThinking,
    ),
    entry(
        "mat_ct_fallacies",
        "Logical Fallacies You Meet Every Week",
        "https://en.wikipedia.org/wiki/List_of_fallacies",
        MaterialType::Article,
        Skill::CriticalThinking,
    ),
    entry(
        "mat_ct_course",
        "Reasoning and Decision Quality: A Course",
        "https://www.coursera.org/learn/critical-thinking-skills",
        MaterialType::Course,
        Skill::CriticalThinking,
    ),
    entry(
        "mat_tm_prioritization",
        "Prioritization: Impact Over Urgency",
        "https://en.wikipedia.org/wiki/Time_management",
        MaterialType::Article,
        Skill::TimeManagement,
    ),
    entry(
        "mat_tm_deep_work",
        "Protecting Blocks of Focused Time",
        "https://en.wikipedia.org/wiki/Flow_(psychology)",
        MaterialType::Article,
        Skill::TimeManagement,
    ),
    entry(
        "mat_tm_planning_video",
        "Weekly Planning in 20 Minutes",
        "https://www.youtube.com/watch?v=tT89OZ7TNwc",
        MaterialType::Video,
        Skill::TimeManagement,
    ),
    entry(
        "mat_tm_estimation",
        "Why Everything Takes Longer Than You Think",
        "https://en.wikipedia.org/wiki/Planning_fallacy",
        MaterialType::Article,
        Skill::TimeManagement,
    ),
    entry(
        "mat_tm_course",
        "Own Your Calendar: A Time Management Course",
        "https://www.coursera.org/learn/work-smarter-not-harder",
        MaterialType::Course,
        Skill::TimeManagement,
    ),
    entry(
        "mat_lead_delegation",
        "Delegation Without Abdication",
        "https://en.wikipedia.org/wiki/Delegation",
        MaterialType::Article,
        Skill::Leadership,
    ),
    entry(
        "mat_lead_situational",
        "Situational Leadership in Practice",
        "https://en.wikipedia.org/wiki/Situational_leadership_theory",
        MaterialType::Article,
        Skill::Leadership,
    ),
    entry(
        "mat_lead_trust_video",
        "Building Trust Faster Than Titles Do",
        "https://www.youtube.com/watch?v=pVeq-0dIqpk",
        MaterialType::Video,
        Skill::Leadership,
    ),
    entry(
        "mat_lead_difficult",
        "Leading Through Difficult Conversations",
        "https://en.wikipedia.org/wiki/Crucial_Conversations",
        MaterialType::Article,
        Skill::Leadership,
    ),
    entry(
        "mat_lead_course",
        "First-Time Leadership: A Course",
        "https://www.coursera.org/learn/leadership-skills",
        MaterialType::Course,
        Skill::Leadership,
    ),
];

// ---------------------------------------------------------------------------
// Curated selection
// ---------------------------------------------------------------------------

/// Pick up to [`MAX_MATERIALS`] catalog entries for a new plan.
///
/// Priority order is the weaknesses first (weakest first), then the
/// remaining skills in declaration order. Constraints relax in a fixed
/// order when the catalog runs short: first the per-skill cap, then the
/// recent-repeat exclusion set. Deterministic: identical inputs produce
/// the identical ordered output.
pub fn select_materials(
    weaknesses: &[Skill],
    target_difficulty: Difficulty,
    excluded_ids: &BTreeSet<String>,
) -> Vec<MaterialItem> {
    let priority = priority_skills(weaknesses);
    let ordered: Vec<&CatalogEntry> = priority
        .iter()
        .flat_map(|&skill| CATALOG.iter().filter(move |e| e.skill == skill))
        .collect();

    let mut picked: Vec<&CatalogEntry> = Vec::new();

    // Pass 1: honor both the exclusion set and the per-skill cap.
    for &entry in &ordered {
        if picked.len() >= MAX_MATERIALS {
            break;
        }
        if excluded_ids.contains(entry.id) || is_picked(&picked, entry) {
            continue;
        }
        if skill_count(&picked, entry.skill) >= SKILL_CAP {
            continue;
        }
        picked.push(entry);
    }

    // Pass 2: relax the per-skill cap.
    for &entry in &ordered {
        if picked.len() >= MAX_MATERIALS {
            break;
        }
        if excluded_ids.contains(entry.id) || is_picked(&picked, entry) {
            continue;
        }
        picked.push(entry);
    }

    // Pass 3: relax the exclusion set. Repeats beat an empty plan.
    for &entry in &ordered {
        if picked.len() >= MAX_MATERIALS {
            break;
        }
        if is_picked(&picked, entry) {
            continue;
        }
        picked.push(entry);
    }

    ensure_type_mix(&mut picked, &ordered, excluded_ids);

    picked
        .into_iter()
        .map(|e| MaterialItem {
            id: e.id.to_string(),
            title: e.title.to_string(),
            url: e.url.to_string(),
            material_type: e.material_type,
            skill: e.skill,
            difficulty: target_difficulty,
        })
        .collect()
}

fn priority_skills(weaknesses: &[Skill]) -> Vec<Skill> {
    let mut priority: Vec<Skill> = Vec::with_capacity(Skill::all().len());
    for &skill in weaknesses {
        if !priority.contains(&skill) {
            priority.push(skill);
        }
    }
    for &skill in Skill::all() {
        if !priority.contains(&skill) {
            priority.push(skill);
        }
    }
    priority
}

fn is_picked(picked: &[&CatalogEntry], entry: &CatalogEntry) -> bool {
    picked.iter().any(|p| p.id == entry.id)
}

fn skill_count(picked: &[&CatalogEntry], skill: Skill) -> usize {
    picked.iter().filter(|p| p.skill == skill).count()
}

/// If the picked set is all articles, swap the last article for the first
/// course or video in priority order, preferring entries outside the
/// exclusion set.
fn ensure_type_mix(
    picked: &mut Vec<&'static CatalogEntry>,
    ordered: &[&'static CatalogEntry],
    excluded_ids: &BTreeSet<String>,
) {
    let has_mix = picked
        .iter()
        .any(|e| matches!(e.material_type, MaterialType::Course | MaterialType::Video));
    if has_mix || picked.is_empty() {
        return;
    }
    let Some(last_article) = picked
        .iter()
        .rposition(|e| e.material_type == MaterialType::Article)
    else {
        return;
    };
    let replacement = ordered
        .iter()
        .copied()
        .filter(|e| matches!(e.material_type, MaterialType::Course | MaterialType::Video))
        .filter(|e| !is_picked(picked, e))
        .find(|e| !excluded_ids.contains(e.id))
        .or_else(|| {
            ordered
                .iter()
                .copied()
                .filter(|e| {
                    matches!(e.material_type, MaterialType::Course | MaterialType::Video)
                })
                .find(|e| !is_picked(picked, e))
        });
    if let Some(replacement) = replacement {
        picked[last_article] = replacement;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
