use crate::assessment::Assessment;
use crate::plan::MaterialItem;
use crate::types::Skill;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Bind each material to one practice assessment.
///
/// A valid prior binding is kept unless the user already completed it and a
/// fresher same-skill alternative is free: rebinding only ever reduces
/// repetition. New picks walk a per-skill round-robin cursor so successive
/// plans spread across the pool instead of always starting at the lowest
/// id. No assessment is bound twice within one plan; a material stays
/// unbound only when every eligible assessment is taken.
pub fn assign_material_tests(
    materials: &[MaterialItem],
    assessments: &[Assessment],
    previous: &BTreeMap<String, u32>,
    completed_before: &BTreeSet<u32>,
) -> BTreeMap<String, u32> {
    let mut eligible: Vec<&Assessment> = assessments.iter().filter(|a| a.is_practice()).collect();
    eligible.sort_by_key(|a| a.id);

    let mut by_skill: HashMap<Skill, Vec<&Assessment>> = HashMap::new();
    for &a in &eligible {
        if let Some(skill) = a.skill {
            by_skill.entry(skill).or_default().push(a);
        }
    }

    let mut cursors: HashMap<Skill, usize> = HashMap::new();
    let mut used: BTreeSet<u32> = BTreeSet::new();
    let mut bindings: BTreeMap<String, u32> = BTreeMap::new();

    for material in materials {
        let prior = previous
            .get(&material.id)
            .copied()
            .filter(|id| eligible.iter().any(|a| a.id == *id) && !used.contains(id));

        let chosen = match prior {
            Some(id) if !completed_before.contains(&id) => Some(id),
            Some(id) => {
                // Completed: rebind only when a fresh same-skill pick exists.
                next_same_skill(&by_skill, &mut cursors, &used, completed_before, material.skill)
                    .or(Some(id))
            }
            None => {
                next_same_skill(&by_skill, &mut cursors, &used, completed_before, material.skill)
                    .or_else(|| {
                        first_match(&by_skill.get(&material.skill).cloned().unwrap_or_default(), |a| {
                            !used.contains(&a.id)
                        })
                    })
                    .or_else(|| {
                        first_match(&eligible, |a| {
                            !used.contains(&a.id) && !completed_before.contains(&a.id)
                        })
                    })
                    .or_else(|| first_match(&eligible, |a| !used.contains(&a.id)))
            }
        };

        if let Some(id) = chosen {
            used.insert(id);
            bindings.insert(material.id.clone(), id);
        }
    }

    bindings
}

/// Round-robin pick of the next unused, uncompleted assessment for a skill.
fn next_same_skill(
    by_skill: &HashMap<Skill, Vec<&Assessment>>,
    cursors: &mut HashMap<Skill, usize>,
    used: &BTreeSet<u32>,
    completed_before: &BTreeSet<u32>,
    skill: Skill,
) -> Option<u32> {
    let pool = by_skill.get(&skill)?;
    if pool.is_empty() {
        return None;
    }
    let cursor = cursors.entry(skill).or_insert(0);
    for offset in 0..pool.len() {
        let idx = (*cursor + offset) % pool.len();
        let candidate = pool[idx];
        if !used.contains(&candidate.id) && !completed_before.contains(&candidate.id) {
            *cursor = (idx + 1) % pool.len();
            return Some(candidate.id);
        }
    }
    None
}

fn first_match(pool: &[&Assessment], pred: impl Fn(&Assessment) -> bool) -> Option<u32> {
    pool.iter().find(|a| pred(a)).map(|a| a.id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
