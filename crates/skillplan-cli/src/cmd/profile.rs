use crate::output::{print_json, Table};
use anyhow::Context;
use clap::Subcommand;
use skillplan_core::profile::{SkillProfile, SkillScores};
use skillplan_core::store::Store;
use skillplan_core::types::{Difficulty, Skill};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ProfileSubcommand {
    /// Set a user's skill profile outright
    Set {
        /// User slug
        user: String,
        #[arg(long)]
        communication: f64,
        #[arg(long)]
        emotional_intelligence: f64,
        #[arg(long)]
        critical_thinking: f64,
        #[arg(long)]
        time_management: f64,
        #[arg(long)]
        leadership: f64,
    },

    /// Blend a new set of analysis scores into the profile
    Apply {
        /// User slug
        user: String,
        #[arg(long)]
        communication: f64,
        #[arg(long)]
        emotional_intelligence: f64,
        #[arg(long)]
        critical_thinking: f64,
        #[arg(long)]
        time_management: f64,
        #[arg(long)]
        leadership: f64,
        /// Weight of the new scores in the blend (0.0 - 1.0)
        #[arg(long, default_value = "0.3")]
        weight: f64,
    },

    /// Show a user's current profile
    Show {
        /// User slug
        user: String,
    },

    /// Show a user's profile history (oldest first)
    History {
        /// User slug
        user: String,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: ProfileSubcommand, json: bool) -> anyhow::Result<()> {
    let store = Store::open(root)?;
    match subcmd {
        ProfileSubcommand::Set {
            user,
            communication,
            emotional_intelligence,
            critical_thinking,
            time_management,
            leadership,
        } => {
            let profile = SkillProfile::new(
                communication,
                emotional_intelligence,
                critical_thinking,
                time_management,
                leadership,
            );
            store
                .save_profile(&user, &profile)
                .context("failed to save profile")?;
            println!("Profile set for '{user}' (average {:.1})", profile.average());
            Ok(())
        }
        ProfileSubcommand::Apply {
            user,
            communication,
            emotional_intelligence,
            critical_thinking,
            time_management,
            leadership,
            weight,
        } => apply_scores(
            &store,
            &user,
            SkillScores {
                communication,
                emotional_intelligence,
                critical_thinking,
                time_management,
                leadership,
            },
            weight,
        ),
        ProfileSubcommand::Show { user } => show(&store, &user, json),
        ProfileSubcommand::History { user } => history(&store, &user, json),
    }
}

// ---------------------------------------------------------------------------
// apply
// ---------------------------------------------------------------------------

fn apply_scores(store: &Store, user: &str, scores: SkillScores, weight: f64) -> anyhow::Result<()> {
    let mut profile = match store.profile(user)? {
        Some(p) => p,
        // First analysis seeds the profile directly.
        None => SkillProfile::new(
            scores.communication,
            scores.emotional_intelligence,
            scores.critical_thinking,
            scores.time_management,
            scores.leadership,
        ),
    };
    store.append_profile_history(user, profile.snapshot())?;
    profile.apply_scores(&scores, weight);
    store.save_profile(user, &profile)?;
    println!(
        "Profile updated for '{user}' (average {:.1}, difficulty {})",
        profile.average(),
        Difficulty::from_average(profile.average())
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// show / history
// ---------------------------------------------------------------------------

fn show(store: &Store, user: &str, json: bool) -> anyhow::Result<()> {
    let profile = store
        .profile(user)?
        .with_context(|| format!("no profile for user '{user}'"))?;

    if json {
        print_json(&profile)?;
        return Ok(());
    }

    println!("Profile for '{user}':");
    for &skill in Skill::all() {
        println!("  {:<24} {:>5.1}", skill.display_name(), profile.score(skill));
    }
    println!(
        "  average {:.1} -> {}",
        profile.average(),
        Difficulty::from_average(profile.average()).display_name()
    );
    Ok(())
}

fn history(store: &Store, user: &str, json: bool) -> anyhow::Result<()> {
    let history = store.profile_history(user)?;

    if json {
        print_json(&history)?;
        return Ok(());
    }

    if history.is_empty() {
        println!("No profile history for '{user}'.");
        return Ok(());
    }

    let mut table = Table::new(&["WHEN", "COMM", "EI", "CT", "TM", "LEAD"]);
    for s in &history {
        table.row(vec![
            s.created_at.format("%Y-%m-%d %H:%M").to_string(),
            format!("{:.1}", s.communication),
            format!("{:.1}", s.emotional_intelligence),
            format!("{:.1}", s.critical_thinking),
            format!("{:.1}", s.time_management),
            format!("{:.1}", s.leadership),
        ]);
    }
    table.print();
    Ok(())
}
