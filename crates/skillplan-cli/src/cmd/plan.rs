use crate::output::{print_json, Table};
use clap::Subcommand;
use skillplan_core::engine::PlanEngine;
use skillplan_core::generate::UnavailableGenerator;
use skillplan_core::plan::DevelopmentPlan;
use skillplan_core::store::Store;
use skillplan_core::types::TaskStatus;
use skillplan_core::PlanError;
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum PlanSubcommand {
    /// Generate a new plan now, archiving the current one
    Generate {
        /// User slug
        user: String,
    },

    /// Generate a plan only if a trigger condition holds
    Refresh {
        /// User slug
        user: String,
    },

    /// Show the active plan with up-to-date progress
    Show {
        /// User slug
        user: String,
    },

    /// List all plans, newest first
    Library {
        /// User slug
        user: String,
    },

    /// Mark a plan task as completed
    CompleteTask {
        /// User slug
        user: String,
        /// Plan id
        plan_id: u32,
        /// Task id
        task_id: String,
    },

    /// Mark a material as opened
    OpenMaterial {
        /// User slug
        user: String,
        /// Plan id
        plan_id: u32,
        /// Material id
        material_id: String,
    },

    /// Level up out of a finished block and start the next one
    Advance {
        /// User slug
        user: String,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: PlanSubcommand, json: bool) -> anyhow::Result<()> {
    let store = Store::open(root)?;
    let generator = UnavailableGenerator;
    let engine = PlanEngine::new(&store, &generator);

    match subcmd {
        PlanSubcommand::Generate { user } => {
            let plan = engine.generate_plan(&user)?;
            if json {
                print_json(&plan)?;
            } else {
                println!("Generated plan {} for '{user}'", plan.id);
                render_plan(&plan);
            }
            Ok(())
        }
        PlanSubcommand::Refresh { user } => match engine.generate_or_refresh_plan(&user)? {
            Some(plan) => {
                if json {
                    print_json(&plan)?;
                } else {
                    println!("Refreshed: new plan {} for '{user}'", plan.id);
                }
                Ok(())
            }
            None => {
                if json {
                    print_json(&serde_json::json!({ "refreshed": false }))?;
                } else {
                    println!("Nothing to do: the active plan is still current.");
                }
                Ok(())
            }
        },
        PlanSubcommand::Show { user } => {
            let plan = engine.active_plan_with_progress(&user)?;
            if json {
                print_json(&plan)?;
            } else {
                render_plan(&plan);
            }
            Ok(())
        }
        PlanSubcommand::Library { user } => library(&store, &engine, &user, json),
        PlanSubcommand::CompleteTask {
            user,
            plan_id,
            task_id,
        } => {
            let plan = engine.mark_task_completed(&user, plan_id, &task_id)?;
            if json {
                print_json(&plan)?;
            } else {
                println!(
                    "Task '{task_id}' completed ({:.0}% overall)",
                    plan.content.progress.percentage
                );
            }
            Ok(())
        }
        PlanSubcommand::OpenMaterial {
            user,
            plan_id,
            material_id,
        } => {
            let plan = engine.mark_material_article_opened(&user, plan_id, &material_id)?;
            if json {
                print_json(&plan)?;
            } else {
                println!(
                    "Material '{material_id}' opened ({:.0}% overall)",
                    plan.content.progress.percentage
                );
            }
            Ok(())
        }
        PlanSubcommand::Advance { user } => {
            let outcome = engine.advance_to_next_block(&user)?;
            if json {
                print_json(&serde_json::json!({
                    "level_up_applied": outcome.level_up_applied,
                    "already_applied": outcome.already_applied,
                    "new_plan_id": outcome.new_plan_id,
                    "achievement": outcome.achievement_title,
                }))?;
            } else if outcome.already_applied {
                println!(
                    "Level-up was already applied; regenerated plan {}.",
                    outcome.new_plan_id
                );
            } else {
                println!("{}! Started plan {}.", outcome.achievement_title, outcome.new_plan_id);
            }
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// achievements (top-level command)
// ---------------------------------------------------------------------------

pub fn achievements(root: &Path, user: &str, json: bool) -> anyhow::Result<()> {
    let store = Store::open(root)?;
    let generator = UnavailableGenerator;
    let engine = PlanEngine::new(&store, &generator);
    let achievements = engine.achievements(user)?;

    if json {
        print_json(&achievements)?;
        return Ok(());
    }

    if achievements.is_empty() {
        println!("No achievements yet for '{user}'.");
        return Ok(());
    }

    let mut table = Table::new(&["ACHIEVEMENT", "DATE"]);
    for a in &achievements {
        table.row(vec![
            a.title.clone(),
            a.achieved_at
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    table.print();
    Ok(())
}

// ---------------------------------------------------------------------------
// library
// ---------------------------------------------------------------------------

fn library(store: &Store, engine: &PlanEngine, user: &str, json: bool) -> anyhow::Result<()> {
    // Syncing the active plan first keeps the listing honest. Having no
    // active plan is fine here; any other error is real.
    match engine.active_plan_with_progress(user) {
        Ok(_) | Err(PlanError::NoActivePlan(_)) => {}
        Err(e) => return Err(e.into()),
    }
    let plans = store.list_plans(user)?;

    if json {
        print_json(&plans)?;
        return Ok(());
    }

    if plans.is_empty() {
        println!("No plans for '{user}'.");
        return Ok(());
    }

    let mut table = Table::new(&["ID", "GENERATED", "DIFFICULTY", "PROGRESS", "STATUS"]);
    for p in &plans {
        table.row(vec![
            p.id.to_string(),
            p.generated_at.format("%Y-%m-%d").to_string(),
            p.content.target_difficulty.to_string(),
            format!("{:.0}%", p.content.progress.percentage),
            if p.is_archived { "archived" } else { "active" }.to_string(),
        ]);
    }
    table.print();
    Ok(())
}

// ---------------------------------------------------------------------------
// rendering
// ---------------------------------------------------------------------------

fn render_plan(plan: &DevelopmentPlan) {
    println!(
        "Plan {} [{}] — {:.0}% complete",
        plan.id,
        plan.content.target_difficulty.display_name(),
        plan.content.progress.percentage
    );
    println!("Focus areas: {}", plan.content.weaknesses.join(", "));

    println!("\nMaterials:");
    for material in &plan.content.materials {
        let progress = plan.content.material_progress(&material.id);
        let opened = progress.map(|p| p.article_opened).unwrap_or(false);
        let test_done = progress.map(|p| p.test_completed).unwrap_or(false);
        let linked = progress.and_then(|p| p.linked_test_id);
        println!(
            "  [{}] {} ({}) {}",
            if opened { "x" } else { " " },
            material.title,
            material.material_type,
            match linked {
                Some(id) if test_done => format!("test #{id} done"),
                Some(id) => format!("test #{id} pending"),
                None => "no test linked".to_string(),
            }
        );
    }

    println!("\nTasks:");
    for task in &plan.content.tasks {
        println!(
            "  [{}] {} — {}",
            if task.status == TaskStatus::Completed { "x" } else { " " },
            task.id,
            task.description
        );
    }

    if !plan.content.recommended_tests.is_empty() {
        println!("\nRecommended tests:");
        for rec in &plan.content.recommended_tests {
            println!("  #{} {} — {}", rec.test_id, rec.title, rec.reason);
        }
    }

    let stage = &plan.content.final_stage;
    println!("\nFinal stage: {}", match (stage.completed, stage.unlocked) {
        (true, _) => "completed",
        (false, true) => "unlocked",
        (false, false) => "locked",
    });
    if let (Some(test), Some(sim)) = (stage.final_test_id, stage.final_simulation_id) {
        println!(
            "  final test #{test} [{}]  final simulation #{sim} [{}]",
            if stage.final_test_completed { "x" } else { " " },
            if stage.final_simulation_completed { "x" } else { " " },
        );
    }
}
