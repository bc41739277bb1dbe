use crate::output::print_json;
use clap::Subcommand;
use skillplan_core::generate::MIN_ANALYSES_FOR_PLAN;
use skillplan_core::store::Store;
use std::path::Path;

#[derive(Subcommand)]
pub enum AnalysisSubcommand {
    /// Record one completed communication analysis
    Record {
        /// User slug
        user: String,
    },

    /// Show how many analyses a user has
    Count {
        /// User slug
        user: String,
    },
}

pub fn run(root: &Path, subcmd: AnalysisSubcommand, json: bool) -> anyhow::Result<()> {
    let store = Store::open(root)?;
    match subcmd {
        AnalysisSubcommand::Record { user } => {
            let count = store.record_analysis(&user)?;
            println!("Recorded analysis #{count} for '{user}'");
            if count == MIN_ANALYSES_FOR_PLAN {
                println!("Plan generation threshold reached.");
            }
            Ok(())
        }
        AnalysisSubcommand::Count { user } => {
            let count = store.analysis_count(&user)?;
            if json {
                print_json(&serde_json::json!({
                    "user": user,
                    "analyses": count,
                    "threshold": MIN_ANALYSES_FOR_PLAN,
                }))?;
            } else {
                println!("{count} analyses for '{user}' (threshold {MIN_ANALYSES_FOR_PLAN})");
            }
            Ok(())
        }
    }
}
