use crate::output::{print_json, Table};
use clap::Subcommand;
use skillplan_core::store::Store;
use std::path::Path;

#[derive(Subcommand)]
pub enum SubmissionSubcommand {
    /// Record a completed assessment submission
    Record {
        /// User slug
        user: String,
        /// Assessment id
        assessment_id: u32,
    },

    /// List a user's submissions
    List {
        /// User slug
        user: String,
    },
}

pub fn run(root: &Path, subcmd: SubmissionSubcommand, json: bool) -> anyhow::Result<()> {
    let store = Store::open(root)?;
    match subcmd {
        SubmissionSubcommand::Record {
            user,
            assessment_id,
        } => {
            // Fails cleanly if the assessment does not exist.
            let assessment = store.get_assessment(assessment_id)?;
            store.record_submission(&user, assessment_id)?;
            println!("Recorded submission of '{}' for '{user}'", assessment.title);
            Ok(())
        }
        SubmissionSubcommand::List { user } => {
            let submissions = store.submissions(&user)?;
            if json {
                print_json(&submissions)?;
                return Ok(());
            }
            if submissions.is_empty() {
                println!("No submissions for '{user}'.");
                return Ok(());
            }
            let mut table = Table::new(&["ASSESSMENT", "SUBMITTED"]);
            for s in &submissions {
                table.row(vec![
                    s.assessment_id.to_string(),
                    s.submitted_at.format("%Y-%m-%d %H:%M").to_string(),
                ]);
            }
            table.print();
            Ok(())
        }
    }
}
