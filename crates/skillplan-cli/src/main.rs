mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    analysis::AnalysisSubcommand, assessment::AssessmentSubcommand, plan::PlanSubcommand,
    profile::ProfileSubcommand, submission::SubmissionSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "skillplan",
    about = "Soft-skill development plans — generate blocks, track progress, level up",
    version,
    propagate_version = true
)]
struct Cli {
    /// Store root (default: auto-detect from .skillplan/ or .git/)
    #[arg(long, global = true, env = "SKILLPLAN_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the plan store in the current project
    Init,

    /// Manage skill profiles
    Profile {
        #[command(subcommand)]
        subcommand: ProfileSubcommand,
    },

    /// Record and count communication analyses
    Analysis {
        #[command(subcommand)]
        subcommand: AnalysisSubcommand,
    },

    /// Manage the assessment catalog
    Assessment {
        #[command(subcommand)]
        subcommand: AssessmentSubcommand,
    },

    /// Record and list assessment submissions
    Submission {
        #[command(subcommand)]
        subcommand: SubmissionSubcommand,
    },

    /// Manage development plans
    Plan {
        #[command(subcommand)]
        subcommand: PlanSubcommand,
    },

    /// Show a user's achievement history across all plans
    Achievements {
        /// User slug
        user: String,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Profile { subcommand } => cmd::profile::run(&root, subcommand, cli.json),
        Commands::Analysis { subcommand } => cmd::analysis::run(&root, subcommand, cli.json),
        Commands::Assessment { subcommand } => cmd::assessment::run(&root, subcommand, cli.json),
        Commands::Submission { subcommand } => cmd::submission::run(&root, subcommand, cli.json),
        Commands::Plan { subcommand } => cmd::plan::run(&root, subcommand, cli.json),
        Commands::Achievements { user } => cmd::plan::achievements(&root, &user, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
