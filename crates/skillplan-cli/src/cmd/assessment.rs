use crate::output::{print_json, Table};
use clap::Subcommand;
use skillplan_core::store::Store;
use skillplan_core::types::{AssessmentKind, AssessmentType, Difficulty, Skill};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum AssessmentSubcommand {
    /// Create a practice assessment
    Create {
        /// Title
        title: String,
        /// Description
        #[arg(long, default_value = "")]
        description: String,
        /// Assessment type: quiz, case, simulation
        #[arg(long = "type", default_value = "quiz")]
        assessment_type: String,
        /// Target skill (e.g. communication, leadership)
        #[arg(long)]
        skill: Option<String>,
        /// Target difficulty: beginner, intermediate, advanced
        #[arg(long)]
        difficulty: Option<String>,
    },

    /// List all assessments
    List,

    /// Show one assessment with its questions
    Show {
        /// Assessment id
        id: u32,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: AssessmentSubcommand, json: bool) -> anyhow::Result<()> {
    let store = Store::open(root)?;
    match subcmd {
        AssessmentSubcommand::Create {
            title,
            description,
            assessment_type,
            skill,
            difficulty,
        } => {
            let assessment_type = parse_type(&assessment_type)?;
            let skill = skill.as_deref().map(str::parse::<Skill>).transpose()?;
            let difficulty = difficulty
                .as_deref()
                .map(str::parse::<Difficulty>)
                .transpose()?;
            let assessment = store.create_assessment(
                &title,
                &description,
                assessment_type,
                AssessmentKind::Regular,
                skill,
                difficulty,
                Vec::new(),
            )?;
            println!("Created assessment {} '{}'", assessment.id, assessment.title);
            Ok(())
        }
        AssessmentSubcommand::List => list(&store, json),
        AssessmentSubcommand::Show { id } => show(&store, id, json),
    }
}

fn parse_type(s: &str) -> anyhow::Result<AssessmentType> {
    match s {
        "quiz" => Ok(AssessmentType::Quiz),
        "case" => Ok(AssessmentType::Case),
        "simulation" => Ok(AssessmentType::Simulation),
        other => anyhow::bail!("invalid assessment type '{other}': expected quiz, case, or simulation"),
    }
}

// ---------------------------------------------------------------------------
// list / show
// ---------------------------------------------------------------------------

fn list(store: &Store, json: bool) -> anyhow::Result<()> {
    let assessments = store.list_assessments()?;

    if json {
        print_json(&assessments)?;
        return Ok(());
    }

    if assessments.is_empty() {
        println!("No assessments.");
        return Ok(());
    }

    let mut table = Table::new(&["ID", "TITLE", "TYPE", "KIND", "SKILL", "DIFFICULTY"]);
    for a in &assessments {
        table.row(vec![
            a.id.to_string(),
            a.title.clone(),
            a.assessment_type.to_string(),
            a.kind.to_string(),
            a.skill.map(|s| s.to_string()).unwrap_or_default(),
            a.difficulty.map(|d| d.to_string()).unwrap_or_default(),
        ]);
    }
    table.print();
    Ok(())
}

fn show(store: &Store, id: u32, json: bool) -> anyhow::Result<()> {
    let assessment = store.get_assessment(id)?;

    if json {
        print_json(&assessment)?;
        return Ok(());
    }

    println!("{} '{}' [{}]", assessment.id, assessment.title, assessment.assessment_type);
    if !assessment.description.is_empty() {
        println!("  {}", assessment.description);
    }
    for (i, q) in assessment.questions.iter().enumerate() {
        println!("  {}. {}", i + 1, q.prompt);
        for option in &q.options {
            println!("     - {option}");
        }
    }
    Ok(())
}
