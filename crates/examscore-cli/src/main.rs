//! examscore CLI: grade stored exam attempts from the command line.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "examscore",
    version,
    about = "Exam answer grading and CEFR level classification"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score auto-graded skills of an attempt
    Grade {
        /// JSON fixture holding questions, submissions and records
        #[arg(long)]
        fixture: PathBuf,

        /// Attempt score record ID
        #[arg(long)]
        attempt: String,

        /// Learner ID
        #[arg(long)]
        learner: String,

        /// Exam (session) ID
        #[arg(long)]
        exam: String,

        /// Skill to score, or "all" for every auto-graded skill present
        #[arg(long, default_value = "all")]
        skill: String,

        /// Directory to write reports into
        #[arg(long)]
        output: Option<PathBuf>,

        /// Report formats: json, markdown, html, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write updated records back to the fixture
        #[arg(long)]
        save: bool,
    },

    /// Record a teacher's writing or speaking score
    Manual {
        /// JSON fixture holding questions, submissions and records
        #[arg(long)]
        fixture: PathBuf,

        /// Attempt score record ID
        #[arg(long)]
        attempt: String,

        /// writing or speaking
        #[arg(long)]
        skill: String,

        /// The teacher's score
        #[arg(long, allow_negative_numbers = true)]
        score: f64,

        /// Per-answer comment as QUESTION_ID=TEXT (repeatable)
        #[arg(long = "comment")]
        comments: Vec<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the updated record back to the fixture
        #[arg(long)]
        save: bool,
    },

    /// Map a skill score to its proficiency level
    Classify {
        /// Skill name
        #[arg(long)]
        skill: String,

        /// Skill score
        #[arg(long, allow_negative_numbers = true)]
        score: f64,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a JSON fixture
    Validate {
        /// Path to the fixture
        #[arg(long)]
        fixture: PathBuf,
    },

    /// Create starter config and example fixture
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("examscore=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Grade {
            fixture,
            attempt,
            learner,
            exam,
            skill,
            output,
            format,
            config,
            save,
        } => {
            commands::grade::execute(
                fixture, attempt, learner, exam, skill, output, format, config, save,
            )
            .await
        }
        Commands::Manual {
            fixture,
            attempt,
            skill,
            score,
            comments,
            config,
            save,
        } => commands::manual::execute(fixture, attempt, skill, score, comments, config, save).await,
        Commands::Classify {
            skill,
            score,
            config,
        } => commands::classify::execute(skill, score, config),
        Commands::Validate { fixture } => commands::validate::execute(fixture),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
