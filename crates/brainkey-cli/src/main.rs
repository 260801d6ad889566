//! brainkey CLI: quiz and typing lessons in the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

mod commands;
mod screen;

#[derive(Parser)]
#[command(
    name = "brainkey",
    version,
    about = "AI-generated quiz and typing lessons for K-12 learners"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where lessons come from.
#[derive(Args, Debug, Clone, Default)]
pub struct ProviderArgs {
    /// Provider name from the config file
    #[arg(long)]
    provider: Option<String>,

    /// Model to request instead of the configured default
    #[arg(long)]
    model: Option<String>,

    /// Config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use the built-in offline lesson instead of calling a provider
    #[arg(long)]
    offline: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session
    Play {
        /// Log in straight away with this name
        #[arg(long)]
        name: Option<String>,

        /// Grade level (1-10)
        #[arg(long)]
        grade: Option<String>,

        #[command(flatten)]
        provider: ProviderArgs,
    },

    /// Generate one lesson and print or save its JSON
    Generate {
        /// Subject (math, english, cs, ai)
        #[arg(long)]
        subject: String,

        /// Grade level (1-10)
        #[arg(long)]
        grade: String,

        /// Write the lesson here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        provider: ProviderArgs,
    },

    /// Validate lesson JSON files
    Validate {
        /// Path to a lesson file or a directory of lessons
        #[arg(long)]
        lesson: PathBuf,
    },

    /// List subjects and their question mix
    Subjects,

    /// Create a starter config and a sample lesson
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("brainkey=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play {
            name,
            grade,
            provider,
        } => commands::play::execute(name, grade, provider).await,
        Commands::Generate {
            subject,
            grade,
            output,
            provider,
        } => commands::generate::execute(subject, grade, output, provider).await,
        Commands::Validate { lesson } => commands::validate::execute(lesson),
        Commands::Subjects => commands::subjects::execute(),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
