//! Command-line interface

use clap::{Args, Parser, Subcommand};

/// Screenplay analysis pipeline driving staged LLM agents
#[derive(Debug, Parser)]
#[command(name = "dramaturg")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Provider API key (falls back to DRAMATURG_API_KEY)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Provider base URL override
    #[arg(long, global = true)]
    pub base_url: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full analysis pipeline over a screenplay
    Run(RunCommand),

    /// One-shot unstructured review of a text file
    Review(ReviewCommand),

    /// Print the station graph
    Stations,
}

#[derive(Debug, Args)]
pub struct RunCommand {
    /// Path to the screenplay file
    pub script: String,

    /// Project name (defaults to the file stem)
    #[arg(long)]
    pub project: Option<String>,

    /// Language tag of the script
    #[arg(long, default_value = "en")]
    pub language: String,

    /// Script title hint for the prompts
    #[arg(long)]
    pub title: Option<String>,

    /// Author hint
    #[arg(long)]
    pub author: Option<String>,

    /// Genre hint
    #[arg(long)]
    pub genre: Option<String>,

    /// Free-form scene hints
    #[arg(long)]
    pub scene_hints: Option<String>,

    /// Execute independent stations concurrently
    #[arg(long)]
    pub fast: bool,

    /// Skip payload validation and proceed past failed dependencies
    #[arg(long)]
    pub skip_validation: bool,
}

#[derive(Debug, Args)]
pub struct ReviewCommand {
    /// Path to the text file to review
    pub file: String,
}

impl Cli {
    pub fn from_args() -> Self {
        Self::parse()
    }
}
