mod agent;
mod cli;
mod core;
mod error;
mod execution;

use agent::{AgentRegistry, HttpModelClient, ModelClient, ModelClientConfig};
use anyhow::{Context, Result};
use cli::{Cli, Command, ReviewCommand, RunCommand};
use crate::core::{RunConfig, RunFlags, ScriptContext, StationSet, StationStatus};
use execution::{ExecutionEngine, ExecutionEvent};
use std::path::Path;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    match &cli.command {
        Command::Run(cmd) => run_pipeline(cmd, &cli).await?,
        Command::Review(cmd) => review_text(cmd, &cli).await?,
        Command::Stations => print_stations()?,
    }

    Ok(())
}

fn model_client(cli: &Cli) -> Result<HttpModelClient> {
    let api_key = cli
        .api_key
        .clone()
        .or_else(|| std::env::var("DRAMATURG_API_KEY").ok())
        .context("No API key: pass --api-key or set DRAMATURG_API_KEY")?;

    let mut config = ModelClientConfig::new(api_key);
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url.clone());
    }
    HttpModelClient::new(config).context("Failed to build model client")
}

async fn run_pipeline(cmd: &RunCommand, cli: &Cli) -> Result<()> {
    let script = std::fs::read_to_string(&cmd.script)
        .with_context(|| format!("Failed to read script file {}", cmd.script))?;

    let project = cmd.project.clone().unwrap_or_else(|| {
        Path::new(&cmd.script)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string())
    });

    let config = RunConfig::new(project, script)
        .with_language(cmd.language.clone())
        .with_context(ScriptContext {
            title: cmd.title.clone(),
            author: cmd.author.clone(),
            genre: cmd.genre.clone(),
            scene_hints: cmd.scene_hints.clone(),
        })
        .with_flags(RunFlags {
            run_stations: true,
            fast_mode: cmd.fast,
            skip_validation: cmd.skip_validation,
            verbose_logging: cli.verbose,
        });

    let engine = ExecutionEngine::new(
        StationSet::standard()?,
        AgentRegistry::standard()?,
        model_client(cli)?,
    )?;

    if cli.verbose {
        engine.add_event_handler(|event| {
            if let ExecutionEvent::StationStarted { station, name } = event {
                println!("▸ station {station}: {name}");
            }
        });
    }

    let run = engine.run(&config).await?;

    println!("\nRun {} — {}", run.run_id, run.project);
    for result in &run.results {
        match &result.status {
            StationStatus::Completed => {
                println!("  ✓ {} ({} ms)", result.name, result.duration_ms);
            }
            StationStatus::Failed { kind, message } => {
                println!("  ✗ {} — {:?}: {}", result.name, kind, message);
            }
        }
    }
    println!(
        "\n{}/{} stations completed in {} ms",
        run.stations_completed,
        run.results.len(),
        run.total_execution_ms
    );
    Ok(())
}

async fn review_text(cmd: &ReviewCommand, cli: &Cli) -> Result<()> {
    let text = std::fs::read_to_string(&cmd.file)
        .with_context(|| format!("Failed to read file {}", cmd.file))?;

    let client = model_client(cli)?;
    let review = client.review(&text).await?;
    println!("{review}");
    Ok(())
}

fn print_stations() -> Result<()> {
    let stations = StationSet::standard()?;
    for id in stations.ids() {
        if let Some(spec) = stations.spec(id) {
            let deps: Vec<String> = spec.depends_on.iter().map(|d| d.to_string()).collect();
            println!(
                "{}. {} [{}]{}",
                spec.id,
                spec.name,
                spec.schema.name(),
                if deps.is_empty() {
                    String::new()
                } else {
                    format!(" ← {}", deps.join(", "))
                }
            );
        }
    }
    Ok(())
}
