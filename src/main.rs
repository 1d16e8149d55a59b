use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::process;
use tracing::{error, info};

mod analysis;
mod cache;
mod config;
mod logging;
mod model;
mod remote;
mod replica;
mod seed;
mod stats;
mod store;
mod sync;
#[cfg(test)]
mod test_utils;

use crate::cache::SqliteCache;
use crate::model::{SubmissionDraft, SubmissionPatch};
use crate::remote::PostgresMirror;
use crate::replica::ReplicaBus;
use crate::sync::SubmissionSync;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config.toml",
        global = true
    )]
    config: String,

    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the current submission collection
    List,
    /// Show classroom statistics for the current collection
    Stats,
    /// Synchronize with the remote mirror and report the result
    Pull,
    /// Push the full local collection to the remote mirror
    Push,
    /// Create a new submission
    Submit {
        #[arg(long)]
        student_id: String,

        #[arg(long)]
        student_name: String,

        #[arg(long)]
        file_name: String,

        #[arg(long)]
        subject: String,

        /// Where the submitted file can be fetched
        #[arg(long)]
        file_url: Option<String>,
    },
    /// Approve a submission, optionally adjusting its score
    Approve {
        id: String,

        /// Replacement score between 0 and 100
        #[arg(long)]
        score: Option<i32>,
    },
    /// Reject a submission
    Reject { id: String },
    /// Update fields of a submission, leaving the rest untouched
    Update {
        id: String,

        #[arg(long)]
        student_name: Option<String>,

        #[arg(long)]
        file_name: Option<String>,

        #[arg(long)]
        file_url: Option<String>,

        #[arg(long)]
        subject: Option<String>,

        #[arg(long)]
        score: Option<i32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match config::load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            // Logging is not up yet, so this goes straight to stderr
            eprintln!("Failed to load configuration from {}: {e}", cli.config);
            process::exit(1);
        }
    };

    let _log_guard = match logging::init_logging(config.logging.as_ref(), cli.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(1);
        }
    };

    info!("EduBridge submission sync v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded configuration from: {}", cli.config);

    let sync = initialize_sync(&config).await?;

    let result = run_command(&sync, cli.command).await;

    // Outstanding cache saves and remote pushes finish before the process
    // goes away, even when the command itself failed
    sync.shutdown().await;

    if let Err(e) = result {
        error!("Command failed: {e}");
        process::exit(1);
    }

    Ok(())
}

/// Builds the sync handle on the configured backends and brings the local
/// collection up to date
async fn initialize_sync(
    config: &config::Config,
) -> Result<SubmissionSync<SqliteCache, PostgresMirror>> {
    let bus = ReplicaBus::new(config.sync.replica_capacity);
    let sync = SubmissionSync::from_config(config, bus.join()).await?;

    sync.start().await?;
    sync.settle().await;

    info!("Submission sync initialized");
    Ok(sync)
}

async fn run_command(
    sync: &SubmissionSync<SqliteCache, PostgresMirror>,
    command: Commands,
) -> Result<()> {
    match command {
        Commands::List => {
            let snapshot = sync.submissions();
            println!("{} submissions", snapshot.len());
            for sub in snapshot.iter() {
                let score = match sub.ai_score {
                    Some(score) => score.to_string(),
                    None => "-".to_string(),
                };
                println!(
                    "{}  {:<9} score {:>3}  {:<12} {} ({})",
                    sub.id, sub.status, score, sub.subject, sub.file_name, sub.student_name
                );
            }
        }
        Commands::Stats => {
            let stats = sync.stats();
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Pull => {
            // The startup pull already ran; report where the collection
            // landed
            println!(
                "Local collection holds {} submissions",
                sync.submissions().len()
            );
        }
        Commands::Push => {
            sync.push_now()
                .await
                .context("Failed to push to the remote mirror")?;
            println!(
                "Pushed {} submissions to the remote mirror",
                sync.submissions().len()
            );
        }
        Commands::Submit {
            student_id,
            student_name,
            file_name,
            subject,
            file_url,
        } => {
            let record = sync.create(SubmissionDraft {
                student_id,
                student_name,
                file_name,
                subject,
                file_url,
            });
            println!(
                "Created submission {} with placeholder score {}",
                record.id,
                record.ai_score.unwrap_or(0)
            );
        }
        Commands::Approve { id, score } => {
            if !sync.approve(&id, score) {
                anyhow::bail!("No submission with id {id}");
            }
            println!("Approved {id}");
        }
        Commands::Reject { id } => {
            if !sync.reject(&id) {
                anyhow::bail!("No submission with id {id}");
            }
            println!("Rejected {id}");
        }
        Commands::Update {
            id,
            student_name,
            file_name,
            file_url,
            subject,
            score,
        } => {
            let patch = SubmissionPatch {
                student_name,
                file_name,
                file_url,
                subject,
                ai_score: score,
                ..SubmissionPatch::default()
            };
            if !sync.update(&id, &patch) {
                anyhow::bail!("No submission with id {id}");
            }
            println!("Updated {id}");
        }
    }

    Ok(())
}
