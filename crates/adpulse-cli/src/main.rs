//! Adpulse CLI — entry point.
//!
//! # Commands
//!
//! - `adpulse chat [-m MESSAGE] [-s SESSION]` — chat (single-shot or REPL)
//! - `adpulse analyze -c COMMENT ... | -f FILE [-q QUERY]` — batch sentiment analysis
//! - `adpulse init` — write a default configuration file
//! - `adpulse status` — show configuration and completion-service status

mod helpers;
mod init;
mod repl;
mod status;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use adpulse_chat::ChatEngine;
use adpulse_core::config::{load_config, Config};
use adpulse_core::session::spawn_sweeper;
use adpulse_providers::http_provider::create_provider;

/// How often the background sweeper scans for expired sessions.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// 📊 Adpulse — conversational ad-sentiment assistant
#[derive(Parser)]
#[command(name = "adpulse", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant (single-shot or interactive REPL)
    Chat {
        /// Single message (non-interactive). Omit for REPL mode.
        #[arg(short, long)]
        message: Option<String>,

        /// Session identifier to continue an existing conversation
        #[arg(short, long)]
        session: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Analyze a batch of comments for sentiment
    Analyze {
        /// A comment to analyze (repeatable)
        #[arg(short, long = "comment")]
        comments: Vec<String>,

        /// File with comments: JSON array of strings, or one per line
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Steering question for the analysis
        #[arg(short, long)]
        query: Option<String>,

        /// Session identifier to record the analysis under
        #[arg(short, long)]
        session: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Write a default configuration file
    Init,

    /// Show configuration and completion-service status
    Status,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Chat {
            message,
            session,
            logs,
        } => {
            init_logging(logs);
            run_chat(message, session).await
        }
        Commands::Analyze {
            comments,
            file,
            query,
            session,
            logs,
        } => {
            init_logging(logs);
            run_analyze(comments, file, query, session).await
        }
        Commands::Init => init::run(),
        Commands::Status => status::run(),
    }
}

// ─────────────────────────────────────────────
// Chat command
// ─────────────────────────────────────────────

async fn run_chat(message: Option<String>, session: Option<String>) -> Result<()> {
    let config = load_config(None);
    let engine = build_engine(&config)?;

    match message {
        Some(msg) => {
            // Single-shot mode
            info!(session = ?session, "processing single message");
            let reply = engine
                .send(session.as_deref(), &msg, helpers::CLI_CLIENT_ID)
                .await
                .context("chat request failed")?;
            helpers::print_response(&reply.reply);
            println!("{}", format_session_hint(&reply.session_id));
        }
        None => {
            // Interactive REPL mode; expire idle sessions in the background.
            let _sweeper = spawn_sweeper(engine.sessions(), SWEEP_INTERVAL);
            repl::run(engine, session).await?;
        }
    }

    Ok(())
}

// ─────────────────────────────────────────────
// Analyze command
// ─────────────────────────────────────────────

async fn run_analyze(
    mut comments: Vec<String>,
    file: Option<PathBuf>,
    query: Option<String>,
    session: Option<String>,
) -> Result<()> {
    if let Some(path) = file {
        comments.extend(helpers::read_comments_file(&path)?);
    }

    let config = load_config(None);
    let engine = build_engine(&config)?;

    let analysis = engine
        .analyze(&comments, query.as_deref(), session.as_deref())
        .await
        .context("sentiment analysis failed")?;

    helpers::print_response(&analysis.reply);
    println!(
        "Analyzed {} comments ({} sampled in the prompt).",
        analysis.comment_count, analysis.sample_count
    );
    if let Some(id) = &analysis.session_id {
        println!("{}", format_session_hint(id));
    }

    Ok(())
}

/// Build a `ChatEngine` from the loaded configuration.
fn build_engine(config: &Config) -> Result<ChatEngine> {
    let provider = create_provider(&config.completion)
        .context("completion service is not configured")?;
    Ok(ChatEngine::new(config, Arc::new(provider)))
}

fn format_session_hint(session_id: &str) -> String {
    format!("Session: {session_id} (pass -s to continue this conversation)")
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("adpulse=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
