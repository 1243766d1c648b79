//! Interactive REPL over the chat engine.
//!
//! Uses `rustyline` for readline-style editing with persistent history.

use anyhow::Result;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use adpulse_chat::ChatEngine;

use crate::helpers;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// Run the interactive REPL loop.
pub async fn run(engine: ChatEngine, session: Option<String>) -> Result<()> {
    helpers::print_banner();

    let mut editor = create_editor()?;
    let mut session_id = session;

    loop {
        let input = match editor.readline("You: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => break,
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_exit_command(trimmed) {
            println!("\nGoodbye! 👋");
            break;
        }

        let _ = editor.add_history_entry(&input);

        if trimmed == "/new" {
            if let Some(old) = session_id.take() {
                engine.delete_session(&old);
            }
            println!("Started a fresh session.");
            continue;
        }

        if trimmed == "/history" {
            show_history(&engine, session_id.as_deref());
            continue;
        }

        debug!(session = ?session_id, input = trimmed, "processing input");

        match engine
            .send(session_id.as_deref(), trimmed, helpers::CLI_CLIENT_ID)
            .await
        {
            Ok(reply) => {
                session_id = Some(reply.session_id.clone());
                helpers::print_response(&reply.reply);
            }
            Err(e) => helpers::print_error(&e),
        }
    }

    save_history(&mut editor);

    Ok(())
}

fn show_history(engine: &ChatEngine, session_id: Option<&str>) {
    let Some(id) = session_id else {
        println!("No session yet — send a message first.");
        return;
    };
    match engine.history(id) {
        Ok(turns) => {
            println!();
            for turn in &turns {
                helpers::print_turn(turn);
            }
            println!();
        }
        Err(e) => helpers::print_error(&e),
    }
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// Path to the history file.
fn history_path() -> std::path::PathBuf {
    adpulse_core::config::get_data_path()
        .join("history")
        .join("cli_history")
}

/// Check if input is an exit command.
fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
