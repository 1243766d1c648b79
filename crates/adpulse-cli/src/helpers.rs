//! Shared CLI helpers — banners, response printing, comment-file parsing.

use std::path::Path;

use colored::Colorize;

use adpulse_core::error::ChatError;
use adpulse_core::types::Turn;

/// Client identity for all local traffic — one-shot sends and the REPL
/// draw from the same rate-limit bucket.
pub const CLI_CLIENT_ID: &str = "cli";

/// Print an assistant reply to stdout.
pub fn print_response(response: &str) {
    println!();
    println!("{}", "📊 Adpulse".cyan().bold());
    if response.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{response}");
    }
    println!();
}

/// Print the banner shown at REPL start.
pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "📊 Adpulse".cyan().bold(), version.dimmed());
    println!(
        "{}",
        "Type a message, \"/history\" to review, \"/new\" for a fresh session, or \"exit\" to quit."
            .dimmed()
    );
    println!();
}

/// Print a chat error with its stable kind tag.
pub fn print_error(err: &ChatError) {
    eprintln!();
    eprintln!("{} [{}] {}", "❌".red(), err.kind().yellow(), err);
    eprintln!();
}

/// Print one history turn.
pub fn print_turn(turn: &Turn) {
    let role = match turn.role {
        adpulse_core::types::Role::User => "You".green().bold(),
        adpulse_core::types::Role::Assistant => "Adpulse".cyan().bold(),
        adpulse_core::types::Role::System => "System".dimmed().bold(),
    };
    println!(
        "  {} {}  {}",
        turn.timestamp.format("%H:%M:%S").to_string().dimmed(),
        role,
        turn.content
    );
}

/// Load comments from a file: a JSON array of strings, or one comment
/// per non-empty line.
pub fn read_comments_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;

    if let Ok(parsed) = serde_json::from_str::<Vec<String>>(&raw) {
        return Ok(parsed);
    }

    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
