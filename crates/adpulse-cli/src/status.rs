//! `adpulse status` — show configuration and completion-service status.

use anyhow::Result;
use colored::Colorize;

use adpulse_core::config::{get_config_path, load_config};

/// Run the status command.
pub fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();

    println!();
    println!("{}", "📊 Adpulse Status".cyan().bold());
    println!();

    // Config
    let config_exists = config_path.exists();
    println!(
        "  {:<22} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_exists {
            "✓".green().to_string()
        } else {
            "(not found, using defaults)".red().to_string()
        }
    );

    // Completion service
    println!(
        "  {:<22} {}",
        "API base:".bold(),
        config.completion.api_base
    );
    println!("  {:<22} {}", "Model:".bold(), config.completion.model);
    println!(
        "  {:<22} {} | max_tokens: {} | timeout: {}s",
        "Parameters:".bold(),
        format!("temp: {}", config.completion.temperature).dimmed(),
        format!("{}", config.completion.max_tokens).dimmed(),
        format!("{}", config.completion.request_timeout_seconds).dimmed(),
    );

    let key_status = if config.completion.is_configured() {
        format!("{} (key set)", "✓".green())
    } else {
        format!("{}", "· not configured".dimmed())
    };
    println!("  {:<22} {}", "API key:".bold(), key_status);

    // Chat policy
    println!();
    println!("  {}", "Chat policy:".bold());
    println!(
        "    {:<20} {} / minute per client",
        "Rate limit:",
        config.chat.rate_limit_per_minute
    );
    println!(
        "    {:<20} {} minutes",
        "Session timeout:",
        config.chat.session_timeout_minutes
    );
    println!(
        "    {:<20} {} chars",
        "Max message:",
        config.chat.max_message_chars
    );
    println!(
        "    {:<20} {} per batch",
        "Max comments:",
        config.chat.max_comments
    );

    println!();

    Ok(())
}
