//! `adpulse init` — write a default configuration file.

use anyhow::Result;
use colored::Colorize;

use adpulse_core::config::{get_config_path, load_config, save_config};

/// Run the init command.
pub fn run() -> Result<()> {
    println!();
    println!("{}", "📊 Adpulse — Setup".cyan().bold());
    println!();

    let config_path = get_config_path();

    if config_path.exists() {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            config_path.display()
        );
    } else {
        let config = load_config(None); // defaults + any env overrides
        save_config(&config, Some(&config_path))?;
        println!(
            "  {} created config at {}",
            "✓".green(),
            config_path.display()
        );
    }

    println!();
    println!(
        "  {}",
        "Set completion.apiKey (or OPENROUTER_API_KEY) before chatting.".dimmed()
    );
    println!();

    Ok(())
}
