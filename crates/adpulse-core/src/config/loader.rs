//! Config loader — reads `~/.adpulse/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.adpulse/config.json`
//! 3. Environment variables (override JSON)
//!
//! Env var format is `ADPULSE_<SECTION>__<FIELD>` (double underscore as
//! delimiter). `OPENROUTER_API_KEY` and `CHAT_RATE_LIMIT_PER_MIN` are also
//! honored directly, matching the deployment environment this grew up in.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;

/// The Adpulse data directory (`~/.adpulse/`).
pub fn get_data_path() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".adpulse")
}

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    get_data_path().join("config.json")
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("USERPROFILE").ok().map(PathBuf::from))
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't
/// be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
fn apply_env_overrides(mut config: Config) -> Config {
    // Completion service
    if let Ok(val) = std::env::var("ADPULSE_COMPLETION__API_KEY") {
        config.completion.api_key = val;
    }
    if let Ok(val) = std::env::var("ADPULSE_COMPLETION__API_BASE") {
        config.completion.api_base = val;
    }
    if let Ok(val) = std::env::var("ADPULSE_COMPLETION__MODEL") {
        config.completion.model = val;
    }
    if let Ok(val) = std::env::var("ADPULSE_COMPLETION__MAX_TOKENS") {
        if let Ok(n) = val.parse::<u32>() {
            config.completion.max_tokens = n;
        }
    }
    if let Ok(val) = std::env::var("ADPULSE_COMPLETION__TEMPERATURE") {
        if let Ok(t) = val.parse::<f64>() {
            config.completion.temperature = t;
        }
    }
    if let Ok(val) = std::env::var("ADPULSE_COMPLETION__REQUEST_TIMEOUT_SECONDS") {
        if let Ok(n) = val.parse::<u64>() {
            config.completion.request_timeout_seconds = n;
        }
    }

    // Chat policy
    if let Ok(val) = std::env::var("ADPULSE_CHAT__SESSION_TIMEOUT_MINUTES") {
        if let Ok(n) = val.parse::<u32>() {
            config.chat.session_timeout_minutes = n;
        }
    }
    if let Ok(val) = std::env::var("ADPULSE_CHAT__RATE_LIMIT_PER_MINUTE") {
        if let Ok(n) = val.parse::<u32>() {
            config.chat.rate_limit_per_minute = n;
        }
    }
    if let Ok(val) = std::env::var("ADPULSE_CHAT__MAX_MESSAGE_CHARS") {
        if let Ok(n) = val.parse::<usize>() {
            config.chat.max_message_chars = n;
        }
    }

    // Legacy names kept for parity with existing deployments.
    if config.completion.api_key.is_empty() {
        if let Ok(val) = std::env::var("OPENROUTER_API_KEY") {
            config.completion.api_key = val;
        }
    }
    if let Ok(val) = std::env::var("CHAT_RATE_LIMIT_PER_MIN") {
        if let Ok(n) = val.parse::<u32>() {
            config.chat.rate_limit_per_minute = n;
        }
    }

    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_missing_file() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.json"));
        assert_eq!(config.completion.max_tokens, 1024);
        assert_eq!(config.chat.session_timeout_minutes, 30);
    }

    #[test]
    fn test_load_valid_json() {
        let file = write_temp_json(
            r#"{
            "completion": {
                "model": "anthropic/claude-3.5-haiku",
                "maxTokens": 2048
            }
        }"#,
        );

        let config = load_config_from_path(file.path());
        assert_eq!(config.completion.model, "anthropic/claude-3.5-haiku");
        assert_eq!(config.completion.max_tokens, 2048);
        // Default preserved
        assert_eq!(config.completion.temperature, 0.7);
    }

    #[test]
    fn test_load_invalid_json_returns_defaults() {
        let file = write_temp_json("not valid json {{{");
        let config = load_config_from_path(file.path());
        assert_eq!(config.completion.max_tokens, 1024);
    }

    #[test]
    fn test_load_empty_json() {
        let file = write_temp_json("{}");
        let config = load_config_from_path(file.path());
        assert_eq!(config.completion.model, "openai/gpt-4o-mini");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.completion.model = "deepseek/deepseek-chat".to_string();
        config.completion.api_key = "sk-or-test".to_string();
        config.chat.rate_limit_per_minute = 5;

        save_config(&config, Some(&path)).unwrap();

        let reloaded = load_config_from_path(&path);
        assert_eq!(reloaded.completion.model, "deepseek/deepseek-chat");
        assert_eq!(reloaded.completion.api_key, "sk-or-test");
        assert_eq!(reloaded.chat.rate_limit_per_minute, 5);
    }

    #[test]
    fn test_env_override_model() {
        std::env::set_var("ADPULSE_COMPLETION__MODEL", "test-model");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.completion.model, "test-model");
        std::env::remove_var("ADPULSE_COMPLETION__MODEL");
    }

    #[test]
    fn test_env_override_rate_limit() {
        std::env::set_var("ADPULSE_CHAT__RATE_LIMIT_PER_MINUTE", "7");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.chat.rate_limit_per_minute, 7);
        std::env::remove_var("ADPULSE_CHAT__RATE_LIMIT_PER_MINUTE");
    }

    #[test]
    fn test_legacy_openrouter_key_env() {
        // Single test for both cases: parallel tests must not share this var.
        std::env::set_var("OPENROUTER_API_KEY", "sk-or-legacy");

        let config = apply_env_overrides(Config::default());
        assert_eq!(config.completion.api_key, "sk-or-legacy");

        // An explicitly configured key wins over the legacy variable.
        let mut config = Config::default();
        config.completion.api_key = "sk-or-explicit".to_string();
        let config = apply_env_overrides(config);
        assert_eq!(config.completion.api_key, "sk-or-explicit");

        std::env::remove_var("OPENROUTER_API_KEY");
    }

    #[test]
    fn test_saved_json_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        save_config(&Config::default(), Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert!(raw["completion"].get("maxTokens").is_some());
        assert!(raw["completion"].get("max_tokens").is_none());
    }

    #[test]
    fn test_data_path_ends_with_adpulse() {
        let path = get_data_path();
        assert!(path.ends_with(".adpulse"));
    }
}
