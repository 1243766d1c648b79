//! Configuration — typed schema plus JSON/env loading.
//!
//! JSON on disk (`~/.adpulse/config.json`) uses camelCase keys; every
//! field has a default so a missing or partial file still yields a
//! usable config.

pub mod loader;
pub mod schema;

pub use loader::{get_config_path, get_data_path, load_config, save_config};
pub use schema::{ChatConfig, CompletionConfig, Config};
