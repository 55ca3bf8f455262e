use std::time::Duration;

use anyhow::{Context, Result};

use crate::editor::autosave::DEFAULT_DEBOUNCE;
use crate::editor::history::DEFAULT_HISTORY_CAPACITY;

pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 256 * 1024;

/// Application configuration loaded from environment variables.
/// Everything has a default; only malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres store when set, in-memory store otherwise.
    pub database_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub max_document_bytes: usize,
    pub editor: EditorConfig,
}

/// Knobs for the editing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorConfig {
    pub autosave_debounce: Duration,
    pub history_capacity: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave_debounce: DEFAULT_DEBOUNCE,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            port: 8080,
            rust_log: "info".to_string(),
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            editor: EditorConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            port: parse_env("PORT", defaults.port)?,
            rust_log: optional_env("RUST_LOG").unwrap_or(defaults.rust_log),
            max_document_bytes: parse_env("MAX_DOCUMENT_BYTES", defaults.max_document_bytes)?,
            editor: EditorConfig {
                autosave_debounce: Duration::from_millis(parse_env(
                    "AUTOSAVE_DEBOUNCE_MS",
                    DEFAULT_DEBOUNCE.as_millis() as u64,
                )?),
                history_capacity: parse_env("HISTORY_CAPACITY", DEFAULT_HISTORY_CAPACITY)?,
            },
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
