// ⚙️ Configuration - Environment-driven settings for the CLI
//
// Persistent per-install settings (last week, import fingerprint, game
// path) live in the SQLite store instead.

use crate::parser::DEFAULT_MAX_DEPTH;
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_DB_PATH: &str = "vault_tracker.db";

/// Application configuration loaded from environment variables.
///
/// | Env Var                   | Default             |
/// |---------------------------|---------------------|
/// | `VAULT_TRACKER_DB`        | `vault_tracker.db`  |
/// | `VAULT_TRACKER_EXPORT`    | unset               |
/// | `VAULT_TRACKER_GAME_PATH` | unset               |
/// | `VAULT_TRACKER_MAX_DEPTH` | `128`               |
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// SQLite database holding roster, settings and history.
    pub db_path: PathBuf,
    /// Addon export read when no file is given on the command line.
    pub export_path: Option<PathBuf>,
    /// Game install used to discover the export.
    pub game_path: Option<PathBuf>,
    /// Parser nesting bound.
    pub max_depth: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            export_path: None,
            game_path: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let max_depth = match get("VAULT_TRACKER_MAX_DEPTH") {
            None => DEFAULT_MAX_DEPTH,
            Some(raw) => match raw.parse::<usize>() {
                Ok(depth) if depth > 0 => depth,
                _ => {
                    warn!(value = %raw, "VAULT_TRACKER_MAX_DEPTH is not a positive integer; using default");
                    DEFAULT_MAX_DEPTH
                }
            },
        };

        AppConfig {
            db_path: get("VAULT_TRACKER_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            export_path: get("VAULT_TRACKER_EXPORT").map(PathBuf::from),
            game_path: get("VAULT_TRACKER_GAME_PATH").map(PathBuf::from),
            max_depth,
        }
    }
}
