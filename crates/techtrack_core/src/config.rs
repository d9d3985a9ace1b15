//! Runtime configuration for the tracker front ends.
//!
//! # Responsibility
//! - Resolve database path, log level and log directory from the environment.
//! - Let callers layer explicit overrides (CLI flags) on top.
//!
//! # Invariants
//! - Unset or blank variables fall back to defaults.
//! - `log_level` is always one of `trace|debug|info|warn|error`.
//! - `log_dir` is always absolute.

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DB_PATH_ENV: &str = "TECHTRACK_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "TECHTRACK_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "TECHTRACK_LOG_DIR";

const DEFAULT_DB_FILE: &str = "techtrack.sqlite3";
const DEFAULT_LOG_SUBDIR: &str = "techtrack-logs";

/// Configuration resolution failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel(String),
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
            Self::RelativeLogDir(path) => write!(
                f,
                "log directory must be an absolute path, got `{}`",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {}

/// Resolved tracker settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    pub log_dir: PathBuf,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        let temp = std::env::temp_dir();
        Self {
            db_path: temp.join(DEFAULT_DB_FILE),
            log_level: default_log_level(),
            log_dir: temp.join(DEFAULT_LOG_SUBDIR),
        }
    }
}

impl TrackerConfig {
    /// Reads `TECHTRACK_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through `lookup` (variable name to value).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(DB_PATH_ENV) {
            config = config.with_db_path(path);
        }
        if let Some(level) = read(LOG_LEVEL_ENV) {
            config = config.with_log_level(level.as_str())?;
        }
        if let Some(dir) = read(LOG_DIR_ENV) {
            config = config.with_log_dir(dir)?;
        }
        Ok(config)
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    pub fn with_log_level(mut self, level: &str) -> Result<Self, ConfigError> {
        self.log_level = normalize_level(level).map_err(ConfigError::InvalidLogLevel)?;
        Ok(self)
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let dir = dir.into();
        if !dir.is_absolute() {
            return Err(ConfigError::RelativeLogDir(dir));
        }
        self.log_dir = dir;
        Ok(self)
    }

    /// Whether `db_path` is the `:memory:` sentinel for a throwaway database.
    pub fn is_in_memory(&self) -> bool {
        self.db_path == Path::new(":memory:")
    }
}
