use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_ROLE_THRESHOLD, LINE_PUSH_URL};
use crate::model::{default_sectors, SectorSpec};

pub const CONFIG_PATH_ENV: &str = "SECTOR_PULSE_CONFIG";
pub const DISCORD_WEBHOOK_ENV: &str = "DISCORD_WEBHOOK_URL";
pub const LINE_TOKEN_ENV: &str = "LINE_CHANNEL_ACCESS_TOKEN";
pub const LINE_USER_ENV: &str = "LINE_USER_ID";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is missing")]
    MissingEnv(&'static str),
    #[error("report file {0:?} not found")]
    MissingReport(PathBuf),
    #[error("failed to read sector config {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid sector config {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("role threshold must be a finite non-negative number, got {0}")]
    InvalidThreshold(f64),
}

/// Sector universe plus the classification threshold in percentage points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub sectors: Vec<SectorSpec>,
    #[serde(default = "default_threshold")]
    pub role_threshold: f64,
}

fn default_threshold() -> f64 {
    DEFAULT_ROLE_THRESHOLD
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sectors: default_sectors(),
            role_threshold: DEFAULT_ROLE_THRESHOLD,
        }
    }
}

impl AnalysisConfig {
    /// Loads the file named by `SECTOR_PULSE_CONFIG`, falling back to the
    /// reference universe when the variable is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env_opt(CONFIG_PATH_ENV) {
            Some(path) => Self::from_path(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
        if !config.role_threshold.is_finite() || config.role_threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold(config.role_threshold));
        }
        Ok(config)
    }

    /// Every configured symbol once, benchmarks and constituents alike.
    pub fn all_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = Vec::new();
        for sector in &self.sectors {
            for symbol in sector.symbols() {
                if !symbols.iter().any(|known| known == symbol) {
                    symbols.push(symbol.to_string());
                }
            }
        }
        symbols
    }
}

#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub webhook_url: String,
}

impl DiscordConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            webhook_url: env_required(DISCORD_WEBHOOK_ENV)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct LineConfig {
    pub access_token: String,
    pub user_id: String,
    pub push_url: String,
}

impl LineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            access_token: env_required(LINE_TOKEN_ENV)?,
            user_id: env_required(LINE_USER_ENV)?,
            push_url: LINE_PUSH_URL.to_string(),
        })
    }
}

/// Fails with [`ConfigError::MissingReport`] before anything is sent.
pub fn require_report(path: &Path) -> Result<(), ConfigError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ConfigError::MissingReport(path.to_path_buf()))
    }
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_required(name: &'static str) -> Result<String, ConfigError> {
    env_opt(name).ok_or(ConfigError::MissingEnv(name))
}
