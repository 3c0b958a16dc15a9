use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::store::DEFAULT_VIEW_PREFIX;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub sweep: SweepConfig,
    pub connections: BTreeMap<String, ConnectionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Views whose name starts with this prefix are leftovers
    pub view_prefix: String,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            view_prefix: DEFAULT_VIEW_PREFIX.to_string(),
        }
    }
}

/// A named connection, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConnectionConfig {
    Sqlite {
        path: PathBuf,
        #[serde(default)]
        read_only: bool,
        /// Extra databases attached under the given schema names
        #[serde(default)]
        attach: BTreeMap<String, PathBuf>,
    },
    /// Plain directory of files; listed so it can be named, never swept
    Filesystem { path: PathBuf },
}

impl ConnectionConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectionConfig::Sqlite { .. } => "sqlite",
            ConnectionConfig::Filesystem { .. } => "filesystem",
        }
    }

    pub fn is_sql(&self) -> bool {
        matches!(self, ConnectionConfig::Sqlite { .. })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            sweep: SweepConfig::default(),
            connections: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_name = env!("CARGO_PKG_NAME");
        let mut candidates = Vec::new();

        // Primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join(project_name).join(format!("{}.yml", project_name)));
        }

        // Fallback location: ./<project>.yml
        candidates.push(PathBuf::from(format!("{}.yml", project_name)));

        Self::load_first_existing(&candidates)
    }

    /// Load the first candidate that exists, or defaults when none does.
    ///
    /// A file that exists but does not parse is an error; falling through to
    /// defaults would hide every connection it defines.
    pub fn load_first_existing(candidates: &[PathBuf]) -> Result<Self> {
        for candidate in candidates {
            if candidate.exists() {
                return Self::load_from_file(candidate).map_err(|e| {
                    log::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    e.wrap_err(format!("Failed to load config from {}", candidate.display()))
                });
            }
            log::debug!("No config at {}", candidate.display());
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Configured log level, `Info` when unset or unrecognised.
    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level
            .as_deref()
            .and_then(|level| level.parse().ok())
            .unwrap_or(log::LevelFilter::Info)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}
