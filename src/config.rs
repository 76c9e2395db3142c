//! Configuration loading.
//!
//! An optional YAML file supplies the database location, the not-found
//! policy of the query façade, and the log filter. Every field has a
//! default, so an empty file (or no file) is a valid configuration.
//!
//! ```yaml
//! database: /var/lib/versioner/graph.db
//! not_found: error
//! log: graph_versioner=debug
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::api::NotFoundPolicy;

/// Environment variable that overrides the configured log filter
pub const LOG_ENV: &str = "VERSIONER_LOG";

/// Log filter used when neither the environment nor the file sets one
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersionerConfig {
    /// SQLite database file; `None` means the platform data directory
    #[serde(default)]
    pub database: Option<PathBuf>,

    /// What the procedures return for an entity with no history
    #[serde(default)]
    pub not_found: NotFoundPolicy,

    /// `tracing` filter directive, e.g. `info` or `graph_versioner=debug`
    #[serde(default)]
    pub log: Option<String>,
}

impl VersionerConfig {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Parse configuration from YAML text; blank text yields the defaults
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// The database path, falling back to `<data_dir>/graph-versioner/versioner.db`
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(default_db_path)
    }

    /// Log filter: `VERSIONER_LOG` wins, then the file, then `info`
    pub fn log_filter(&self) -> String {
        self.log_filter_with(std::env::var(LOG_ENV).ok())
    }

    /// Log filter given the value of `VERSIONER_LOG`; blank values count as unset
    pub fn log_filter_with(&self, env: Option<String>) -> String {
        env.filter(|v| !v.trim().is_empty())
            .or_else(|| self.log.clone().filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
    }
}

/// Get the default database path (~/.local/share/graph-versioner/versioner.db)
pub fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("graph-versioner").join("versioner.db")
}
