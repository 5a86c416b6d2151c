//! Host configuration
//!
//! ```ron
//! (
//!     health: (address: ":8080", lameduck: "5s"),
//!     subsystems: [
//!         Drain(name: "maintenance", path: "/run/beacon/drain"),
//!         Probe(name: "database", address: "127.0.0.1:5432"),
//!     ],
//! )
//! ```

use std::path::{Path, PathBuf};

use beacon_health::HealthConfig;
use ron::{extensions::Extensions, Options};
use serde::Deserialize;
use thiserror::Error;

use crate::subsystems::SubsystemConfig;

/// Errors raised while loading a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config from {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("Invalid subsystem '{name}': {reason}")]
    Subsystem { name: String, reason: String },

    #[error("BEACON_CONFIG points to a missing file: {}", .path.display())]
    MissingFile { path: PathBuf },

    #[error("No configuration file found, set BEACON_CONFIG or create one of: {}", list(.searched))]
    NotFound { searched: Vec<PathBuf> },
}

fn list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "BEACON_CONFIG";

/// Looked at in order when [`CONFIG_ENV`] is unset
pub const SEARCH_PATHS: [&str; 2] = ["./beacon.config.ron", "/etc/beacon/beacon.config.ron"];

/// Everything the host builds from one configuration file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Absent means no health endpoint is served
    #[serde(default)]
    pub health: Option<HealthConfig>,

    /// Built in the order listed
    #[serde(default, alias = "subsystem")]
    pub subsystems: Vec<SubsystemConfig>,
}

impl Config {
    ///
    /// Parse a configuration from RON text
    ///
    /// # Errors
    /// If the text is not valid RON, or a value fails validation
    ///
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .from_str(content)?)
    }

    ///
    /// The file named by [`CONFIG_ENV`], or else the first of [`SEARCH_PATHS`]
    /// that exists
    ///
    /// # Errors
    /// If [`CONFIG_ENV`] names a missing file, or no search path exists
    ///
    pub fn locate() -> Result<PathBuf, ConfigError> {
        locate(
            std::env::var_os(CONFIG_ENV).map(PathBuf::from),
            &SEARCH_PATHS.map(PathBuf::from),
        )
    }

    ///
    /// Read and parse the configuration at `path`
    ///
    /// # Errors
    /// If the file cannot be read or parsed
    ///
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        Self::parse(&content)
    }
}

fn locate(named: Option<PathBuf>, searched: &[PathBuf]) -> Result<PathBuf, ConfigError> {
    match named {
        Some(path) if path.is_file() => Ok(path),
        Some(path) => Err(ConfigError::MissingFile { path }),
        None => searched
            .iter()
            .find(|path| path.is_file())
            .cloned()
            .ok_or_else(|| ConfigError::NotFound {
                searched: searched.to_vec(),
            }),
    }
}
