//! Tool configuration.
//!
//! Settings are read once from a YAML file (`config.yaml` by default) and
//! passed by reference into every pipeline stage.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Default location of the configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Vendor page listing the current desktop app downloads.
pub const DEFAULT_DOWNLOADS_PAGE: &str = "https://www.bluesound.com/downloads/";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error reading {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("nodeBinPath not set in {0}")]
    MissingNodeBinPath(String),
}

// =============================================================================
// Config
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    #[serde(default)]
    node_bin_path: Option<String>,
    #[serde(default)]
    downloads_page: Option<String>,
}

/// Validated tool configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory containing `npm`, `npx` and `electron-builder`.
    pub node_bin_path: PathBuf,

    /// Page scraped for the latest installer link.
    pub downloads_page: String,
}

impl Config {
    /// Creates a config with the default downloads page.
    pub fn new(node_bin_path: impl Into<PathBuf>) -> Self {
        Self {
            node_bin_path: node_bin_path.into(),
            downloads_page: DEFAULT_DOWNLOADS_PAGE.to_string(),
        }
    }

    /// Loads and validates the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!("Reading {}", path.display());

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_yaml(&contents, &path.display().to_string())
    }

    /// Parses configuration from YAML text. `origin` is only used in error messages.
    pub fn from_yaml(contents: &str, origin: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit, not as a mapping.
        let raw: RawConfig = if contents.trim().is_empty() {
            RawConfig {
                node_bin_path: None,
                downloads_page: None,
            }
        } else {
            serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
                path: origin.to_string(),
                source,
            })?
        };

        let node_bin_path = raw
            .node_bin_path
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingNodeBinPath(origin.to_string()))?;

        let downloads_page = raw
            .downloads_page
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DOWNLOADS_PAGE.to_string());

        let config = Self {
            node_bin_path: PathBuf::from(node_bin_path),
            downloads_page,
        };
        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    /// Path of a binary inside `nodeBinPath`.
    pub fn node_bin(&self, name: &str) -> PathBuf {
        self.node_bin_path.join(name)
    }
}
