//! Configuration module for homeflow
//!
//! This module handles:
//! - The application config (`homeflow.toml`): catalog, default graph file,
//!   load policy and logging
//! - Graph files (`.json`): a composition plus its permission decisions
//!
//! # App Data Location
//!
//! Application data is stored in the platform-appropriate location:
//! - **Linux**: `~/.local/share/dev.homeflow/`
//! - **macOS**: `~/Library/Application Support/dev.homeflow/`
//! - **Windows**: `%APPDATA%\dev.homeflow\`
//!
//! # Example
//!
//! ```ignore
//! use homeflow::config::{AppConfig, GraphFile};
//!
//! let config = AppConfig::load_or_default(&AppConfig::default_path()?);
//! let file = GraphFile::load("home.json")?;
//! file.save("home.json")?;
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{HomeflowError, Result};
use crate::graph::GraphFormat;
use crate::policy::PermissionRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.homeflow";

/// Config filename inside the app data directory
pub const CONFIG_FILE: &str = "homeflow.toml";

/// Current graph file format version
pub const GRAPH_FILE_VERSION: u32 = 1;

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        HomeflowError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            HomeflowError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

// ==================== App Config ====================

/// Application configuration, read from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Extra catalog merged over the built-in templates
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    /// Graph file used when a command is given none
    #[serde(default)]
    pub store_path: Option<PathBuf>,

    #[serde(default)]
    pub load_policy: LoadPolicy,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Default config location in the app data directory
    pub fn default_path() -> Option<PathBuf> {
        app_data_dir().map(|p| p.join(CONFIG_FILE))
    }

    /// Load config from a TOML file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            HomeflowError::Config(format!("Failed to read config {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            HomeflowError::Config(format!("Failed to parse config {:?}: {}", path, e))
        })
    }

    /// Load config, returning defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save config as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                HomeflowError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| HomeflowError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            HomeflowError::Config(format!("Failed to write config {:?}: {}", path, e))
        })
    }
}

// ==================== Graph File ====================

/// A saved composition with its permission decisions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphFile {
    /// Format version for future migration support
    #[serde(default = "default_graph_file_version")]
    pub version: u32,

    #[serde(default)]
    pub name: String,

    pub graph: GraphFormat,

    /// Decisions keyed by pipeline label
    #[serde(default)]
    pub permissions: Vec<PermissionRecord>,

    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,
}

fn default_graph_file_version() -> u32 {
    GRAPH_FILE_VERSION
}

impl GraphFile {
    pub fn new(name: impl Into<String>, graph: GraphFormat) -> Self {
        Self {
            version: GRAPH_FILE_VERSION,
            name: name.into(),
            graph,
            permissions: Vec::new(),
            saved_at: Utc::now(),
        }
    }

    pub fn with_permissions(mut self, permissions: Vec<PermissionRecord>) -> Self {
        self.permissions = permissions;
        self
    }

    /// Load a graph file from disk.
    ///
    /// A bare `GraphFormat` document is accepted too and named after the file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            HomeflowError::Config(format!("Failed to read graph file {:?}: {}", path, e))
        })?;

        let value: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
            HomeflowError::Config(format!("Failed to parse graph file {:?}: {}", path, e))
        })?;

        if value.get("graph").is_some() {
            serde_json::from_value(value).map_err(|e| {
                HomeflowError::Config(format!("Invalid graph file {:?}: {}", path, e))
            })
        } else {
            let graph: GraphFormat = serde_json::from_value(value).map_err(|e| {
                HomeflowError::Config(format!("Invalid graph format {:?}: {}", path, e))
            })?;
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(Self::new(name, graph))
        }
    }

    /// Load a graph file, returning an empty graph on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load graph file, starting empty: {}", e);
            Self::new("Untitled", GraphFormat::default())
        })
    }

    /// Save as pretty JSON, stamping `saved_at`
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                HomeflowError::Config(format!("Failed to create graph directory: {}", e))
            })?;
        }

        self.saved_at = Utc::now();
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| HomeflowError::Config(format!("Failed to serialize graph file: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            HomeflowError::Config(format!("Failed to write graph file {:?}: {}", path, e))
        })?;
        tracing::info!("Saved graph file {:?}", path);
        Ok(())
    }
}
