//! Configuration management for the CLI
//!
//! This module handles loading configuration from:
//! - Default values
//! - Configuration files (YAML/TOML/JSON, chosen by extension)
//! - The `--config` flag or `CARTBRIDGE_CONFIG`

use crate::error::{Error, Result};
use cartbridge_core::DispatchDefaults;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Transformation defaults
    pub mapping: MappingConfig,

    /// Simulated orchestrator used by `ingest`
    pub orchestrator: OrchestratorConfig,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format
    pub format: String,

    /// Use colored output by default
    pub color: bool,

    /// Pretty-print machine output
    pub pretty: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: String,

    /// Log file path
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Namespace of generated global ids
    pub graphql_namespace: String,

    /// Prefix for relative media urls when a rule sets none
    pub media_base_url: Option<String>,

    /// Entity lookup tables used when `--lookup` is not given
    pub lookup_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Prefix of simulated execution handles
    pub handle_prefix: String,

    /// Make every simulated handoff fail
    pub fail_handoff: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "human".to_string(),
            color: true,
            pretty: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: "compact".to_string(),
            file: None,
        }
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            graphql_namespace: DispatchDefaults::default().graphql_namespace,
            media_base_url: None,
            lookup_file: None,
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            handle_prefix: "local-run-".to_string(),
            fail_handoff: false,
        }
    }
}

/// Serialization format of a structured file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
    Toml,
}

impl FileFormat {
    /// Format implied by the file extension; anything unknown is JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("toml") => FileFormat::Toml,
            _ => FileFormat::Json,
        }
    }
}

impl Config {
    pub const FILE_STEM: &'static str = "cartbridge";

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let config = match FileFormat::from_path(path) {
            FileFormat::Yaml => serde_yaml::from_str(&content)?,
            FileFormat::Toml => toml::from_str(&content)?,
            FileFormat::Json => serde_json::from_str(&content)?,
        };

        Ok(config)
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        match Self::resolve_path(file) {
            Some(path) => Self::from_file(&path)
                .map_err(|e| Error::config(format!("{}: {}", path.display(), e))),
            None => Ok(Self::default()),
        }
    }

    /// The file that will be loaded, if any
    ///
    /// An explicit path is returned even when it does not exist so that the
    /// load reports it.
    pub fn resolve_path(file: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = file {
            return Some(path.to_path_buf());
        }
        Self::default_config_paths()
            .into_iter()
            .find(|path| path.exists())
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // Current directory
        for ext in ["yaml", "toml", "json"] {
            paths.push(PathBuf::from(format!(".{}.{}", Self::FILE_STEM, ext)));
        }

        // User config directory
        if let Some(config_dir) = dirs::config_dir() {
            let dir = config_dir.join(Self::FILE_STEM);
            for ext in ["yaml", "toml", "json"] {
                paths.push(dir.join(format!("config.{}", ext)));
            }
        }

        paths
    }

    /// Default target of `config init`
    pub fn default_init_path() -> PathBuf {
        PathBuf::from(format!(".{}.toml", Self::FILE_STEM))
    }

    /// Dispatch defaults for transformation runs
    pub fn dispatch_defaults(&self) -> DispatchDefaults {
        DispatchDefaults {
            graphql_namespace: self.mapping.graphql_namespace.clone(),
            media_base_url: self.mapping.media_base_url.clone(),
        }
    }

    /// Serialize in the given format
    pub fn render(&self, format: FileFormat) -> Result<String> {
        match format {
            FileFormat::Toml => toml::to_string_pretty(self)
                .map_err(|e| Error::config(format!("Failed to serialize as TOML: {}", e))),
            FileFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            FileFormat::Yaml => Ok(serde_yaml::to_string(self)?),
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.render(FileFormat::from_path(path))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}
