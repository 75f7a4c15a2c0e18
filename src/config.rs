//! Server configuration
//!
//! Read from `~/.config/textedit-mcp/config.toml` or a path given on the
//! command line. Every key is optional.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::parser::ParseOptions;
use crate::template::BASE_TEMPLATE;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    Read {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    Parse {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub conversion: ConversionConfig,
    pub output: OutputConfig,
    /// Extra template definitions layered over the built-in ones.
    pub templates_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Name reported to clients in the `initialize` response.
    pub name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub default_template: String,
    pub indent_width: usize,
    pub honor_list_start: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            default_template: BASE_TEMPLATE.to_string(),
            indent_width: 2,
            honor_list_start: false,
        }
    }
}

impl ConversionConfig {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            indent_width: self.indent_width,
            honor_list_start: self.honor_list_start,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Create missing parent directories of the output path.
    pub create_dirs: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { create_dirs: true }
    }
}

impl Config {
    /// Load config from a TOML file. A missing file yields `None`.
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            config_path: config_path.to_path_buf(),
            source,
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            config_path: config_path.to_path_buf(),
            source,
        })?;

        config.templates_file = config
            .templates_file
            .map(|path| expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    /// Load from the default location, falling back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self::load_from_path(Self::config_path())?.unwrap_or_default())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/textedit-mcp");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }
}

fn expand_path(path: &Path) -> Option<PathBuf> {
    let path_str = path.to_string_lossy();
    shellexpand::full(&path_str)
        .ok()
        .map(|expanded| PathBuf::from(expanded.as_ref()))
}
