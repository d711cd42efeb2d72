//! Shared helpers for CLI commands.

use crate::error::CliError;
use std::path::{Path, PathBuf};
use tileforge::EngineConfig;

/// Overrides common to every command, applied on top of the config file.
#[derive(Debug, Clone, clap::Args)]
pub struct ConfigArgs {
    /// Path to a JSON engine configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Remote URL template with {x}, {y} and {z} tokens.
    #[arg(long)]
    pub template: Option<String>,

    /// Cache directory (defaults to the platform cache dir).
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Resolve from cache and synthesis only, never the network.
    #[arg(long)]
    pub offline: bool,

    /// Maximum natively available zoom (0 = no limit).
    #[arg(long)]
    pub max_native_zoom: Option<u8>,

    /// Render onto a doubled canvas from children one zoom deeper.
    #[arg(long)]
    pub double: bool,
}

impl ConfigArgs {
    /// Builds the engine configuration: config file first, command-line
    /// overrides second, platform cache directory as the default root.
    pub fn resolve(&self) -> Result<EngineConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => load_config_file(path)?,
            None => EngineConfig::default(),
        };

        if let Some(template) = &self.template {
            config.url_template = template.clone();
        }
        if let Some(cache_dir) = &self.cache_dir {
            config.cache_root = Some(cache_dir.clone());
        } else if config.cache_root.is_none() {
            config.cache_root = default_cache_dir();
        }
        if self.offline {
            config.offline_mode = true;
        }
        if let Some(max_native_zoom) = self.max_native_zoom {
            config.max_native_zoom = max_native_zoom;
        }
        if self.double {
            config.double_tile_size = true;
        }

        Ok(config)
    }
}

/// Reads an [`EngineConfig`] from a JSON file.
pub fn load_config_file(path: &Path) -> Result<EngineConfig, CliError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| CliError::Config(format!("cannot read {}: {}", path.display(), e)))?;
    serde_json::from_str(&contents)
        .map_err(|e| CliError::Config(format!("cannot parse {}: {}", path.display(), e)))
}

/// Platform cache directory for tiles, e.g. `~/.cache/tileforge`.
pub fn default_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("tileforge"))
}
