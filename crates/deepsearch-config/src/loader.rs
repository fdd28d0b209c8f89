//! Config file discovery and loading

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::components::AppConfig;
use crate::error::{ConfigError, ConfigResult};

/// Environment variable naming a config file
pub const CONFIG_ENV_VAR: &str = "DEEPSEARCH_CONFIG";

/// Loads [`AppConfig`] once at startup
pub struct ConfigLoader;

impl ConfigLoader {
    /// Default location: `$XDG_CONFIG_HOME/deepsearch/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("deepsearch").join("config.toml"))
    }

    /// Pick the config file to read
    ///
    /// An explicit path or `DEEPSEARCH_CONFIG` must exist; the default
    /// location is used only when present.
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        Self::default_path().filter(|path| path.is_file())
    }

    /// Resolve, read, and validate the configuration
    pub fn load(explicit: Option<&Path>) -> ConfigResult<AppConfig> {
        let config = match Self::resolve_path(explicit) {
            Some(path) => Self::load_from_file(&path)?,
            None => {
                debug!("No config file found, using defaults");
                AppConfig::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> ConfigResult<AppConfig> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }
}
