use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::storage::{DEFAULT_MAX_PAGE_SIZE, DEFAULT_PAGE_SIZE};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogbookConfig {
    pub host: String,
    pub port: u16,
    pub database: PathBuf,
    /// Page size used when a list request omits `limit`
    pub default_page_size: u32,
    /// Largest `limit` a list request may ask for
    pub max_page_size: u32,
}

impl Default for LogbookConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database: default_database_path(),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

impl LogbookConfig {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject settings the request layer cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(Error::Config("page sizes must be positive".to_string()));
        }
        if self.default_page_size > self.max_page_size {
            return Err(Error::Config(format!(
                "default_page_size ({}) exceeds max_page_size ({})",
                self.default_page_size, self.max_page_size
            )));
        }
        Ok(())
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("logbook.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from("logs.db")
}

/// Load the config file, falling back to defaults when it does not exist
pub fn load_config(path: Option<&Path>) -> Result<LogbookConfig> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(LogbookConfig::default());
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: LogbookConfig = toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}

pub fn write_config(path: &Path, config: &LogbookConfig, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    let contents = toml::to_string_pretty(config).map_err(|e| Error::Config(e.to_string()))?;
    std::fs::write(path, contents)?;
    Ok(())
}
