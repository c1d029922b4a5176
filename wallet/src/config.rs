use crate::backup::{is_valid_date_format, DEFAULT_DATE_FORMAT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Failed to get home directory")]
    NoHomeDir,
}

/// Where preferences are kept
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrefsBackendKind {
    /// `prefs.db` under the data directory
    Sled,
    /// Lost on exit
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Data directory; `~` is expanded
    pub data_dir: String,

    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,

    pub prefs_backend: PrefsBackendKind,

    /// strftime pattern for the last-backup date
    pub date_format: String,

    /// Transactions fetched per page
    pub page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: "~/.wallet-ui".to_string(),
            log_level: "info".to_string(),
            prefs_backend: PrefsBackendKind::Sled,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            page_size: 50,
        }
    }
}

impl Config {
    /// Load configuration from `path`, writing the default there if the
    /// file does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config.validated())
        } else {
            let config = Config::default();
            config.save(path)?;
            info!("Wrote default config to {}", path.display());
            Ok(config)
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// `~/.wallet-ui/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".wallet-ui").join("config.toml"))
    }

    /// Data directory with `~` expanded
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.data_dir).to_string())
    }

    pub fn prefs_path(&self) -> PathBuf {
        self.data_dir().join("prefs.db")
    }

    fn validated(mut self) -> Self {
        if !is_valid_date_format(&self.date_format) {
            warn!(
                date_format = %self.date_format,
                "Invalid date format in config, using default"
            );
            self.date_format = DEFAULT_DATE_FORMAT.to_string();
        }
        if self.page_size == 0 {
            warn!("page_size must be positive, using default");
            self.page_size = Config::default().page_size;
        }
        self
    }
}
