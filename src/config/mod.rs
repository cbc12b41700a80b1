//! Configuration management.
//!
//! Configuration is read from `~/.config/rssfetcher/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub schedule: ScheduleConfig,
    pub store: StoreConfig,
}

/// HTTP client budgets. Each one is bounded independently so a single slow
/// feed cannot hold up a cycle past its own timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Overall request timeout in seconds (default: 12)
    pub timeout_secs: u64,

    /// TCP connect + TLS handshake timeout in seconds (default: 10)
    pub connect_timeout_secs: u64,

    /// TCP keep-alive interval in seconds (default: 10)
    pub keepalive_secs: u64,

    /// Maximum stall while waiting for response headers or body (default: 10)
    pub read_timeout_secs: u64,

    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 12,
            connect_timeout_secs: 10,
            keepalive_secs: 10,
            read_timeout_secs: 10,
            user_agent: concat!("rssfetcher/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Seconds between poll cycles (default: 80)
    pub interval_secs: u64,

    /// Run a cycle immediately when the scheduler starts (default: true)
    pub run_on_start: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 80,
            run_on_start: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file; defaults to `<data dir>/rssfetcher/rssfetcher.db`
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, creating it if missing.
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            Self::create_default_config(config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/rssfetcher/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("rssfetcher").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# rssfetcher configuration

[fetch]
# Overall budget for one feed request, in seconds
timeout_secs = 12

# TCP connect + TLS handshake budget
connect_timeout_secs = 10

# TCP keep-alive interval
keepalive_secs = 10

# Longest stall allowed while waiting for headers or body data
read_timeout_secs = 10

user_agent = "rssfetcher/0.1.0"

[schedule]
# Seconds between poll cycles for `rssfetcher run`
interval_secs = 80

# Poll once immediately on start
run_on_start = true

[store]
# Database location (default: <data dir>/rssfetcher/rssfetcher.db)
# path = "/var/lib/rssfetcher/rssfetcher.db"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert_eq!(config.fetch.timeout_secs, 12);
        assert_eq!(config.fetch.connect_timeout_secs, 10);
        assert_eq!(config.schedule.interval_secs, 80);
        assert!(config.schedule.run_on_start);
        assert!(config.store.path.is_none());
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[fetch]
timeout_secs = 5
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert_eq!(config.fetch.timeout(), Duration::from_secs(5));
        assert_eq!(config.fetch.read_timeout(), Duration::from_secs(10));
        assert_eq!(config.schedule.interval_secs, 80);
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");
        assert_eq!(config.fetch.keepalive(), Duration::from_secs(10));
        assert_eq!(config.fetch.connect_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.schedule.interval_secs, 80);

        fs::write(&path, "[schedule]\ninterval_secs = 30\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.schedule.interval_secs, 30);
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[fetch]\ntimeout_secs = \"soon\"\n").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
