//! Configuration management for Klaval.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the persisted snapshot document inside the data directory.
const STATE_FILE_NAME: &str = "persistence.json";

/// Main application configuration.
///
/// This is loaded from `~/.config/klaval/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Target site settings
    pub site: SiteConfig,
    /// HTTP session settings
    pub session: SessionConfig,
    /// Poll cycle settings
    pub polling: PollingConfig,
    /// Snapshot persistence settings
    pub storage: StorageConfig,
    /// Account verification settings
    pub verification: VerificationConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, falling back to defaults if
    /// the file does not exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let config: Self = if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            let contents = fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            tracing::debug!("Config file not found, using defaults");
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `KLAVAL_BASE_URL`: Override the site base URL
    /// - `KLAVAL_POLL_INTERVAL_SECS`: Override the polling cadence
    /// - `KLAVAL_STATE_FILE`: Override the snapshot document path
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (normally the process environment).
    ///
    /// Unparsable values are ignored with a warning.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("KLAVAL_BASE_URL") {
            tracing::debug!("Override site.base_url from env: {}", val);
            self.site.base_url = val;
        }

        if let Some(val) = lookup("KLAVAL_POLL_INTERVAL_SECS") {
            match val.parse() {
                Ok(secs) => {
                    self.polling.interval_secs = secs;
                    tracing::debug!("Override polling.interval_secs from env: {}", secs);
                }
                Err(_) => tracing::warn!("Ignoring invalid KLAVAL_POLL_INTERVAL_SECS: {}", val),
            }
        }

        if let Some(val) = lookup("KLAVAL_STATE_FILE") {
            tracing::debug!("Override storage.state_file from env: {}", val);
            self.storage.state_file = Some(PathBuf::from(val));
        }
    }

    /// Check values that would make the poller misbehave.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` naming the offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.site.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "site.base_url".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.polling.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "polling.interval_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.polling.subtask_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "polling.subtask_timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.session.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.request_timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/klaval/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("io", "klaval", "klaval").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/klaval`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("io", "klaval", "klaval").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }

    /// Resolve the snapshot document path.
    ///
    /// Uses `storage.state_file` when set, otherwise
    /// `<data_dir>/persistence.json`.
    pub fn state_file_path(&self) -> ConfigResult<PathBuf> {
        match &self.storage.state_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join(STATE_FILE_NAME)),
        }
    }
}

/// Target site settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Origin every page template is resolved against
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://klavia.io".to_string(),
        }
    }
}

/// HTTP session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// User agent string
    pub user_agent: String,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// CSS selector that only matches on pages rendered for a logged-in racer
    pub authenticated_marker: String,
}

impl SessionConfig {
    /// Request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: "Klaval/0.1.0 (+https://github.com/devHenrik123/Klaval)".to_string(),
            request_timeout_secs: 30,
            authenticated_marker:
                r#"a[href$="/racers/sign_out"], form[action$="/racers/sign_out"]"#.to_string(),
        }
    }
}

/// Poll cycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Seconds between two poll cycles
    pub interval_secs: u64,
    /// Upper bound for a single sub-task (one team, or the shop)
    pub subtask_timeout_secs: u64,
    /// Pause between sub-tasks in milliseconds (0 disables)
    pub notify_pause_ms: u64,
}

impl PollingConfig {
    /// Poll cadence as a `Duration`.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Sub-task timeout as a `Duration`.
    #[must_use]
    pub fn subtask_timeout(&self) -> Duration {
        Duration::from_secs(self.subtask_timeout_secs)
    }

    /// Pause between sub-tasks as a `Duration`.
    #[must_use]
    pub fn notify_pause(&self) -> Duration {
        Duration::from_millis(self.notify_pause_ms)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30 * 60,
            subtask_timeout_secs: 120,
            notify_pause_ms: 500,
        }
    }
}

/// Snapshot persistence settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Explicit snapshot document path (defaults to the data directory)
    pub state_file: Option<PathBuf>,
}

/// Account verification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Seconds between two garage checks
    pub poll_interval_secs: u64,
    /// Seconds until a pending challenge expires
    pub timeout_secs: u64,
}

impl VerificationConfig {
    /// Garage check interval as a `Duration`.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Challenge lifetime as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
            timeout_secs: 5 * 60,
        }
    }
}
