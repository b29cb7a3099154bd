use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::access::GroupAllowlist;
use crate::email::{SenderIdentity, SmtpConfig};
use crate::models::split_id_list;
use crate::notify::NotifierSettings;

/// Notification batch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Users processed at the same time
    pub concurrency: usize,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database
    pub database_path: PathBuf,
    /// Groups whose members may view every document
    pub access_groups: Vec<String>,
    /// Locale for users without a preference
    pub default_locale: String,
    /// Optional YAML file with translation overrides
    pub translations_path: Option<PathBuf>,
    /// Sender of notification emails
    pub sender: SenderIdentity,
    pub smtp: SmtpConfig,
    pub notify: NotifyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: Self::default_data_dir().join("kitodo-access.db"),
            access_groups: Vec::new(),
            default_locale: "en".to_string(),
            translations_path: None,
            sender: SenderIdentity::default(),
            smtp: SmtpConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut config = Self::default();

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            config = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            // Resolve relative paths against the config file's directory
            if let Some(dir) = path.parent() {
                if config.database_path.is_relative() {
                    config.database_path = dir.join(&config.database_path);
                }
                if let Some(translations) = &config.translations_path {
                    if translations.is_relative() {
                        config.translations_path = Some(dir.join(translations));
                    }
                }
            }
        }

        // Apply environment variable overrides
        if let Ok(db_path) = std::env::var("KITODO_ACCESS_DATABASE_PATH") {
            config.database_path = PathBuf::from(db_path);
        }
        if let Ok(groups) = std::env::var("KITODO_ACCESS_GROUPS") {
            config.access_groups = split_id_list(&groups);
        }
        if let Ok(host) = std::env::var("KITODO_ACCESS_SMTP_HOST") {
            config.smtp.host = host;
        }
        if let Ok(port) = std::env::var("KITODO_ACCESS_SMTP_PORT") {
            config.smtp.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidValue("KITODO_ACCESS_SMTP_PORT", port))?;
        }
        if let Ok(user) = std::env::var("KITODO_ACCESS_SMTP_USER") {
            config.smtp.user = Some(user);
        }
        if let Ok(pass) = std::env::var("KITODO_ACCESS_SMTP_PASS") {
            config.smtp.pass = Some(pass);
        }

        Ok(config)
    }

    /// Default config file path: ~/.config/kitodo-access/config.yaml
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kitodo-access")
            .join("config.yaml")
    }

    /// Default data directory: ~/.local/share/kitodo-access
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kitodo-access")
    }

    pub fn allowlist(&self) -> GroupAllowlist {
        GroupAllowlist::new(self.access_groups.iter().cloned())
    }

    pub fn notifier_settings(&self) -> NotifierSettings {
        NotifierSettings {
            sender: self.sender.clone(),
            default_locale: self.default_locale.clone(),
            concurrency: self.notify.concurrency.max(1),
            // Leave the transport its own timeout before giving up on it
            dispatch_timeout: Duration::from_secs(self.smtp.timeout_secs.saturating_mul(2).max(1)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {}", .0.display(), .1)]
    ReadError(PathBuf, std::io::Error),
    #[error("Failed to parse config file '{}': {}", .0.display(), .1)]
    ParseError(PathBuf, serde_yaml::Error),
    #[error("Invalid value for {0}: '{1}'")]
    InvalidValue(&'static str, String),
}
