use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::distro::xbstrap::DEFAULT_ROOT_FILE;
use crate::notify::email::{DEFAULT_FALLBACK, DEFAULT_SENDER};
use crate::notify::transport::SmtpSettings;
use crate::reconcile::pass::{DEFAULT_RESOLVE_CONCURRENCY, ReconcileOptions};
use crate::sync::git::DEFAULT_REMOTE;
use crate::upstream::nixos::{DEFAULT_INDEX_MAX_AGE, DEFAULT_NIXOS_INDEX_URL};
use crate::upstream::resolver::UpstreamRepository;

/// Default SMTP submission port
pub const DEFAULT_SMTP_PORT: u16 = 587;

const APP_DIR: &str = "distro-tracker";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no distribution path configured")]
    MissingDistributionPath,

    #[error("notifications are enabled but no SMTP server is configured")]
    MissingSmtpServer,
}

/// Tracker configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Root directory of the distribution tree
    pub distribution_path: Option<PathBuf>,
    /// Top-level metadata file inside the distribution tree
    pub root_file: String,
    /// SQLite state file; defaults to [`db_path`]
    pub database_path: Option<PathBuf>,
    /// Upstream repository to compare against; `None` skips resolution
    pub upstream: Option<UpstreamRepository>,
    pub git: GitConfig,
    pub notifications: NotificationConfig,
    pub nixos: NixosConfig,
    /// Upper bound on concurrent upstream lookups
    pub resolve_concurrency: usize,
    /// Fire upstream hooks for sources seen for the first time
    pub announce_new_sources: bool,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            distribution_path: None,
            root_file: DEFAULT_ROOT_FILE.to_string(),
            database_path: None,
            upstream: None,
            git: GitConfig::default(),
            notifications: NotificationConfig::default(),
            nixos: NixosConfig::default(),
            resolve_concurrency: DEFAULT_RESOLVE_CONCURRENCY,
            announce_new_sources: true,
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Read a JSON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check the settings a reconciliation pass depends on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.distribution_path.is_none() {
            return Err(ConfigError::MissingDistributionPath);
        }
        if self.notifications.enabled {
            self.notifications.smtp_settings()?;
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(db_path)
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            resolve_concurrency: self.resolve_concurrency.max(1),
            announce_new_sources: self.announce_new_sources,
        }
    }
}

/// Git sync configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GitConfig {
    /// Pull the distribution tree before each pass
    pub enabled: bool,
    pub remote: String,
    /// Branch to pull; the checked out branch when unset
    pub branch: Option<String>,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            remote: DEFAULT_REMOTE.to_string(),
            branch: None,
        }
    }
}

/// E-mail notification configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationConfig {
    pub enabled: bool,
    pub server: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub sender: String,
    /// Recipient for packages without a usable maintainer address
    pub fallback: String,
    pub use_tls: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            server: None,
            port: DEFAULT_SMTP_PORT,
            username: None,
            password: None,
            sender: DEFAULT_SENDER.to_string(),
            fallback: DEFAULT_FALLBACK.to_string(),
            use_tls: true,
        }
    }
}

impl NotificationConfig {
    pub fn smtp_settings(&self) -> Result<SmtpSettings, ConfigError> {
        let server = self
            .server
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSmtpServer)?;

        Ok(SmtpSettings {
            server,
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            use_tls: self.use_tls,
        })
    }
}

/// NixOS package index configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct NixosConfig {
    pub index_url: String,
    /// Where to keep the downloaded index; defaults to [`nixos_cache_path`]
    pub cache_path: Option<PathBuf>,
    /// Maximum age of the cached index in seconds
    pub max_age: u64,
}

impl Default for NixosConfig {
    fn default() -> Self {
        Self {
            index_url: DEFAULT_NIXOS_INDEX_URL.to_string(),
            cache_path: None,
            max_age: DEFAULT_INDEX_MAX_AGE.as_secs(),
        }
    }
}

impl NixosConfig {
    pub fn cache_path(&self) -> PathBuf {
        self.cache_path.clone().unwrap_or_else(nixos_cache_path)
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LogConfig {
    /// Log file; defaults to [`log_path`]
    pub file: Option<PathBuf>,
    /// Emit JSON lines instead of plain text
    pub json: bool,
}

impl LogConfig {
    pub fn file_path(&self) -> PathBuf {
        self.file.clone().unwrap_or_else(log_path)
    }
}

/// Returns the path to the data directory for distro-tracker.
/// Uses $XDG_DATA_HOME/distro-tracker if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/distro-tracker,
/// or ./distro-tracker if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the database file.
pub fn db_path() -> PathBuf {
    data_dir().join("packages.db")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("distro-tracker.log")
}

/// Returns the path to the cached NixOS package index.
pub fn nixos_cache_path() -> PathBuf {
    data_dir().join("nixos-packages.json")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn config_from_partial_object_uses_defaults_for_missing_fields() {
        let result = serde_json::from_value::<Config>(json!({
            "distributionPath": "/srv/distro",
            "upstream": "nixos",
            "git": { "enabled": true }
        }))
        .unwrap();

        assert_eq!(result.distribution_path, Some(PathBuf::from("/srv/distro")));
        assert_eq!(result.upstream, Some(UpstreamRepository::Nixos));
        assert!(result.git.enabled);
        assert_eq!(result.git.remote, "origin");
        assert_eq!(result.root_file, "bootstrap.yml");
        assert_eq!(result.notifications, NotificationConfig::default());
        assert_eq!(result.resolve_concurrency, DEFAULT_RESOLVE_CONCURRENCY);
        assert!(result.announce_new_sources);
    }

    #[test]
    fn config_from_full_object_parses_all_fields() {
        let result = serde_json::from_value::<Config>(json!({
            "distributionPath": "/srv/distro",
            "rootFile": "distro.yml",
            "databasePath": "/var/lib/tracker.db",
            "upstream": "nixos",
            "git": { "enabled": true, "remote": "upstream", "branch": "main" },
            "notifications": {
                "enabled": true,
                "server": "smtp.example.com",
                "port": 25,
                "username": "user",
                "password": "pass",
                "sender": "tracker@example.com",
                "fallback": "admin@example.com",
                "useTls": false
            },
            "nixos": {
                "indexUrl": "http://localhost/packages.json",
                "cachePath": "/tmp/nixos.json",
                "maxAge": 60
            },
            "resolveConcurrency": 2,
            "announceNewSources": false,
            "log": { "file": "/tmp/tracker.log", "json": true }
        }))
        .unwrap();

        assert_eq!(
            result,
            Config {
                distribution_path: Some(PathBuf::from("/srv/distro")),
                root_file: "distro.yml".to_string(),
                database_path: Some(PathBuf::from("/var/lib/tracker.db")),
                upstream: Some(UpstreamRepository::Nixos),
                git: GitConfig {
                    enabled: true,
                    remote: "upstream".to_string(),
                    branch: Some("main".to_string()),
                },
                notifications: NotificationConfig {
                    enabled: true,
                    server: Some("smtp.example.com".to_string()),
                    port: 25,
                    username: Some("user".to_string()),
                    password: Some("pass".to_string()),
                    sender: "tracker@example.com".to_string(),
                    fallback: "admin@example.com".to_string(),
                    use_tls: false,
                },
                nixos: NixosConfig {
                    index_url: "http://localhost/packages.json".to_string(),
                    cache_path: Some(PathBuf::from("/tmp/nixos.json")),
                    max_age: 60,
                },
                resolve_concurrency: 2,
                announce_new_sources: false,
                log: LogConfig {
                    file: Some(PathBuf::from("/tmp/tracker.log")),
                    json: true,
                },
            }
        );
    }

    #[test]
    fn validate_rejects_notifications_without_server() {
        let mut config = Config {
            distribution_path: Some(PathBuf::from("/srv/distro")),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        config.notifications.enabled = true;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingSmtpServer)
        ));

        config.notifications.server = Some("smtp.example.com".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_requires_distribution_path() {
        assert!(matches!(
            Config::default().validate(),
            Err(ConfigError::MissingDistributionPath)
        ));
    }

    #[test]
    fn load_reports_parse_errors_with_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::load(&path).unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.json"));
    }

    #[test]
    fn reconcile_options_never_allow_zero_concurrency() {
        let config = Config {
            resolve_concurrency: 0,
            ..Default::default()
        };

        assert_eq!(config.reconcile_options().resolve_concurrency, 1);
    }

    #[test]
    fn data_dir_with_env_uses_xdg_data_home_when_set() {
        let path = data_dir_with_env(
            Some("/tmp/test-data".to_string()),
            Some(PathBuf::from("/home/user")),
        );

        assert_eq!(path, PathBuf::from("/tmp/test-data/distro-tracker"));
    }

    #[test]
    fn data_dir_with_env_falls_back_to_home_local_share() {
        let path = data_dir_with_env(None, Some(PathBuf::from("/home/user")));

        assert_eq!(path, PathBuf::from("/home/user/.local/share/distro-tracker"));
    }

    #[test]
    fn data_dir_with_env_falls_back_to_current_dir_when_no_dirs_available() {
        let path = data_dir_with_env(None, None);
        assert_eq!(path, PathBuf::from("./distro-tracker"));
    }
}
