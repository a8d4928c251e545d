//! Configuration loading and management
//!
//! Handles parsing of `taskdeck.toml` from the data directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::store::{DEFAULT_ACTIVITY_KEY, DEFAULT_TASKS_KEY};
use crate::view::SortKey;

/// File name of the configuration inside the data directory
pub const CONFIG_FILE: &str = "taskdeck.toml";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "TASKDECK_DATA_DIR";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Storage medium configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Default view parameters
    #[serde(default)]
    pub view: ViewConfig,

    /// Static site server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Storage-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Key holding the task collection
    #[serde(default = "default_tasks_key")]
    pub tasks_key: String,

    /// Key holding the derived recent activity
    #[serde(default = "default_activity_key")]
    pub activity_key: String,

    /// Total bytes the medium may hold; 0 disables the limit
    #[serde(default = "default_quota_bytes")]
    pub quota_bytes: u64,
}

fn default_tasks_key() -> String {
    DEFAULT_TASKS_KEY.to_string()
}

fn default_activity_key() -> String {
    DEFAULT_ACTIVITY_KEY.to_string()
}

fn default_quota_bytes() -> u64 {
    5 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            tasks_key: default_tasks_key(),
            activity_key: default_activity_key(),
            quota_bytes: default_quota_bytes(),
        }
    }
}

/// View defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Sort key used when `list` is run without `--sort`
    #[serde(default)]
    pub default_sort: SortKey,
}

/// Static site server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen host
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory with the built single-page application
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Path prefix reserved for API routes
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("dist/public")
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            api_prefix: default_api_prefix(),
        }
    }
}

impl Config {
    /// Load configuration from a `taskdeck.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the data directory, or return defaults
    pub fn load_from_dir(data_dir: &Path) -> Self {
        Self::load_or_default(&data_dir.join(CONFIG_FILE))
    }

    /// Load configuration from `path`, falling back to defaults when the file
    /// is missing or invalid
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring invalid config");
                Self::default()
            }
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> crate::error::Result<()> {
        self.storage.validate()?;
        self.server.validate()?;
        Ok(())
    }
}

impl StorageConfig {
    fn validate(&self) -> crate::error::Result<()> {
        for (field, key) in [
            ("storage.tasks_key", &self.tasks_key),
            ("storage.activity_key", &self.activity_key),
        ] {
            if key.trim().is_empty() {
                return Err(crate::error::Error::InvalidConfig(format!(
                    "{field} cannot be empty"
                )));
            }
            if !key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_'))
            {
                return Err(crate::error::Error::InvalidConfig(format!(
                    "{field} must use letters, digits, '-' or '_'"
                )));
            }
        }
        if self.tasks_key == self.activity_key {
            return Err(crate::error::Error::InvalidConfig(
                "storage.tasks_key and storage.activity_key must differ".to_string(),
            ));
        }
        Ok(())
    }

    /// Quota handed to the storage medium
    pub fn quota(&self) -> Option<u64> {
        (self.quota_bytes > 0).then_some(self.quota_bytes)
    }
}

impl ServerConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if self.host.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "server.host cannot be empty".to_string(),
            ));
        }
        if !self.api_prefix.starts_with('/') || self.api_prefix.len() < 2 {
            return Err(crate::error::Error::InvalidConfig(format!(
                "server.api_prefix '{}' must start with '/' and name a segment",
                self.api_prefix
            )));
        }
        Ok(())
    }
}

/// Resolve the data directory: explicit path, then the platform default.
pub fn resolve_data_dir(explicit: Option<&Path>) -> crate::error::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    directories::ProjectDirs::from("", "", "taskdeck")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| {
            crate::error::Error::InvalidConfig(format!(
                "cannot determine a data directory; pass --data-dir or set {DATA_DIR_ENV}"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.storage.tasks_key, "task-manager-tasks");
        assert_eq!(cfg.storage.activity_key, "taskRecentActivity");
        assert_eq!(cfg.storage.quota(), Some(5 * 1024 * 1024));
        assert_eq!(cfg.view.default_sort, SortKey::Created);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 5000);
        assert_eq!(cfg.server.static_dir, PathBuf::from("dist/public"));
        assert_eq!(cfg.server.api_prefix, "/api");
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        let content = r#"
[storage]
tasks_key = "tasks"
quota_bytes = 2048

[view]
default_sort = "due-date"

[server]
port = 8080
static_dir = "site"
"#;
        fs::write(&path, content).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.storage.tasks_key, "tasks");
        assert_eq!(cfg.storage.activity_key, "taskRecentActivity");
        assert_eq!(cfg.storage.quota(), Some(2048));
        assert_eq!(cfg.view.default_sort, SortKey::DueDate);
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.static_dir, PathBuf::from("site"));
        assert_eq!(cfg.server.host, "0.0.0.0");
    }

    #[test]
    fn load_rejects_colliding_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "[storage]\ntasks_key = \"same\"\nactivity_key = \"same\"\n",
        )
        .expect("write config");

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn save_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        let mut cfg = Config::default();
        cfg.server.port = 9999;
        cfg.storage.quota_bytes = 0;
        cfg.save(&path).expect("save");

        let loaded = Config::load(&path).expect("load");
        assert_eq!(loaded.server.port, 9999);
        assert_eq!(loaded.storage.quota(), None);
    }

    #[test]
    fn explicit_data_dir_wins() {
        let dir = PathBuf::from("/tmp/taskdeck-test");
        assert_eq!(resolve_data_dir(Some(&dir)).unwrap(), dir);
    }
}
