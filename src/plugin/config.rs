// ! Updater configuration management
// !
// ! Module handles the YAML configuration that controls where plugins are
// ! stored and how the default HTTP provider behaves.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::error::UpdaterResult;

/// Updater configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Directory holding plugin binaries and settings files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,

    /// Extension of downloaded plugin binaries
    #[serde(default = "default_binary_extension")]
    pub binary_extension: String,

    /// Extension of plugin settings files
    #[serde(default = "default_settings_extension")]
    pub settings_extension: String,

    /// Default HTTP provider settings
    #[serde(default)]
    pub http: HttpConfig,
}

/// Settings for the default HTTP download provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Whole-request timeout in milliseconds
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Probe `Last-Modified` and skip transfers of current files
    #[serde(default)]
    pub only_if_newer: bool,

    /// User agent sent with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

fn default_binary_extension() -> String {
    "bin".to_string()
}

fn default_settings_extension() -> String {
    "cfg".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    30_000
}

fn default_read_timeout_ms() -> u64 {
    60_000
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            read_timeout_ms: default_read_timeout_ms(),
            only_if_newer: false,
            user_agent: None,
        }
    }
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            storage_dir: None,
            binary_extension: default_binary_extension(),
            settings_extension: default_settings_extension(),
            http: HttpConfig::default(),
        }
    }
}

impl UpdaterConfig {
    /// Set the storage directory
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Enable the `Last-Modified` probe of the default provider
    pub fn with_only_if_newer(mut self) -> Self {
        self.http.only_if_newer = true;
        self
    }

    /// Configured storage directory, or the per-user default
    pub fn resolved_storage_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(default_storage_dir)
    }

    /// Load configuration from a YAML file
    pub async fn from_file(path: impl AsRef<std::path::Path>) -> UpdaterResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Save configuration to a YAML file
    pub async fn to_file(&self, path: impl AsRef<std::path::Path>) -> UpdaterResult<()> {
        let content = serde_yaml::to_string(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

/// Per-user plugin directory, `./plugins` when the platform has none
pub fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("plugin-sync").join("plugins"))
        .unwrap_or_else(|| PathBuf::from("./plugins"))
}
