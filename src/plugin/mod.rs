//! Plugin update orchestration
//!
//! This module turns a published plugin descriptor into local files:
//!
//! - Version-gated refresh of the plugin binary and settings schema
//! - Concurrent download of both artifacts through a [`DownloadProvider`](crate::download::DownloadProvider)
//! - Merge of the fetched schema into the user's settings
//! - A manager remembering installed versions across runs

pub mod config;
pub mod descriptor;
pub mod ledger;
pub mod manager;
pub mod updater;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{HttpConfig, UpdaterConfig};
pub use descriptor::PluginDescriptor;
pub use ledger::VersionLedger;
pub use manager::PluginManager;
pub use updater::{LoadedPlugin, PluginUpdater, PluginUpdaterBuilder};

/// Plugin lifecycle events
#[derive(Debug, Clone, PartialEq)]
pub enum PluginEvent {
    /// Plugin files were fetched and settings merged
    Refreshed { plugin: String, version: f64 },

    /// Remembered version matched, nothing fetched
    UpToDate { plugin: String, version: f64 },

    /// A merge produced an advisory
    Warning { plugin: String, message: String },

    /// Plugin could not be loaded or refreshed
    Failed { plugin: String, error: String },
}
