// Copyright (c) 2025 Plugin Sync Contributors
// SPDX-License-Identifier: MIT

//! # Plugin Sync
//!
//! Version-gated plugin updates with a settings merge that keeps what the user
//! configured.
//!
//! A plugin is published as a small JSON descriptor naming its version, the
//! locator of its binary and, optionally, the locator of a settings schema.
//! When the locally remembered version differs from the published one, the
//! binary and the schema are fetched concurrently and the schema is merged
//! into the local settings file:
//!
//! - user values survive upgrades
//! - new settings arrive with their defaults
//! - settings the user has but the schema dropped are kept
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # #[cfg(feature = "http")]
//! # async fn run() -> plugin_sync::UpdaterResult<()> {
//! use plugin_sync::prelude::*;
//!
//! let descriptor = r#"{
//!     "Name": "Dump",
//!     "CurrentVersion": 1.0,
//!     "Plugin": "https://example.com/Dump.bin",
//!     "Configuration": "https://example.com/Dump.cfg"
//! }"#;
//!
//! let loaded = PluginUpdater::new(descriptor, "Plugins", Some(0.9)).await?;
//! let mut updater = loaded.updater;
//! updater.set_value("directory", r"G:\Games\")?;
//! updater.write_configuration_to_file().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Settings file format
//!
//! One setting per line, `name[KIND;p1,p2,...]=value`, where `KIND` is one of
//! `STRING`, `SELECT`, `MSELECT`, `TOGGLE` or `RANGE`.
//!
//! ## Module Organization
//!
//! - [`core`]: Error taxonomy and structured error logging
//! - [`settings`]: Typed settings, the file codec and the schema merge
//! - [`download`]: The download provider abstraction and the HTTP provider
//! - [`plugin`]: Updater, configuration, version ledger and manager
//! - [`utils`]: Locator helpers

pub mod core;
pub mod download;
pub mod plugin;
pub mod settings;
pub mod utils;

// Re-export commonly used types for convenience
pub use core::error::{UpdaterError, UpdaterResult};
#[cfg(feature = "tracing-subscriber")]
pub use core::logging::init_tracing;

/// Prelude module for convenient imports
///
/// Use `use plugin_sync::prelude::*;` to import the commonly used types.
pub mod prelude {
    pub use crate::core::error::{UpdaterError, UpdaterResult};

    pub use crate::download::{DownloadProvider, DownloadStatus};
    #[cfg(feature = "http")]
    pub use crate::download::HttpDownloadProvider;

    pub use crate::plugin::{
        LoadedPlugin, PluginDescriptor, PluginEvent, PluginManager, PluginUpdater,
        UpdaterConfig,
    };
    pub use crate::settings::{MergeWarning, Setting, SettingKind, SettingsMap};

    // Essential external types
    pub use async_trait::async_trait;
}
