// ! High-level plugin manager
// !
// ! Refreshes a list of plugins against the versions remembered in the
// ! storage directory's ledger.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::core::error::UpdaterResult;
use crate::core::logging::ErrorContext;
use crate::download::DownloadProvider;
use crate::plugin::config::UpdaterConfig;
use crate::plugin::descriptor::PluginDescriptor;
use crate::plugin::ledger::VersionLedger;
use crate::plugin::updater::{LoadedPlugin, PluginUpdater};
use crate::plugin::PluginEvent;

/// File name of the version ledger inside the storage directory
pub const LEDGER_FILE: &str = "versions.json";

/// Type alias for event handlers to reduce complexity
type EventHandlers = Vec<Box<dyn Fn(PluginEvent) + Send + Sync>>;

/// Manager for the plugins of one storage directory
pub struct PluginManager {
    /// Directory holding plugin files and the ledger
    storage_dir: PathBuf,

    /// Configuration handed to every updater
    config: UpdaterConfig,

    /// Download provider shared by every updater
    provider: Arc<dyn DownloadProvider>,

    /// Remembered versions
    ledger: Arc<RwLock<VersionLedger>>,

    /// Event handlers
    event_handlers: Arc<RwLock<EventHandlers>>,
}

impl PluginManager {
    /// Open the storage directory with the default HTTP provider
    #[cfg(feature = "http")]
    pub async fn open(config: UpdaterConfig) -> UpdaterResult<Self> {
        let provider = crate::plugin::updater::default_provider(&config)?;
        Self::open_with_provider(config, provider).await
    }

    /// Open the storage directory with a custom provider
    pub async fn open_with_provider(
        config: UpdaterConfig,
        provider: Arc<dyn DownloadProvider>,
    ) -> UpdaterResult<Self> {
        let storage_dir = config.resolved_storage_dir();
        tokio::fs::create_dir_all(&storage_dir).await?;
        let ledger = VersionLedger::load(storage_dir.join(LEDGER_FILE)).await?;
        info!(
            "Opened plugin storage {:?} ({} known plugins)",
            storage_dir,
            ledger.len()
        );

        Ok(Self {
            storage_dir,
            config,
            provider,
            ledger: Arc::new(RwLock::new(ledger)),
            event_handlers: Arc::new(RwLock::new(Vec::new())),
        })
    }

    /// Directory holding plugin files
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Version remembered for `plugin`
    pub async fn remembered_version(&self, plugin: &str) -> Option<f64> {
        self.ledger.read().await.get(plugin)
    }

    /// Forget the remembered version so the next refresh fetches again
    pub async fn forget(&self, plugin: &str) -> UpdaterResult<()> {
        let mut ledger = self.ledger.write().await;
        let mut updated = ledger.clone();
        if updated.remove(plugin).is_some() {
            updated.save(self.storage_dir.join(LEDGER_FILE)).await?;
            *ledger = updated;
        }
        Ok(())
    }

    /// Build an updater for `descriptor`, refreshing it when its version changed
    pub async fn refresh(&self, descriptor: PluginDescriptor) -> UpdaterResult<LoadedPlugin> {
        let name = descriptor.name.clone();
        let version = descriptor.current_version;

        let mut builder = PluginUpdater::builder(descriptor)
            .with_storage_dir(self.storage_dir.clone())
            .with_config(self.config.clone())
            .with_shared_provider(self.provider.clone());
        if let Some(remembered) = self.remembered_version(&name).await {
            builder = builder.with_remembered_version(remembered);
        }

        let loaded = match builder.build().await {
            Ok(loaded) => loaded,
            Err(e) => {
                error!("Failed to refresh plugin {}: {}", name, e);
                self.emit_event(PluginEvent::Failed {
                    plugin: name,
                    error: e.to_string(),
                })
                .await;
                return Err(e);
            }
        };

        if loaded.refreshed {
            self.emit_event(PluginEvent::Refreshed {
                plugin: name.clone(),
                version,
            })
            .await;

            // The files are already updated; a ledger that cannot be saved only
            // means the next run fetches again
            if let Err(e) = self.remember(&name, version).await {
                e.log_with_context(
                    ErrorContext::new("save_ledger")
                        .with_plugin(name.clone())
                        .with_extra("version", version),
                );
                self.emit_event(PluginEvent::Warning {
                    plugin: name.clone(),
                    message: format!("version {version} not remembered: {e}"),
                })
                .await;
            }
        } else {
            self.emit_event(PluginEvent::UpToDate {
                plugin: name.clone(),
                version,
            })
            .await;
        }

        for warning in &loaded.warnings {
            self.emit_event(PluginEvent::Warning {
                plugin: name.clone(),
                message: warning.to_string(),
            })
            .await;
        }

        Ok(loaded)
    }

    /// Record `version` on disk, then in memory
    async fn remember(&self, plugin: &str, version: f64) -> UpdaterResult<()> {
        let mut ledger = self.ledger.write().await;
        let mut updated = ledger.clone();
        updated.record(plugin, version);
        updated.save(self.storage_dir.join(LEDGER_FILE)).await?;
        *ledger = updated;
        Ok(())
    }

    /// Refresh every descriptor in order, collecting per-plugin results
    pub async fn refresh_all(
        &self,
        descriptors: Vec<PluginDescriptor>,
    ) -> Vec<(String, UpdaterResult<LoadedPlugin>)> {
        let mut results = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let name = descriptor.name.clone();
            let result = self.refresh(descriptor).await;
            results.push((name, result));
        }
        results
    }

    /// Add an event handler
    pub async fn on_event<F>(&self, handler: F)
    where
        F: Fn(PluginEvent) + Send + Sync + 'static,
    {
        self.event_handlers.write().await.push(Box::new(handler));
    }

    /// Emit an event to all handlers
    async fn emit_event(&self, event: PluginEvent) {
        let handlers = self.event_handlers.read().await;
        for handler in handlers.iter() {
            handler(event.clone());
        }
    }
}
