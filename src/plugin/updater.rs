// ! Plugin updater
// !
// ! Owns one plugin's local files and settings. Construction loads the local
// ! settings and, when the remembered version differs from the published one,
// ! fetches the binary and the settings schema concurrently, merges the schema
// ! into the user's settings and writes them back.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{Instrument, debug, info, warn};

use crate::core::error::{UpdaterError, UpdaterResult};
use crate::core::logging::{ErrorContext, ErrorLogger};
use crate::download::{DownloadProvider, DownloadStatus, discard};
use crate::plugin::config::UpdaterConfig;
use crate::plugin::descriptor::PluginDescriptor;
use crate::settings::{self, MergeWarning, SettingsMap};
use crate::utils::uri::parse_network_url;

/// A constructed updater together with what happened while building it
#[derive(Debug)]
pub struct LoadedPlugin {
    /// The ready updater
    pub updater: PluginUpdater,
    /// Non-fatal merge advisories
    pub warnings: Vec<MergeWarning>,
    /// Whether a refresh ran
    pub refreshed: bool,
}

/// Update and settings state of a single plugin
pub struct PluginUpdater {
    name: String,
    description: String,
    current_version: f64,
    binary_source: String,
    settings_source: Option<String>,
    binary_path: PathBuf,
    settings_path: PathBuf,
    settings: SettingsMap,
    provider: Arc<dyn DownloadProvider>,
}

impl fmt::Debug for PluginUpdater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginUpdater")
            .field("name", &self.name)
            .field("current_version", &self.current_version)
            .field("binary_source", &self.binary_source)
            .field("settings_source", &self.settings_source)
            .field("binary_path", &self.binary_path)
            .field("settings_path", &self.settings_path)
            .field("settings", &self.settings.len())
            .finish_non_exhaustive()
    }
}

impl PluginUpdater {
    /// Start building an updater for `descriptor`
    pub fn builder(descriptor: PluginDescriptor) -> PluginUpdaterBuilder {
        PluginUpdaterBuilder::new(descriptor)
    }

    /// Build an updater from a descriptor document with the default HTTP provider
    #[cfg(feature = "http")]
    pub async fn new(
        descriptor_json: &str,
        storage_dir: impl Into<PathBuf>,
        remembered_version: Option<f64>,
    ) -> UpdaterResult<LoadedPlugin> {
        let descriptor = PluginDescriptor::from_json(descriptor_json)?;
        let mut builder = Self::builder(descriptor).with_storage_dir(storage_dir);
        if let Some(version) = remembered_version {
            builder = builder.with_remembered_version(version);
        }
        builder.build().await
    }

    /// Plugin name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Plugin description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Version published by the descriptor this updater was built from
    pub fn current_version(&self) -> f64 {
        self.current_version
    }

    /// Locator of the plugin binary
    pub fn binary_source(&self) -> &str {
        &self.binary_source
    }

    /// Point the next update at a different binary locator
    pub fn set_binary_source(&mut self, source: impl Into<String>) {
        self.binary_source = source.into();
    }

    /// Locator of the settings schema, if the plugin declares one
    pub fn settings_source(&self) -> Option<&str> {
        self.settings_source.as_deref()
    }

    /// Local path of the plugin binary
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Local path of the settings file
    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Current in-memory settings
    pub fn configuration(&self) -> &SettingsMap {
        &self.settings
    }

    /// Mutable access to the in-memory settings
    pub fn configuration_mut(&mut self) -> &mut SettingsMap {
        &mut self.settings
    }

    /// Set the value of an existing setting
    pub fn set_value(&mut self, name: &str, value: impl Into<String>) -> UpdaterResult<()> {
        let setting = self.settings.get_mut(name).ok_or_else(|| {
            UpdaterError::validation(format!("plugin '{}' has no setting '{name}'", self.name))
        })?;
        setting.value = value.into();
        Ok(())
    }

    /// Fetch binary and settings schema, merge the schema and persist.
    ///
    /// Both downloads run concurrently and always run to completion. If either
    /// fails the refresh fails with [`UpdaterError::Update`]; a binary that was
    /// already replaced stays replaced, but the user's settings file is left
    /// untouched because the schema is staged beside it.
    pub async fn update(&mut self) -> UpdaterResult<Vec<MergeWarning>> {
        let context = ErrorContext::new("update")
            .with_plugin(self.name.clone())
            .with_locator(self.binary_source.clone())
            .with_extra("version", self.current_version);
        let span = ErrorLogger::create_operation_span("update", &context);

        let result = self.run_update().instrument(span).await;
        if let Err(e) = &result {
            e.log_with_context(context);
        }
        result
    }

    async fn run_update(&mut self) -> UpdaterResult<Vec<MergeWarning>> {
        parse_network_url(&self.binary_source).map_err(|e| {
            UpdaterError::configuration(format!("plugin source not configured: {e}"))
        })?;
        if let Some(source) = &self.settings_source {
            parse_network_url(source).map_err(|e| {
                UpdaterError::configuration(format!("plugin settings source not configured: {e}"))
            })?;
        }

        info!("Updating plugin {} to version {}", self.name, self.current_version);
        let staging = schema_staging_path(&self.settings_path);

        let binary_leg = self.provider.fetch(&self.binary_source, &self.binary_path);
        let settings_leg = async {
            match &self.settings_source {
                Some(source) => self.provider.fetch(source, &staging).await,
                None => Ok(DownloadStatus::UpToDate),
            }
        };
        // join! rather than try_join!: a failing leg must not cancel the other
        let (binary_result, settings_result) = tokio::join!(binary_leg, settings_leg);

        let binary_status = self.leg_outcome("binary", binary_result);
        let settings_status = self.leg_outcome("settings", settings_result);
        if let Err(e) = binary_status.and(settings_status) {
            discard(&staging).await;
            return Err(e);
        }

        let fresh = if self.settings_source.is_some() {
            let parsed = settings::load_file(&staging).await;
            discard(&staging).await;
            parsed.map_err(|e| UpdaterError::update(self.name.clone(), e))?
        } else {
            SettingsMap::new()
        };
        debug!("Fetched {} setting definitions for {}", fresh.len(), self.name);

        let outcome = settings::merge(std::mem::take(&mut self.settings), fresh);
        self.settings = outcome.settings;
        self.write_configuration_to_file().await?;

        info!(
            "Plugin {} updated ({} settings, {} warnings)",
            self.name,
            self.settings.len(),
            outcome.warnings.len()
        );
        Ok(outcome.warnings)
    }

    fn leg_outcome(
        &self,
        leg: &str,
        result: UpdaterResult<DownloadStatus>,
    ) -> UpdaterResult<DownloadStatus> {
        match result {
            Ok(DownloadStatus::Fail) => Err(UpdaterError::update(
                self.name.clone(),
                UpdaterError::transport(format!("{leg} download reported failure")),
            )),
            Ok(status @ (DownloadStatus::InProgress | DownloadStatus::Unknown)) => {
                warn!("Plugin {} {} download ended with {:?}", self.name, leg, status);
                Ok(status)
            }
            Ok(status) => {
                debug!("Plugin {} {} download: {:?}", self.name, leg, status);
                Ok(status)
            }
            Err(e) => Err(UpdaterError::update(self.name.clone(), e)),
        }
    }

    /// Persist settings to the settings file.
    ///
    /// Does nothing when there are no settings.
    pub async fn write_configuration_to_file(&self) -> UpdaterResult<()> {
        self.write_configuration_to(&self.settings_path).await
    }

    /// Persist settings to `path`; does nothing when there are no settings
    pub async fn write_configuration_to(&self, path: impl AsRef<Path>) -> UpdaterResult<()> {
        if self.settings.is_empty() {
            debug!("Plugin {} has no settings, nothing written", self.name);
            return Ok(());
        }
        settings::write_file(path, &self.settings).await
    }
}

/// Builder for [`PluginUpdater`]
pub struct PluginUpdaterBuilder {
    descriptor: PluginDescriptor,
    storage_dir: Option<PathBuf>,
    remembered_version: Option<f64>,
    provider: Option<Arc<dyn DownloadProvider>>,
    config: UpdaterConfig,
}

impl PluginUpdaterBuilder {
    /// Create a builder for `descriptor` with default configuration
    pub fn new(descriptor: PluginDescriptor) -> Self {
        Self {
            descriptor,
            storage_dir: None,
            remembered_version: None,
            provider: None,
            config: UpdaterConfig::default(),
        }
    }

    /// Set the directory holding the plugin files
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Set the locally installed version; without it a refresh always runs
    pub fn with_remembered_version(mut self, version: f64) -> Self {
        self.remembered_version = Some(version);
        self
    }

    /// Set the download provider
    pub fn with_provider<P: DownloadProvider + 'static>(self, provider: P) -> Self {
        self.with_shared_provider(Arc::new(provider))
    }

    /// Set a shared download provider
    pub fn with_shared_provider(mut self, provider: Arc<dyn DownloadProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the updater configuration
    pub fn with_config(mut self, config: UpdaterConfig) -> Self {
        self.config = config;
        self
    }

    fn resolve_provider(&self) -> UpdaterResult<Arc<dyn DownloadProvider>> {
        match &self.provider {
            Some(provider) => Ok(provider.clone()),
            None => default_provider(&self.config),
        }
    }

    /// Load local settings and refresh when the remembered version differs
    pub async fn build(self) -> UpdaterResult<LoadedPlugin> {
        let descriptor = &self.descriptor;
        descriptor.validate()?;

        let storage_dir = self
            .storage_dir
            .clone()
            .unwrap_or_else(|| self.config.resolved_storage_dir());
        tokio::fs::create_dir_all(&storage_dir).await?;

        let provider = self.resolve_provider()?;
        let binary_path =
            storage_dir.join(format!("{}.{}", descriptor.name, self.config.binary_extension));
        let settings_path =
            storage_dir.join(format!("{}.{}", descriptor.name, self.config.settings_extension));

        let settings = settings::load_file(&settings_path).await?;

        let mut updater = PluginUpdater {
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            current_version: descriptor.current_version,
            binary_source: descriptor.binary_source.clone(),
            settings_source: descriptor.settings_source().map(str::to_string),
            binary_path,
            settings_path,
            settings,
            provider,
        };

        if self.remembered_version == Some(descriptor.current_version) {
            info!(
                "Plugin {} is at version {}, no update needed",
                updater.name, updater.current_version
            );
            return Ok(LoadedPlugin {
                updater,
                warnings: Vec::new(),
                refreshed: false,
            });
        }

        let warnings = updater.update().await?;
        Ok(LoadedPlugin {
            updater,
            warnings,
            refreshed: true,
        })
    }
}

#[cfg(feature = "http")]
pub(crate) fn default_provider(config: &UpdaterConfig) -> UpdaterResult<Arc<dyn DownloadProvider>> {
    let provider = crate::download::HttpDownloadProvider::with_config(&config.http)?;
    Ok(Arc::new(provider))
}

#[cfg(not(feature = "http"))]
pub(crate) fn default_provider(_config: &UpdaterConfig) -> UpdaterResult<Arc<dyn DownloadProvider>> {
    Err(UpdaterError::configuration(
        "download provider isn't configured",
    ))
}

/// Where the settings schema is downloaded before it is merged
pub fn schema_staging_path(settings_path: &Path) -> PathBuf {
    let mut raw: OsString = settings_path.as_os_str().to_owned();
    raw.push(".schema");
    PathBuf::from(raw)
}
