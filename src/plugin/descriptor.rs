// ! Plugin descriptor documents
// !
// ! `{ "Name", "CurrentVersion", "Description", "Plugin", "Configuration" }`

use serde::{Deserialize, Serialize};

use crate::core::error::{UpdaterError, UpdaterResult};

/// Published description of one plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    /// Plugin name, also the file stem of its local files
    #[serde(rename = "Name")]
    pub name: String,

    /// Version number as published by the source
    #[serde(rename = "CurrentVersion")]
    pub current_version: f64,

    /// Human readable description
    #[serde(rename = "Description", default)]
    pub description: String,

    /// Absolute URL of the plugin binary
    #[serde(rename = "Plugin", default)]
    pub binary_source: String,

    /// Absolute URL of the settings schema; absent or empty means none
    #[serde(
        rename = "Configuration",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub settings_source: Option<String>,
}

impl PluginDescriptor {
    /// Create a descriptor without a settings schema
    pub fn new(
        name: impl Into<String>,
        current_version: f64,
        binary_source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            current_version,
            description: String::new(),
            binary_source: binary_source.into(),
            settings_source: None,
        }
    }

    /// Set the settings schema locator
    pub fn with_settings_source(mut self, source: impl Into<String>) -> Self {
        self.settings_source = Some(source.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Parse and validate a descriptor document
    pub fn from_json(json: &str) -> UpdaterResult<Self> {
        let descriptor: Self = serde_json::from_str(json)
            .map_err(|e| UpdaterError::configuration(format!("invalid plugin descriptor: {e}")))?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Parse and validate a JSON array of descriptor documents
    pub fn list_from_json(json: &str) -> UpdaterResult<Vec<Self>> {
        let descriptors: Vec<Self> = serde_json::from_str(json)
            .map_err(|e| UpdaterError::configuration(format!("invalid plugin catalog: {e}")))?;
        for descriptor in &descriptors {
            descriptor.validate()?;
        }
        Ok(descriptors)
    }

    /// Check fields needed before any local file is touched.
    ///
    /// The binary locator is deliberately not checked here; a missing locator
    /// only fails when an update is attempted.
    pub fn validate(&self) -> UpdaterResult<()> {
        let name = self.name.as_str();
        if name.trim().is_empty() {
            return Err(UpdaterError::configuration("plugin name is empty"));
        }
        if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
            return Err(UpdaterError::configuration(format!(
                "plugin name '{name}' cannot be used as a file name"
            )));
        }
        if !self.current_version.is_finite() {
            return Err(UpdaterError::configuration(format!(
                "plugin '{name}' has a non-finite version"
            )));
        }
        Ok(())
    }

    /// Settings schema locator, `None` when absent or blank
    pub fn settings_source(&self) -> Option<&str> {
        self.settings_source
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
