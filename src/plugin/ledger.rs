// ! Remembered plugin versions
// !
// ! Persisted as a JSON object `{ "<plugin>": <version>, ... }`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

use crate::core::error::UpdaterResult;

/// Versions of the plugins installed locally
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionLedger {
    versions: BTreeMap<String, f64>,
}

impl VersionLedger {
    /// Load a ledger; a missing file is an empty ledger
    pub async fn load(path: impl AsRef<Path>) -> UpdaterResult<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the ledger
    pub async fn save(&self, path: impl AsRef<Path>) -> UpdaterResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Remembered version of `plugin`
    pub fn get(&self, plugin: &str) -> Option<f64> {
        self.versions.get(plugin).copied()
    }

    /// Remember `version` for `plugin`
    pub fn record(&mut self, plugin: impl Into<String>, version: f64) {
        self.versions.insert(plugin.into(), version);
    }

    /// Forget `plugin`, returning its previous version
    pub fn remove(&mut self, plugin: &str) -> Option<f64> {
        self.versions.remove(plugin)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}
