//! Download providers
//!
//! A [`DownloadProvider`] retrieves one remote resource into a local path. The
//! plugin updater only talks to this trait, so the transport can be swapped
//! for tests, mirrors, or platform-specific fetchers.

#[cfg(feature = "http")]
pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::core::error::UpdaterResult;

#[cfg(feature = "http")]
pub use http::HttpDownloadProvider;

/// Outcome reported by a download provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadStatus {
    /// Resource retrieved and stored at the destination
    Success,
    /// Provider gave up without raising an error
    Fail,
    /// Transfer continues in the background
    InProgress,
    /// Local copy is current, nothing transferred
    UpToDate,
    /// Provider cannot tell
    Unknown,
}

/// Capability to fetch a remote resource into a local file
#[async_trait]
pub trait DownloadProvider: Send + Sync {
    /// Retrieve `source` into `destination`.
    ///
    /// Transport failures are returned as errors; the status describes what
    /// happened when the call itself succeeded.
    async fn fetch(&self, source: &str, destination: &Path) -> UpdaterResult<DownloadStatus>;
}

/// Temporary sibling path a download is staged into: `<destination>.tmp`
pub fn temp_path(destination: &Path) -> PathBuf {
    let mut raw: OsString = destination.as_os_str().to_owned();
    raw.push(".tmp");
    PathBuf::from(raw)
}

/// Replace `destination` with `staged`.
///
/// Deletes the destination first and then renames, so a crash in between can
/// leave the destination absent until the next download.
pub async fn replace_file(staged: &Path, destination: &Path) -> UpdaterResult<()> {
    match tokio::fs::remove_file(destination).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    tokio::fs::rename(staged, destination).await?;
    Ok(())
}

/// Remove a staged file, ignoring one that is already gone
pub async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != ErrorKind::NotFound {
            warn!("Could not remove {:?}: {}", path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_path_appends_suffix() {
        let path = Path::new("/plugins/Dump.bin");
        assert_eq!(temp_path(path), PathBuf::from("/plugins/Dump.bin.tmp"));
    }

    #[tokio::test]
    async fn test_replace_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("Dump.bin");
        let staged = temp_path(&destination);

        tokio::fs::write(&destination, b"old").await.unwrap();
        tokio::fs::write(&staged, b"new").await.unwrap();
        replace_file(&staged, &destination).await.unwrap();

        assert_eq!(tokio::fs::read(&destination).await.unwrap(), b"new");
        assert!(!staged.exists());
    }

    #[tokio::test]
    async fn test_replace_without_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("Dump.cfg");
        let staged = temp_path(&destination);

        tokio::fs::write(&staged, b"a[STRING;]=1\n").await.unwrap();
        replace_file(&staged, &destination).await.unwrap();

        assert!(destination.exists());
    }
}
