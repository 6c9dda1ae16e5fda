// ! Scripted download provider for plugin tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Barrier;

use crate::core::error::{UpdaterError, UpdaterResult};
use crate::download::{DownloadProvider, DownloadStatus};

pub(crate) const BIN_URL: &str = "http://x/Dump.bin";
pub(crate) const CFG_URL: &str = "http://x/Dump.cfg";

enum Response {
    Body(Vec<u8>),
    Error(String),
    Status(DownloadStatus),
}

/// Serves canned responses keyed by source locator
#[derive(Default)]
pub(crate) struct ScriptedProvider {
    responses: HashMap<String, Response>,
    calls: AtomicUsize,
    fetched: Mutex<Vec<(String, String)>>,
    barrier: Option<Arc<Barrier>>,
}

impl ScriptedProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Binary and schema for the `Dump` plugin
    pub(crate) fn dump(schema: &str) -> Self {
        Self::new()
            .with_body(BIN_URL, b"binary v1")
            .with_body(CFG_URL, schema.as_bytes())
    }

    pub(crate) fn with_body(mut self, source: &str, body: &[u8]) -> Self {
        self.responses
            .insert(source.to_string(), Response::Body(body.to_vec()));
        self
    }

    pub(crate) fn with_error(mut self, source: &str, message: &str) -> Self {
        self.responses
            .insert(source.to_string(), Response::Error(message.to_string()));
        self
    }

    pub(crate) fn with_status(mut self, source: &str, status: DownloadStatus) -> Self {
        self.responses
            .insert(source.to_string(), Response::Status(status));
        self
    }

    /// Make every fetch wait until `barrier` is released
    pub(crate) fn with_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(source, destination file name)` of every fetch so far
    pub(crate) fn fetched(&self) -> Vec<(String, String)> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl DownloadProvider for ScriptedProvider {
    async fn fetch(&self, source: &str, destination: &Path) -> UpdaterResult<DownloadStatus> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let file_name = destination
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.fetched
            .lock()
            .unwrap()
            .push((source.to_string(), file_name));

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }

        match self.responses.get(source) {
            Some(Response::Body(body)) => {
                tokio::fs::write(destination, body).await?;
                Ok(DownloadStatus::Success)
            }
            Some(Response::Error(message)) => Err(UpdaterError::transport(message.clone())),
            Some(Response::Status(status)) => Ok(*status),
            None => Err(UpdaterError::transport(format!("no route to {source}"))),
        }
    }
}
