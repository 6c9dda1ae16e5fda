//! Core building blocks shared across the crate
//!
//! This module contains the error taxonomy and the structured logging helpers
//! used by the settings codec, the download providers and the plugin updater.

pub mod error;
pub mod logging;

// Re-export commonly used items
pub use error::{UpdaterError, UpdaterResult};
pub use logging::{ErrorContext, ErrorLogger};
