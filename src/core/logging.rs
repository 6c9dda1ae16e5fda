// ! Structured logging for plugin synchronization
// !
// ! Module provides categorized error logging over `tracing` and an
// ! optional subscriber initializer for applications embedding the crate.

use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::{Level, error, info, span, warn};

use crate::core::error::UpdaterError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorLogLevel {
    /// Errors that abort a refresh and need operator attention
    Error,
    /// Failures that a later retry may fix
    Warning,
    /// Local input problems
    Info,
}

impl From<&UpdaterError> for ErrorLogLevel {
    fn from(error: &UpdaterError) -> Self {
        match error {
            UpdaterError::Configuration(_)
            | UpdaterError::Parse { .. }
            | UpdaterError::Serialization(_) => ErrorLogLevel::Error,

            UpdaterError::Transport(_) | UpdaterError::Io(_) => ErrorLogLevel::Warning,

            UpdaterError::Update { source, .. } => ErrorLogLevel::from(source.as_ref()),

            UpdaterError::Validation(_) | UpdaterError::Url(_) => ErrorLogLevel::Info,
        }
    }
}

/// Extended error context for logging
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Operation being performed when error occurred
    pub operation: String,
    /// Plugin name if known
    pub plugin: Option<String>,
    /// Source locator involved in the failure
    pub locator: Option<String>,
    /// Additional context data
    pub extra: HashMap<String, Value>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            operation: "unknown".to_string(),
            plugin: None,
            locator: None,
            extra: HashMap::new(),
        }
    }
}

impl ErrorContext {
    /// Create a new error context
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Default::default()
        }
    }

    /// Set plugin name
    pub fn with_plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugin = Some(plugin.into());
        self
    }

    /// Set source locator
    pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
        self.locator = Some(locator.into());
        self
    }

    /// Add extra context data
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Structured error logger
pub struct ErrorLogger;

impl ErrorLogger {
    /// Log an error with full context at a level derived from its category
    pub fn log_error(error: &UpdaterError, context: ErrorContext) {
        let category = error.category();
        let recoverable = error.is_recoverable();

        let log_data = json!({
            "error_category": category,
            "error_recoverable": recoverable,
            "error_message": error.to_string(),
            "operation": context.operation,
            "plugin": context.plugin,
            "locator": context.locator,
            "extra_context": context.extra,
        });
        let payload = serde_json::to_string(&log_data).unwrap_or_default();

        match ErrorLogLevel::from(error) {
            ErrorLogLevel::Error => {
                error!(
                    target: "plugin_sync_errors",
                    error_category = category,
                    error_recoverable = recoverable,
                    operation = context.operation.as_str(),
                    "Plugin error: {} - {}",
                    error,
                    payload
                );
            }
            ErrorLogLevel::Warning => {
                warn!(
                    target: "plugin_sync_errors",
                    error_category = category,
                    error_recoverable = recoverable,
                    operation = context.operation.as_str(),
                    "Plugin warning: {} - {}",
                    error,
                    payload
                );
            }
            ErrorLogLevel::Info => {
                info!(
                    target: "plugin_sync_errors",
                    error_category = category,
                    error_recoverable = recoverable,
                    operation = context.operation.as_str(),
                    "Plugin info: {} - {}",
                    error,
                    payload
                );
            }
        }
    }

    /// Create a logging span for an operation
    pub fn create_operation_span(operation: &str, context: &ErrorContext) -> tracing::Span {
        span!(
            Level::INFO,
            "plugin_operation",
            operation = operation,
            plugin = context.plugin.as_deref(),
            locator = context.locator.as_deref(),
        )
    }
}

impl UpdaterError {
    /// Log this error with structured context
    pub fn log_with_context(&self, context: ErrorContext) {
        ErrorLogger::log_error(self, context);
    }

    /// Log this error with basic context
    pub fn log_error(&self, operation: &str) {
        ErrorLogger::log_error(self, ErrorContext::new(operation));
    }
}

/// Install a global `fmt` subscriber filtered by `filter`, falling back to
/// `RUST_LOG` and then `info`.
///
/// Returns `false` when a global subscriber was already installed.
#[cfg(feature = "tracing-subscriber")]
pub fn init_tracing(filter: Option<&str>) -> bool {
    use tracing_subscriber::EnvFilter;

    let env_filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
