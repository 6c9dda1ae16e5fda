// ! Error types for plugin synchronization
// !
// ! Module defines the error taxonomy shared by the settings codec, the
// ! download providers and the plugin updater.

use thiserror::Error;

/// The main error type for plugin updates
#[derive(Error, Debug, Clone)]
pub enum UpdaterError {
    /// Malformed or missing descriptor fields, invalid source locators
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Settings file present but not following the line grammar
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Parameter list does not fit the declared setting kind
    #[error("Validation error: {0}")]
    Validation(String),

    /// Raised by a download provider while retrieving a resource
    #[error("Transport error: {0}")]
    Transport(String),

    /// A refresh failed; wraps the failure of the leg that broke it
    #[error("Update of plugin '{plugin}' failed: {source}")]
    Update {
        plugin: String,
        #[source]
        source: Box<UpdaterError>,
    },

    /// I/O errors from the standard library
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON/YAML serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(String),
}

// Manual From implementations for types that don't implement Clone
impl From<std::io::Error> for UpdaterError {
    fn from(err: std::io::Error) -> Self {
        UpdaterError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for UpdaterError {
    fn from(err: serde_json::Error) -> Self {
        UpdaterError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for UpdaterError {
    fn from(err: serde_yaml::Error) -> Self {
        UpdaterError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for UpdaterError {
    fn from(err: url::ParseError) -> Self {
        UpdaterError::Url(err.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for UpdaterError {
    fn from(err: reqwest::Error) -> Self {
        UpdaterError::Transport(err.to_string())
    }
}

/// Result type alias for updater operations
pub type UpdaterResult<T> = Result<T, UpdaterError>;

impl UpdaterError {
    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a new parse error for a 1-based line number
    pub fn parse<S: Into<String>>(line: usize, message: S) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    /// Wrap a leg failure into an update error for `plugin`
    pub fn update<S: Into<String>>(plugin: S, source: UpdaterError) -> Self {
        Self::Update {
            plugin: plugin.into(),
            source: Box::new(source),
        }
    }

    /// Check if retrying the operation may succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            UpdaterError::Configuration(_) => false,
            UpdaterError::Parse { .. } => false,
            UpdaterError::Validation(_) => false,
            UpdaterError::Transport(_) => true,
            UpdaterError::Update { source, .. } => source.is_recoverable(),
            UpdaterError::Io(_) => true,
            UpdaterError::Serialization(_) => false,
            UpdaterError::Url(_) => false,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            UpdaterError::Configuration(_) => "configuration",
            UpdaterError::Parse { .. } => "parse",
            UpdaterError::Validation(_) => "validation",
            UpdaterError::Transport(_) => "transport",
            UpdaterError::Update { .. } => "update",
            UpdaterError::Io(_) => "io",
            UpdaterError::Serialization(_) => "serialization",
            UpdaterError::Url(_) => "configuration",
        }
    }
}
