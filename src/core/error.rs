//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Malformed or invalid channel configuration
    #[error("Invalid logger configuration: {message}")]
    Config { message: String },

    /// Channel could not be resolved into a handler
    #[error("Failed to resolve channel '{channel}': {message}")]
    Resolver { channel: String, message: String },

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML configuration parse error
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Handler construction or write error
    #[error("Handler error ({handler}): {message}")]
    HandlerError { handler: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// File lock error
    #[error("Failed to acquire file lock on '{path}'")]
    FileLockError { path: String },

    /// Formatter error with format type
    #[error("Formatter error ({format_type}): {message}")]
    FormatterError {
        format_type: String,
        message: String,
    },
}

impl LoggerError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        LoggerError::Config {
            message: message.into(),
        }
    }

    /// Create a resolver error for the given channel
    pub fn resolver(channel: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Resolver {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a handler error
    pub fn handler(handler: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::HandlerError {
            handler: handler.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotationError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file lock error
    pub fn file_lock(path: impl Into<String>) -> Self {
        LoggerError::FileLockError { path: path.into() }
    }

    /// Create a formatter error
    pub fn formatter(format_type: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FormatterError {
            format_type: format_type.into(),
            message: message.into(),
        }
    }

    /// Whether this error was raised while loading or sanitizing configuration
    pub fn is_config(&self) -> bool {
        matches!(self, LoggerError::Config { .. } | LoggerError::TomlError(_))
    }

    /// Whether this error was raised while resolving or building a channel
    pub fn is_resolver(&self) -> bool {
        matches!(self, LoggerError::Resolver { .. })
    }
}
