//! Error types for webfile
//!
//! Transfer failures never reach callers as errors: they collapse into the
//! boolean delivered to each callback. These types exist for the diagnostic
//! log, for configuration loading, and for the command-line front end.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of a single transfer
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Destination file could not be created or truncated
    #[error("Cannot open destination file {path}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// HTTP client could not be initialized
    #[error("Cannot initialize HTTP client: {reason}")]
    ClientInit { reason: String },

    /// Transport-level failure while talking to the server
    #[error("HTTP transfer failed")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server error: HTTP {status}")]
    ServerError { status: u16 },

    /// Invalid URL provided
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// I/O error while writing the response body
    #[error("File I/O error")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    /// Short label used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            DownloadError::FileOpen { .. } => "file_open",
            DownloadError::ClientInit { .. } => "client_init",
            DownloadError::Http(_)
            | DownloadError::ServerError { .. }
            | DownloadError::InvalidUrl { .. }
            | DownloadError::Io(_) => "transfer",
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Configuration file could not be read
    #[error("Failed to read configuration file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    /// Download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is transient
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Download(DownloadError::Http(_)) => true,
            AppError::Download(DownloadError::ServerError { status }) => *status >= 500,
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Download(_) => "download",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
