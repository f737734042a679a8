//! Error types and handling for the CLI
//!
//! Carrier failures arrive as [`ShippingError`] and keep their canonical
//! kind all the way to the process exit code.

use carrierlink_core::{ErrorKind, ShippingError};
use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error reported by a carrier adapter
    #[error("{0}")]
    Shipping(#[from] ShippingError),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Invalid file format
    #[error("Invalid file format for {}: expected {} format", path.display(), expected)]
    InvalidFormat { path: PathBuf, expected: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// An advisory operation (test-connection, cancel) reported `success: false`
    #[error("{operation} failed: {message}")]
    OperationFailed { operation: String, message: String },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML deserialization error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    pub fn operation_failed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::OperationFailed { .. } => 1,
            Self::Shipping(err) => shipping_exit_code(err.kind),
            Self::FileNotFound { .. } => 3,
            Self::InvalidFormat { .. } => 4,
            Self::Config(_) => 5,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::Toml(_) => 14,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::Shipping(err) if err.kind == ErrorKind::ConfigError)
    }
}

/// Exit code for each canonical carrier error kind
fn shipping_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::ConfigError => 5,
        ErrorKind::AuthError => 20,
        ErrorKind::RateError => 21,
        ErrorKind::CreateError => 22,
        ErrorKind::TrackError => 23,
        ErrorKind::NotFound => 24,
        ErrorKind::NotImplemented => 25,
        ErrorKind::Transient => 26,
        ErrorKind::Unknown => 2,
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    use colored::Colorize;

    let mut rendered = if use_color {
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    };

    if let Error::Shipping(err) = error {
        if err.retryable {
            let hint = "The failure is transient; retrying later may succeed.";
            rendered.push('\n');
            if use_color {
                rendered.push_str(&hint.yellow().to_string());
            } else {
                rendered.push_str(hint);
            }
        }
    }

    rendered
}
