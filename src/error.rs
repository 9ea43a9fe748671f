//! Error types for `regscope`
//!
//! This module defines all error types used throughout the crate,
//! providing clear error messages and proper error propagation.
//!
//! Store and process failures keep their underlying `std::io::Error` as a
//! `#[source]` so the full chain stays visible to callers and in logs.

use thiserror::Error;

/// Simple error type for wrapping string messages while implementing `std::error::Error`
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StringError(pub String);

impl StringError {
    /// Create a new `StringError` from a string message
    pub fn new(msg: impl Into<String>) -> Box<Self> {
        Box::new(Self(msg.into()))
    }
}

/// Main error type for `regscope`
#[derive(Debug, Error)]
pub enum RegScopeError {
    /// A required argument was empty or missing
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No installed program matched the search pattern
    #[error("Program '{0}' not found")]
    ProgramNotFound(String),

    /// Registry store access failed at the given location
    #[error("Registry access failed at {location}: {source}")]
    StoreAccess {
        /// Hive-qualified key path, e.g. `HKCU\SOFTWARE\...\Run`
        location: String,
        /// Underlying store error
        #[source]
        source: std::io::Error,
    },

    /// The uninstaller process could not be started or waited on
    #[error("Failed to run '{command}': {source}")]
    ProcessLaunch {
        /// Command line that was being launched
        command: String,
        /// Underlying process error
        #[source]
        source: std::io::Error,
    },

    /// A background worker panicked or could not be spawned
    #[error("Background task failed: {0}")]
    BackgroundTask(String),

    /// Configuration error
    /// Preserves the underlying error source for full error chain transparency
    #[error("Configuration error: {0}")]
    ConfigError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl RegScopeError {
    /// Wrap a store error with the location it occurred at
    pub fn store(location: impl Into<String>, source: std::io::Error) -> Self {
        Self::StoreAccess {
            location: location.into(),
            source,
        }
    }

    /// Whether this is a store error caused by a missing key or value
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::StoreAccess { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

/// Result type alias for `regscope` operations
pub type Result<T> = std::result::Result<T, RegScopeError>;

/// Convert an error to a user-friendly message
///
/// Returns a message suitable for showing to end users, with a short
/// troubleshooting hint where one applies.
pub fn get_user_friendly_error(error: &RegScopeError) -> String {
    match error {
        RegScopeError::InvalidArgument(detail) => {
            format!("The request was incomplete:\n\n{detail}")
        }
        RegScopeError::ProgramNotFound(pattern) => {
            format!(
                "No installed program matches '{pattern}'.\n\n\
                 It may already have been uninstalled."
            )
        }
        RegScopeError::StoreAccess { location, source } => {
            if source.kind() == std::io::ErrorKind::PermissionDenied {
                format!(
                    "Access to the registry key was denied:\n\n{location}\n\n\
                     Machine-wide settings require running as administrator."
                )
            } else {
                format!(
                    "The registry key could not be accessed:\n\n{location}\n\n{source}"
                )
            }
        }
        RegScopeError::ProcessLaunch { command, source } => {
            format!(
                "The uninstaller could not be started:\n\n{command}\n\n{source}\n\n\
                 The program's uninstall entry may be stale."
            )
        }
        RegScopeError::BackgroundTask(detail) => {
            format!("A background operation failed unexpectedly:\n\n{detail}")
        }
        RegScopeError::ConfigError(_) => "Failed to load or save configuration.\n\n\
             Your settings may not persist.\n\
             Check that you have write permissions to:\n\
             %APPDATA%\\regscope"
            .to_string(),
        RegScopeError::IoError(e) => {
            format!(
                "A file system error occurred:\n\n{e}\n\n\
                 Please check file permissions and disk space."
            )
        }
        RegScopeError::JsonError(e) => {
            format!(
                "Configuration file is corrupted:\n\n{e}\n\n\
                 Default settings will be used."
            )
        }
    }
}
