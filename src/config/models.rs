//! Configuration data models
//!
//! This module defines the data structures used for `regscope` configuration.
//! Every section is optional in the JSON file; missing fields take the
//! defaults below.

use crate::registry::{Architecture, Scope};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegScopeConfig {
    /// Selection used when a caller omits scope or architecture
    pub defaults: SelectionDefaults,
    /// Log output settings
    pub logging: LoggingConfig,
}

/// Scope and architecture applied by the convenience entry points
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionDefaults {
    /// Defaults to the current user
    pub scope: Scope,
    /// Defaults to the native view
    pub architecture: Architecture,
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set (e.g. "info", "regscope=debug")
    pub level: String,
    /// Directory for log files; `%APPDATA%\regscope` when unset
    pub directory: Option<PathBuf>,
    /// Number of previous session logs to keep
    pub max_files: u8,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            max_files: 9,
        }
    }
}
