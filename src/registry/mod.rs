//! Registry views used by `regscope`
//!
//! This module contains:
//! - Path selection for the Run and Uninstall keys
//! - Parsing of uninstall records into [`InstalledProgram`]
//! - [`AutoLaunchRegistry`] for logon entries
//! - [`InstalledProgramRegistry`] for enumeration, search, and uninstallation

pub mod autolaunch;
pub mod installed;
pub mod path;
pub mod record;

pub use autolaunch::{AutoLaunchEntry, AutoLaunchRegistry};
pub use installed::InstalledProgramRegistry;
pub use path::{Architecture, RegistryKind, ResolvedPath, Scope, key_path, resolve_path};
pub use record::{InstalledProgram, RecordParser};
