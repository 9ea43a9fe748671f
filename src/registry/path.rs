//! Registry path selection
//!
//! Maps a (scope, architecture, kind) triple to the hive and key path that holds
//! the matching records. The 32-bit view lives under `WOW6432Node`; the native
//! view is the same as the 64-bit one.

use crate::store::Hive;
use serde::{Deserialize, Serialize};

const RUN_32: &str = "SOFTWARE\\WOW6432Node\\Microsoft\\Windows\\CurrentVersion\\Run";
const RUN_64: &str = "SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Run";
const UNINSTALL_32: &str = "SOFTWARE\\WOW6432Node\\Microsoft\\Windows\\CurrentVersion\\Uninstall";
const UNINSTALL_64: &str = "SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Uninstall";

/// Whose configuration to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Scope {
    /// The signed-in user only
    #[default]
    User,
    /// Every user on the machine
    Machine,
}

impl Scope {
    /// Registry hive holding this scope's configuration
    pub fn hive(self) -> Hive {
        match self {
            Scope::User => Hive::CurrentUser,
            Scope::Machine => Hive::LocalMachine,
        }
    }
}

/// Which registry view to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Architecture {
    /// 32-bit view (`WOW6432Node`)
    Bits32,
    /// 64-bit view
    Bits64,
    /// Default, non-redirected view (same as `Bits64`)
    #[default]
    Native,
}

/// Which family of records a path holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryKind {
    /// `...\CurrentVersion\Run` values
    AutoLaunch,
    /// `...\CurrentVersion\Uninstall` sub-keys
    Uninstall,
}

/// A concrete hive and key path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedPath {
    /// Registry root
    pub hive: Hive,
    /// Key path below the root
    pub path: &'static str,
}

impl ResolvedPath {
    /// Hive-qualified location, e.g. `HKCU\SOFTWARE\...\Run`
    pub fn location(&self) -> String {
        self.hive.location(self.path)
    }
}

/// Key path for a kind of record in the given view
pub fn key_path(architecture: Architecture, kind: RegistryKind) -> &'static str {
    match (kind, architecture) {
        (RegistryKind::AutoLaunch, Architecture::Bits32) => RUN_32,
        (RegistryKind::AutoLaunch, Architecture::Bits64 | Architecture::Native) => RUN_64,
        (RegistryKind::Uninstall, Architecture::Bits32) => UNINSTALL_32,
        (RegistryKind::Uninstall, Architecture::Bits64 | Architecture::Native) => UNINSTALL_64,
    }
}

/// Resolve a scope and view to the hive and key path for `kind`
pub fn resolve_path(scope: Scope, architecture: Architecture, kind: RegistryKind) -> ResolvedPath {
    ResolvedPath {
        hive: scope.hive(),
        path: key_path(architecture, kind),
    }
}
