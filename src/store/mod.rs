//! Registry store access
//!
//! This module defines the boundary between `regscope` and the hierarchical
//! configuration store it reads and writes. Everything above this module works
//! against the [`RegistryStore`] and [`RegistryNode`] traits; the concrete
//! backends are:
//!
//! - [`MemoryStore`]: an in-process tree used on every platform (tests, tooling)
//! - `WinRegStore`: the real Windows Registry via `winreg` (Windows only)
//!
//! # Values
//!
//! Raw registry data is decoded once, at this boundary, into the typed
//! [`RegistryValue`] variant. Callers never see registry type codes:
//!
//! | Registry type | `RegistryValue` |
//! |---|---|
//! | `REG_SZ`, `REG_EXPAND_SZ` | `Text` |
//! | `REG_DWORD`, `REG_QWORD` | `Numeric` (signed 64-bit) |
//! | anything else | `Other` (raw bytes) |
//!
//! # Handles
//!
//! Nodes are owned values. Dropping a node releases the underlying handle, so
//! every exit path (including `?` propagation) closes what it opened.

pub mod memory;

#[cfg(windows)]
pub mod windows;

pub use memory::{MemoryNode, MemoryStore};

#[cfg(windows)]
pub use self::windows::{WinRegNode, WinRegStore};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io;

/// Top-level registry root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hive {
    /// `HKEY_LOCAL_MACHINE`, shared by every user of the machine
    LocalMachine,
    /// `HKEY_CURRENT_USER`, the signed-in user's profile
    CurrentUser,
}

impl Hive {
    /// Short hive prefix used in log messages and error locations
    pub fn short_name(self) -> &'static str {
        match self {
            Hive::LocalMachine => "HKLM",
            Hive::CurrentUser => "HKCU",
        }
    }

    /// Format a hive-qualified location such as `HKLM\SOFTWARE\...`
    pub fn location(self, path: &str) -> String {
        format!("{}\\{}", self.short_name(), path)
    }
}

impl fmt::Display for Hive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Kind of a stored value, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// String data
    Text,
    /// Integer data
    Numeric,
    /// Binary, multi-string, or any other type
    Other,
}

/// A decoded registry value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryValue {
    /// `REG_SZ` / `REG_EXPAND_SZ` data (unexpanded)
    Text(String),
    /// `REG_DWORD` / `REG_QWORD` data, reinterpreted as signed 64-bit
    Numeric(i64),
    /// Raw bytes of any other registry type
    Other(Vec<u8>),
}

impl RegistryValue {
    /// Kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            RegistryValue::Text(_) => ValueKind::Text,
            RegistryValue::Numeric(_) => ValueKind::Numeric,
            RegistryValue::Other(_) => ValueKind::Other,
        }
    }

    /// Text payload, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RegistryValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for RegistryValue {
    fn from(value: &str) -> Self {
        RegistryValue::Text(value.to_string())
    }
}

impl From<String> for RegistryValue {
    fn from(value: String) -> Self {
        RegistryValue::Text(value)
    }
}

impl From<u32> for RegistryValue {
    fn from(value: u32) -> Self {
        RegistryValue::Numeric(i64::from(value))
    }
}

impl From<i64> for RegistryValue {
    fn from(value: i64) -> Self {
        RegistryValue::Numeric(value)
    }
}

/// A hierarchical configuration store with two roots
///
/// Implementations must be shareable across threads: every operation opens
/// its own node, so concurrent callers never share a handle.
pub trait RegistryStore: Send + Sync {
    /// Node type produced by this store
    type Node: RegistryNode;

    /// Open an existing key for reading
    ///
    /// Fails with `io::ErrorKind::NotFound` if the key does not exist.
    fn open_read_only(&self, hive: Hive, path: &str) -> io::Result<Self::Node>;

    /// Open a key for reading and writing, creating it if it does not exist
    fn open_read_write(&self, hive: Hive, path: &str) -> io::Result<Self::Node>;

    /// Open an existing key for reading and writing
    ///
    /// Fails with `io::ErrorKind::NotFound` if the key does not exist; nothing
    /// is created.
    fn open_existing_read_write(&self, hive: Hive, path: &str) -> io::Result<Self::Node>;
}

/// An open key within a [`RegistryStore`]
pub trait RegistryNode: Sized {
    /// Names of the direct sub-keys, in store enumeration order
    fn child_names(&self) -> io::Result<Vec<String>>;

    /// Open a direct sub-key with the same access rights as this node
    fn open_child(&self, name: &str) -> io::Result<Self>;

    /// Names of the values stored on this key, in store enumeration order
    fn value_names(&self) -> io::Result<Vec<String>>;

    /// Read a value, returning `Ok(None)` if it does not exist
    fn value(&self, name: &str) -> io::Result<Option<RegistryValue>>;

    /// Write a value, overwriting any existing value with the same name
    fn set_value(&self, name: &str, value: &RegistryValue) -> io::Result<()>;

    /// Delete a value, returning whether it existed
    fn delete_value(&self, name: &str) -> io::Result<bool>;

    /// Read a value, substituting `default` when it is missing or unreadable
    fn value_or(&self, name: &str, default: RegistryValue) -> RegistryValue {
        self.value(name).ok().flatten().unwrap_or(default)
    }

    /// Kind of a stored value, `None` if it does not exist
    fn value_kind(&self, name: &str) -> io::Result<Option<ValueKind>> {
        Ok(self.value(name)?.map(|v| v.kind()))
    }

    /// Read every value on this key into a map
    ///
    /// Values that disappear or fail to decode between enumeration and read
    /// are skipped.
    fn values(&self) -> io::Result<HashMap<String, RegistryValue>> {
        let names = self.value_names()?;
        let mut values = HashMap::with_capacity(names.len());
        for name in names {
            match self.value(&name) {
                Ok(Some(value)) => {
                    values.insert(name, value);
                }
                Ok(None) => {}
                Err(e) => tracing::debug!("Skipping unreadable value '{name}': {e}"),
            }
        }
        Ok(values)
    }
}

/// Store used by default on this platform
#[cfg(windows)]
pub type DefaultStore = WinRegStore;

/// Store used by default on this platform
#[cfg(not(windows))]
pub type DefaultStore = MemoryStore;
