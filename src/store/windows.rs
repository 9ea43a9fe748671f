//! Windows Registry store backed by `winreg`
//!
//! Keys are opened with plain `KEY_READ` / `KEY_READ | KEY_WRITE` access. No
//! `KEY_WOW64_*` flags are passed: the 32-bit view is selected by addressing the
//! `WOW6432Node` path explicitly, so the same path string resolves identically
//! from 32-bit and 64-bit builds.

use super::{Hive, RegistryNode, RegistryStore, RegistryValue};
use std::io;
use winreg::enums::{
    HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, KEY_READ, KEY_WRITE, REG_BINARY, REG_DWORD,
    REG_EXPAND_SZ, REG_QWORD, REG_SZ,
};
use winreg::types::FromRegValue;
use winreg::{RegKey, RegValue};

/// The live Windows Registry
#[derive(Debug, Clone, Copy, Default)]
pub struct WinRegStore;

impl WinRegStore {
    /// Create a handle to the live registry
    pub fn new() -> Self {
        Self
    }

    fn root(hive: Hive) -> RegKey {
        match hive {
            Hive::LocalMachine => RegKey::predef(HKEY_LOCAL_MACHINE),
            Hive::CurrentUser => RegKey::predef(HKEY_CURRENT_USER),
        }
    }
}

impl RegistryStore for WinRegStore {
    type Node = WinRegNode;

    fn open_read_only(&self, hive: Hive, path: &str) -> io::Result<WinRegNode> {
        let key = Self::root(hive).open_subkey_with_flags(path, KEY_READ)?;
        Ok(WinRegNode {
            key,
            writable: false,
        })
    }

    fn open_read_write(&self, hive: Hive, path: &str) -> io::Result<WinRegNode> {
        let (key, _disposition) =
            Self::root(hive).create_subkey_with_flags(path, KEY_READ | KEY_WRITE)?;
        Ok(WinRegNode {
            key,
            writable: true,
        })
    }

    fn open_existing_read_write(&self, hive: Hive, path: &str) -> io::Result<WinRegNode> {
        let key = Self::root(hive).open_subkey_with_flags(path, KEY_READ | KEY_WRITE)?;
        Ok(WinRegNode {
            key,
            writable: true,
        })
    }
}

/// Open registry key; the handle is closed when the node is dropped
#[derive(Debug)]
pub struct WinRegNode {
    key: RegKey,
    writable: bool,
}

fn decode(raw: &RegValue) -> io::Result<RegistryValue> {
    match raw.vtype {
        REG_SZ | REG_EXPAND_SZ => Ok(RegistryValue::Text(String::from_reg_value(raw)?)),
        // DWORDs are signed 32-bit, as other registry readers report them
        REG_DWORD => Ok(RegistryValue::Numeric(i64::from(
            u32::from_reg_value(raw)?.cast_signed(),
        ))),
        REG_QWORD => {
            let bytes: [u8; 8] = raw.bytes[..].try_into().map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidData, "malformed REG_QWORD value")
            })?;
            Ok(RegistryValue::Numeric(i64::from_le_bytes(bytes)))
        }
        _ => Ok(RegistryValue::Other(raw.bytes[..].to_vec())),
    }
}

impl RegistryNode for WinRegNode {
    fn child_names(&self) -> io::Result<Vec<String>> {
        self.key.enum_keys().collect()
    }

    fn open_child(&self, name: &str) -> io::Result<Self> {
        let flags = if self.writable {
            KEY_READ | KEY_WRITE
        } else {
            KEY_READ
        };
        let key = self.key.open_subkey_with_flags(name, flags)?;
        Ok(WinRegNode {
            key,
            writable: self.writable,
        })
    }

    fn value_names(&self) -> io::Result<Vec<String>> {
        self.key
            .enum_values()
            .map(|entry| entry.map(|(name, _)| name))
            .collect()
    }

    fn value(&self, name: &str) -> io::Result<Option<RegistryValue>> {
        match self.key.get_raw_value(name) {
            Ok(raw) => decode(&raw).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set_value(&self, name: &str, value: &RegistryValue) -> io::Result<()> {
        match value {
            RegistryValue::Text(text) => self.key.set_value(name, text),
            RegistryValue::Numeric(n) => match i32::try_from(*n) {
                Ok(dword) => self.key.set_value(name, &dword.cast_unsigned()),
                Err(_) => {
                    let raw = RegValue {
                        bytes: n.to_le_bytes().to_vec().into(),
                        vtype: REG_QWORD,
                    };
                    self.key.set_raw_value(name, &raw)
                }
            },
            RegistryValue::Other(bytes) => {
                let raw = RegValue {
                    bytes: bytes.clone().into(),
                    vtype: REG_BINARY,
                };
                self.key.set_raw_value(name, &raw)
            }
        }
    }

    fn delete_value(&self, name: &str) -> io::Result<bool> {
        match self.key.delete_value(name) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}
