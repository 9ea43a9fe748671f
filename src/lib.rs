//! `regscope` - Windows auto-launch and installed-program registry access
//!
//! Reads and writes the `Run` keys that start applications at logon, and
//! enumerates, searches, and uninstalls programs registered under the
//! `Uninstall` keys. Both hives (`HKLM`, `HKCU`) and both registry views
//! (32-bit `WOW6432Node`, 64-bit native) are addressable.
//!
//! All registry access goes through the [`store::RegistryStore`] trait. On
//! Windows [`store::DefaultStore`] is the real registry; elsewhere, and in
//! tests, [`store::MemoryStore`] stands in.
//!
//! ```no_run
//! use regscope::registry::{Architecture, AutoLaunchRegistry, InstalledProgramRegistry, Scope};
//!
//! let autolaunch = AutoLaunchRegistry::system();
//! autolaunch.enable(Scope::User, Architecture::Native, "Sync", r"C:\Sync\sync.exe")?;
//!
//! let programs = InstalledProgramRegistry::system();
//! if let Some(program) = programs.find_by_name_pattern("7-Zip")? {
//!     println!("{} {}", program.display_name, program.display_version);
//! }
//! # Ok::<(), regscope::RegScopeError>(())
//! ```

// Module declarations
pub mod background;
pub mod clock;
pub mod config;
pub mod error;
pub mod process;
pub mod registry;
pub mod store;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export commonly used types
pub use error::{RegScopeError, Result};
pub use registry::{
    Architecture, AutoLaunchEntry, AutoLaunchRegistry, InstalledProgram, InstalledProgramRegistry,
    Scope,
};
