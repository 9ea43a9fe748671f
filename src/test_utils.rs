#![expect(
    clippy::unwrap_used,
    reason = "Test utilities use .unwrap() for brevity"
)]

//! Shared test utilities for `regscope` unit tests.
//!
//! Provides store seeding, a launcher that records instead of spawning, a fixed
//! clock instant, and an APPDATA guard. Only compiled during testing.

use crate::process::{ProcessHandle, ProcessLauncher};
use crate::registry::record::fields;
use crate::store::{Hive, MemoryStore};
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use tempfile::TempDir;

/// Serializes tests that modify the APPDATA environment variable.
static APPDATA_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Instant returned by test clocks: 2024-03-15 12:00:00
pub fn fixed_instant() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

/// Create an uninstall record `{path}\{key}` with a display name and, when
/// non-empty, an uninstall command.
pub fn seed_program(
    store: &MemoryStore,
    hive: Hive,
    path: &str,
    key: &str,
    display_name: &str,
    uninstall_command: &str,
) {
    let record_path = format!("{path}\\{key}");
    store.insert_value(hive, &record_path, fields::DISPLAY_NAME, display_name);
    if !uninstall_command.is_empty() {
        store.insert_value(hive, &record_path, fields::UNINSTALL_STRING, uninstall_command);
    }
}

#[derive(Debug, Default)]
struct Recording {
    launched: Vec<String>,
    waited: usize,
    fail_spawns: bool,
}

/// Launcher that records command lines instead of starting processes.
///
/// Clones share one recording.
#[derive(Debug, Clone, Default)]
pub struct RecordingLauncher {
    recording: Arc<Mutex<Recording>>,
}

impl RecordingLauncher {
    /// Command lines passed to `spawn`, in order
    pub fn launched(&self) -> Vec<String> {
        self.recording.lock().launched.clone()
    }

    /// Number of completed waits
    pub fn waited(&self) -> usize {
        self.recording.lock().waited
    }

    /// Make every later `spawn` fail with `NotFound`
    pub fn fail_spawns(&self) {
        self.recording.lock().fail_spawns = true;
    }
}

/// Handle returned by [`RecordingLauncher`]
#[derive(Debug)]
pub struct RecordedProcess {
    recording: Arc<Mutex<Recording>>,
}

impl ProcessLauncher for RecordingLauncher {
    type Handle = RecordedProcess;

    fn spawn(&self, command_line: &str) -> io::Result<RecordedProcess> {
        let mut recording = self.recording.lock();
        if recording.fail_spawns {
            return Err(io::Error::new(io::ErrorKind::NotFound, "program not found"));
        }
        recording.launched.push(command_line.to_string());
        Ok(RecordedProcess {
            recording: Arc::clone(&self.recording),
        })
    }
}

impl ProcessHandle for RecordedProcess {
    fn wait_for_exit(&mut self) -> io::Result<()> {
        self.recording.lock().waited += 1;
        Ok(())
    }
}

/// Create a temporary test directory that is removed on drop.
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// RAII guard that points APPDATA at a temp directory for a test scope and
/// restores the original value when dropped.
///
/// The guard holds `APPDATA_LOCK` for its lifetime, so tests that change
/// APPDATA run one at a time.
pub struct AppdataGuard {
    original: Option<String>,
    _lock: std::sync::MutexGuard<'static, ()>,
}

#[expect(
    unsafe_code,
    reason = "Test-only environment mutation serialized by APPDATA_LOCK"
)]
impl AppdataGuard {
    /// Set APPDATA to `temp_dir` until the guard is dropped.
    pub fn new(temp_dir: &TempDir) -> Self {
        let lock = APPDATA_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let original = std::env::var("APPDATA").ok();
        // SAFETY: APPDATA_LOCK is held, and only tests holding it touch APPDATA
        unsafe {
            std::env::set_var("APPDATA", temp_dir.path());
        }
        Self {
            original,
            _lock: lock,
        }
    }
}

#[expect(
    unsafe_code,
    reason = "Test-only environment mutation serialized by APPDATA_LOCK"
)]
impl Drop for AppdataGuard {
    fn drop(&mut self) {
        // SAFETY: the lock is still held until this guard's fields drop
        unsafe {
            match &self.original {
                Some(original) => std::env::set_var("APPDATA", original),
                None => std::env::remove_var("APPDATA"),
            }
        }
    }
}
