//! Concurrency tests
//!
//! Registries are shared across threads and used from background tasks while
//! other threads keep writing to the same store.

use parking_lot::Mutex;
use regscope::background::run_in_background;
use regscope::clock::SystemClock;
use regscope::process::{ProcessHandle, ProcessLauncher};
use regscope::registry::{Architecture, AutoLaunchRegistry, InstalledProgramRegistry, Scope};
use regscope::store::{Hive, MemoryStore};
use std::io;
use std::sync::{Arc, Barrier};
use std::thread;

const UNINSTALL_64: &str = "SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Uninstall";
const UNINSTALL_32: &str = "SOFTWARE\\WOW6432Node\\Microsoft\\Windows\\CurrentVersion\\Uninstall";
const RUN_64: &str = "SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Run";
const RUN_32: &str = "SOFTWARE\\WOW6432Node\\Microsoft\\Windows\\CurrentVersion\\Run";

/// Every concrete location with the hive and paths it resolves to
const LOCATIONS: [(Scope, Architecture, Hive, &str, &str); 4] = [
    (Scope::User, Architecture::Bits32, Hive::CurrentUser, UNINSTALL_32, RUN_32),
    (Scope::User, Architecture::Bits64, Hive::CurrentUser, UNINSTALL_64, RUN_64),
    (Scope::Machine, Architecture::Bits32, Hive::LocalMachine, UNINSTALL_32, RUN_32),
    (Scope::Machine, Architecture::Bits64, Hive::LocalMachine, UNINSTALL_64, RUN_64),
];

/// Launcher whose processes take a little while to exit
#[derive(Clone, Default)]
struct SlowLauncher {
    exited: Arc<Mutex<Vec<String>>>,
}

struct SlowProcess {
    command: String,
    exited: Arc<Mutex<Vec<String>>>,
}

impl ProcessLauncher for SlowLauncher {
    type Handle = SlowProcess;

    fn spawn(&self, command_line: &str) -> io::Result<SlowProcess> {
        Ok(SlowProcess {
            command: command_line.to_string(),
            exited: Arc::clone(&self.exited),
        })
    }
}

impl ProcessHandle for SlowProcess {
    fn wait_for_exit(&mut self) -> io::Result<()> {
        thread::sleep(std::time::Duration::from_millis(20));
        self.exited.lock().push(self.command.clone());
        Ok(())
    }
}

#[test]
fn test_parallel_autolaunch_writes() {
    let store = MemoryStore::new();
    let registry = AutoLaunchRegistry::new(store);
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = registry.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry
                    .enable(Scope::User, Architecture::Native, &format!("App{i}"), &format!("app{i}.exe"))
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut names: Vec<String> = registry
        .list_entries(Scope::User, Architecture::Native)
        .into_iter()
        .map(|e| e.name)
        .collect();
    names.sort();
    let expected: Vec<String> = (0..8).map(|i| format!("App{i}")).collect();
    assert_eq!(names, expected);
}

#[test]
fn test_parallel_listing_of_distinct_locations() {
    let store = MemoryStore::new();
    for (scope, architecture, hive, uninstall, run) in LOCATIONS {
        let tag = format!("{scope:?}-{architecture:?}");
        for i in 0..5 {
            let key = format!("{uninstall}\\{tag}-{i}");
            store.insert_value(hive, &key, "DisplayName", format!("{tag} program {i}"));
            store.insert_value(hive, run, &format!("{tag}-entry-{i}"), format!("{tag}-{i}.exe"));
        }
    }

    let installed = InstalledProgramRegistry::new(store.clone(), SlowLauncher::default(), SystemClock);
    let autolaunch = AutoLaunchRegistry::new(store);
    let barrier = Arc::new(Barrier::new(LOCATIONS.len() * 2));
    let mut handles = Vec::new();

    for (scope, architecture, ..) in LOCATIONS {
        let tag = format!("{scope:?}-{architecture:?}");
        let expected_programs: Vec<String> = (0..5).map(|i| format!("{tag}-{i}")).collect();
        let expected_entries: Vec<String> = (0..5).map(|i| format!("{tag}-entry-{i}")).collect();

        let installed = installed.clone();
        let barrier_for_programs = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier_for_programs.wait();
            for _ in 0..20 {
                let keys: Vec<String> = installed
                    .list_installed(scope, architecture)
                    .into_iter()
                    .map(|p| p.key_name)
                    .collect();
                assert_eq!(keys, expected_programs);
            }
        }));

        let autolaunch = autolaunch.clone();
        let barrier_for_entries = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier_for_entries.wait();
            for _ in 0..20 {
                let names: Vec<String> = autolaunch
                    .list_entries(scope, architecture)
                    .into_iter()
                    .map(|e| e.name)
                    .collect();
                assert_eq!(names, expected_entries);
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_listing_while_writer_runs() {
    let store = MemoryStore::new();
    let registry = InstalledProgramRegistry::new(store.clone(), SlowLauncher::default(), SystemClock);

    let writer = {
        let store = store.clone();
        thread::spawn(move || {
            for i in 0..50 {
                store.insert_value(
                    Hive::LocalMachine,
                    &format!("{UNINSTALL_64}\\App{i}"),
                    "DisplayName",
                    format!("Application {i}"),
                );
            }
        })
    };

    let reader = {
        let registry = registry.clone();
        thread::spawn(move || {
            let mut last = 0;
            for _ in 0..50 {
                let count = registry.list_installed(Scope::Machine, Architecture::Bits64).len();
                assert!(count >= last, "records never disappear");
                last = count;
            }
        })
    };

    writer.join().unwrap();
    reader.join().unwrap();
    assert_eq!(registry.list_installed(Scope::Machine, Architecture::Bits64).len(), 50);
}

#[test]
fn test_background_uninstalls_complete() {
    let store = MemoryStore::new();
    for name in ["Alpha", "Beta", "Gamma"] {
        let path = format!("{UNINSTALL_64}\\{name}");
        store.insert_value(Hive::CurrentUser, &path, "DisplayName", name);
        store.insert_value(Hive::CurrentUser, &path, "UninstallString", format!("{name}-uninstall.exe"));
    }
    let launcher = SlowLauncher::default();
    let registry = InstalledProgramRegistry::new(store, launcher.clone(), SystemClock);

    let tasks: Vec<_> = ["alpha", "beta", "gamma"]
        .into_iter()
        .map(|pattern| registry.uninstall_by_pattern_in_background(pattern).unwrap())
        .collect();
    for task in tasks {
        task.wait().unwrap();
    }

    let mut exited = launcher.exited.lock().clone();
    exited.sort();
    assert_eq!(
        exited,
        vec!["Alpha-uninstall.exe", "Beta-uninstall.exe", "Gamma-uninstall.exe"]
    );
}

#[test]
fn test_background_record_uninstall() {
    let store = MemoryStore::new();
    let path = format!("{UNINSTALL_64}\\Tool");
    store.insert_value(Hive::LocalMachine, &path, "DisplayName", "Tool");
    store.insert_value(Hive::LocalMachine, &path, "UninstallString", "tool.exe /remove");
    let launcher = SlowLauncher::default();
    let registry = InstalledProgramRegistry::new(store, launcher.clone(), SystemClock);

    let program = registry.find_by_name_pattern("tool").unwrap().unwrap();
    let task = registry.uninstall_in_background(program).unwrap();
    task.wait().unwrap();
    assert_eq!(*launcher.exited.lock(), vec!["tool.exe /remove".to_string()]);
}

#[test]
fn test_background_listing() {
    let store = MemoryStore::new();
    store.insert_value(Hive::CurrentUser, &format!("{UNINSTALL_64}\\App"), "DisplayName", "App");
    let registry = InstalledProgramRegistry::new(store, SlowLauncher::default(), SystemClock);

    let task = {
        let registry = registry.clone();
        run_in_background(move || Ok(registry.list_all())).unwrap()
    };
    let programs = task.wait().unwrap();
    assert_eq!(programs.len(), 1);
    assert_eq!(programs[0].key_name, "App");
}
