//! Installed program enumeration, search, and uninstallation
//!
//! Reads the `...\CurrentVersion\Uninstall` keys. Listing and searching never
//! fail because one hive or view is unreadable: each (hive, path) attempt is
//! independent, and a failed attempt is logged and contributes nothing.
//!
//! # Search order
//!
//! Pattern searches try the 32-bit view before the 64-bit view, and within each
//! view `HKLM` before `HKCU`. The first sub-key whose name or `DisplayName`
//! contains the pattern (case-insensitively) wins.

use super::path::{Architecture, RegistryKind, ResolvedPath, Scope, key_path, resolve_path};
use super::record::{InstalledProgram, RecordParser, fields};
use crate::background::{BackgroundTask, run_in_background};
use crate::clock::{Clock, SystemClock};
use crate::config::SelectionDefaults;
use crate::error::{RegScopeError, Result};
use crate::process::{ProcessHandle, ProcessLauncher, SystemLauncher};
use crate::store::{DefaultStore, Hive, RegistryNode, RegistryStore, RegistryValue};
use std::io;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Views searched by pattern, in order
const SEARCH_VIEWS: [Architecture; 2] = [Architecture::Bits32, Architecture::Bits64];

/// Hives searched within each view, in order
const SEARCH_HIVES: [Hive; 2] = [Hive::LocalMachine, Hive::CurrentUser];

/// Access to installed-program records
///
/// Cloning is cheap and clones share the store, launcher, and clock.
pub struct InstalledProgramRegistry<S = DefaultStore, L = SystemLauncher, C = SystemClock> {
    store: Arc<S>,
    launcher: Arc<L>,
    parser: Arc<RecordParser<C>>,
    defaults: SelectionDefaults,
}

impl<S, L, C> Clone for InstalledProgramRegistry<S, L, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            launcher: Arc::clone(&self.launcher),
            parser: Arc::clone(&self.parser),
            defaults: self.defaults,
        }
    }
}

impl InstalledProgramRegistry {
    /// Registry over this platform's store, launching real processes
    pub fn system() -> Self {
        Self::new(DefaultStore::default(), SystemLauncher, SystemClock)
    }
}

impl<S, L, C> InstalledProgramRegistry<S, L, C>
where
    S: RegistryStore,
    L: ProcessLauncher,
    C: Clock,
{
    /// Create a registry from its collaborators
    pub fn new(store: S, launcher: L, clock: C) -> Self {
        Self {
            store: Arc::new(store),
            launcher: Arc::new(launcher),
            parser: Arc::new(RecordParser::with_clock(clock)),
            defaults: SelectionDefaults::default(),
        }
    }

    /// Use `defaults` for [`list_installed_default`](Self::list_installed_default)
    #[must_use]
    pub fn with_defaults(mut self, defaults: SelectionDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// All programs registered under one scope and view
    ///
    /// Sub-keys whose `DisplayName` is empty are skipped. Returns an empty list
    /// if the key cannot be read.
    pub fn list_installed(&self, scope: Scope, architecture: Architecture) -> Vec<InstalledProgram> {
        let resolved = resolve_path(scope, architecture, RegistryKind::Uninstall);
        match self.read_records(resolved) {
            Ok(programs) => {
                debug!(
                    "Read {} installed programs from {}",
                    programs.len(),
                    resolved.location()
                );
                programs
            }
            Err(e) => {
                log_attempt_failure(resolved, &e);
                Vec::new()
            }
        }
    }

    /// Programs under the configured default scope and view
    pub fn list_installed_default(&self) -> Vec<InstalledProgram> {
        self.list_installed(self.defaults.scope, self.defaults.architecture)
    }

    /// Programs from both hives and both views
    ///
    /// Order: `HKLM` 32-bit, `HKLM` 64-bit, `HKCU` 32-bit, `HKCU` 64-bit.
    pub fn list_all(&self) -> Vec<InstalledProgram> {
        [Scope::Machine, Scope::User]
            .into_iter()
            .flat_map(|scope| SEARCH_VIEWS.map(|architecture| (scope, architecture)))
            .flat_map(|(scope, architecture)| self.list_installed(scope, architecture))
            .collect()
    }

    /// First program whose key name or display name contains `pattern`
    ///
    /// Matching is case-insensitive. Fails with `InvalidArgument` if `pattern`
    /// is empty.
    pub fn find_by_name_pattern(&self, pattern: &str) -> Result<Option<InstalledProgram>> {
        let needle = normalize_pattern(pattern)?;

        for resolved in search_paths() {
            let found = self
                .locate(resolved, &needle)
                .and_then(|hit| match hit {
                    Some((key_name, node)) => {
                        let mut program = self.parser.parse(&node.values()?);
                        program.key_name = key_name;
                        Ok(Some(program))
                    }
                    None => Ok(None),
                });

            match found {
                Ok(Some(program)) => {
                    debug!(
                        "Pattern '{pattern}' matched '{}' in {}",
                        program.key_name,
                        resolved.location()
                    );
                    return Ok(Some(program));
                }
                Ok(None) => {}
                Err(e) => log_attempt_failure(resolved, &e),
            }
        }

        debug!("Pattern '{pattern}' matched no installed program");
        Ok(None)
    }

    /// Whether any program's key name or display name contains `pattern`
    pub fn is_installed(&self, pattern: &str) -> Result<bool> {
        let needle = normalize_pattern(pattern)?;

        Ok(search_paths().any(|resolved| match self.locate(resolved, &needle) {
            Ok(hit) => hit.is_some(),
            Err(e) => {
                log_attempt_failure(resolved, &e);
                false
            }
        }))
    }

    /// Run the program's uninstaller and block until it exits
    ///
    /// The exit code is not inspected. Fails with `InvalidArgument` if the
    /// record has no display name or no uninstall command.
    pub fn uninstall_and_wait(&self, program: &InstalledProgram) -> Result<()> {
        if program.display_name.is_empty() || program.uninstall_command.is_empty() {
            return Err(RegScopeError::InvalidArgument(
                "display name or uninstall command is empty".to_string(),
            ));
        }

        let command = program.uninstall_command.as_str();
        info!("Launching uninstaller for '{}': {command}", program.display_name);

        let launch_error = |source| RegScopeError::ProcessLaunch {
            command: command.to_string(),
            source,
        };
        let mut handle = self.launcher.spawn(command).map_err(launch_error)?;
        handle.wait_for_exit().map_err(launch_error)?;

        info!("Uninstaller for '{}' exited", program.display_name);
        Ok(())
    }

    /// Find a program by pattern, then run its uninstaller and wait
    ///
    /// Fails with `ProgramNotFound` if nothing matches.
    pub fn uninstall_by_pattern_and_wait(&self, pattern: &str) -> Result<()> {
        let program = self
            .find_by_name_pattern(pattern)?
            .ok_or_else(|| RegScopeError::ProgramNotFound(pattern.to_string()))?;
        self.uninstall_and_wait(&program)
    }

    /// [`uninstall_and_wait`](Self::uninstall_and_wait) on a background thread
    pub fn uninstall_in_background(&self, program: InstalledProgram) -> Result<BackgroundTask<()>>
    where
        S: 'static,
        L: 'static,
        C: 'static,
    {
        let registry = self.clone();
        run_in_background(move || registry.uninstall_and_wait(&program))
    }

    /// [`uninstall_by_pattern_and_wait`](Self::uninstall_by_pattern_and_wait) on a background thread
    pub fn uninstall_by_pattern_in_background(
        &self,
        pattern: impl Into<String>,
    ) -> Result<BackgroundTask<()>>
    where
        S: 'static,
        L: 'static,
        C: 'static,
    {
        let registry = self.clone();
        let pattern = pattern.into();
        run_in_background(move || registry.uninstall_by_pattern_and_wait(&pattern))
    }

    fn read_records(&self, resolved: ResolvedPath) -> io::Result<Vec<InstalledProgram>> {
        let parent = self.store.open_read_only(resolved.hive, resolved.path)?;
        let names = parent.child_names()?;
        let mut programs = Vec::with_capacity(names.len());

        for name in names {
            let values = match parent.open_child(&name).and_then(|child| child.values()) {
                Ok(values) => values,
                Err(e) => {
                    debug!("Skipping unreadable key '{name}' in {}: {e}", resolved.location());
                    continue;
                }
            };

            let mut program = self.parser.parse(&values);
            if program.display_name.is_empty() {
                continue;
            }
            program.key_name = name;
            programs.push(program);
        }

        Ok(programs)
    }

    /// Find the first sub-key matching `needle` (already lowercased)
    fn locate(&self, resolved: ResolvedPath, needle: &str) -> io::Result<Option<(String, S::Node)>> {
        let parent = self.store.open_read_only(resolved.hive, resolved.path)?;

        for name in parent.child_names()? {
            let child = match parent.open_child(&name) {
                Ok(child) => child,
                Err(e) => {
                    debug!("Skipping unreadable key '{name}' in {}: {e}", resolved.location());
                    continue;
                }
            };

            if contains_ignore_case(&name, needle)
                || contains_ignore_case(&display_name(&child), needle)
            {
                return Ok(Some((name, child)));
            }
        }

        Ok(None)
    }
}

/// Uninstall paths in search order
fn search_paths() -> impl Iterator<Item = ResolvedPath> {
    SEARCH_VIEWS.into_iter().flat_map(|architecture| {
        SEARCH_HIVES.map(|hive| ResolvedPath {
            hive,
            path: key_path(architecture, RegistryKind::Uninstall),
        })
    })
}

fn normalize_pattern(pattern: &str) -> Result<String> {
    if pattern.is_empty() {
        return Err(RegScopeError::InvalidArgument(
            "search pattern is empty".to_string(),
        ));
    }
    Ok(pattern.to_lowercase())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn display_name<N: RegistryNode>(node: &N) -> String {
    match node.value_or(fields::DISPLAY_NAME, RegistryValue::Text(String::new())) {
        RegistryValue::Text(text) => text,
        RegistryValue::Numeric(n) => n.to_string(),
        RegistryValue::Other(_) => String::new(),
    }
}

fn log_attempt_failure(resolved: ResolvedPath, error: &io::Error) {
    if error.kind() == io::ErrorKind::NotFound {
        debug!("{} does not exist", resolved.location());
    } else {
        warn!("Failed to read {}: {error}", resolved.location());
    }
}
