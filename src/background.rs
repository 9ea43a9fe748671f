//! Background execution of blocking operations
//!
//! Every registry and process call in this crate blocks. Callers that must not
//! block hand the call to [`run_in_background`] and keep the returned
//! [`BackgroundTask`], which they can poll or wait on later.
//!
//! ```no_run
//! use regscope::background::run_in_background;
//! use regscope::registry::{Architecture, InstalledProgramRegistry, Scope};
//!
//! let registry = InstalledProgramRegistry::system();
//! let task = run_in_background(move || {
//!     Ok(registry.list_installed(Scope::Machine, Architecture::Native))
//! })?;
//! // ... do other work ...
//! let programs = task.wait()?;
//! println!("{} programs installed", programs.len());
//! # Ok::<(), regscope::RegScopeError>(())
//! ```

use crate::error::{RegScopeError, Result};
use std::any::Any;
use std::thread::{self, JoinHandle};

const WORKER_NAME: &str = "regscope-worker";

/// Handle to an operation running on a background thread
///
/// Dropping the handle detaches the worker; the operation still runs to
/// completion.
#[derive(Debug)]
pub struct BackgroundTask<T> {
    handle: JoinHandle<Result<T>>,
}

impl<T> BackgroundTask<T> {
    /// Whether the operation has finished
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the operation finishes and return its result
    ///
    /// A panic inside the operation is reported as `RegScopeError::BackgroundTask`.
    pub fn wait(self) -> Result<T> {
        self.handle
            .join()
            .map_err(|payload| RegScopeError::BackgroundTask(panic_message(payload.as_ref())))?
    }
}

/// Run `operation` on a new worker thread
///
/// Fails only if the thread cannot be spawned.
pub fn run_in_background<T, F>(operation: F) -> Result<BackgroundTask<T>>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let handle = thread::Builder::new()
        .name(WORKER_NAME.to_string())
        .spawn(operation)
        .map_err(|e| {
            tracing::error!("Failed to spawn background worker: {e}");
            RegScopeError::BackgroundTask(format!("failed to spawn worker: {e}"))
        })?;
    Ok(BackgroundTask { handle })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_result_is_returned() {
        let task = run_in_background(|| Ok(21 * 2)).unwrap();
        assert_eq!(task.wait().unwrap(), 42);
    }

    #[test]
    fn test_error_is_propagated() {
        let task = run_in_background::<(), _>(|| {
            Err(RegScopeError::InvalidArgument("pattern is empty".to_string()))
        })
        .unwrap();
        assert!(matches!(task.wait(), Err(RegScopeError::InvalidArgument(_))));
    }

    #[test]
    fn test_panic_is_reported() {
        let task = run_in_background::<(), _>(|| panic!("boom")).unwrap();
        match task.wait() {
            Err(RegScopeError::BackgroundTask(message)) => assert_eq!(message, "boom"),
            other => panic!("expected BackgroundTask error, got {other:?}"),
        }
    }

    #[test]
    fn test_runs_off_caller_thread() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let task = run_in_background(move || {
            release_rx
                .recv_timeout(Duration::from_secs(5))
                .map_err(|e| RegScopeError::BackgroundTask(e.to_string()))?;
            Ok(thread::current().name().map(str::to_string))
        })
        .unwrap();

        // The worker is parked on the channel, so the caller was not blocked
        assert!(!task.is_finished());
        release_tx.send(()).unwrap();
        assert_eq!(task.wait().unwrap().as_deref(), Some(WORKER_NAME));
    }
}
