//! Process-exit hook.
//!
//! Integrators register cleanup (typically final unsubscribe calls) with
//! [`ApplicationExit::on_exit`]; the application fires the hook once when it
//! terminates normally, usually by holding an [`ExitGuard`] in `main`.
//!
//! Abnormal termination (`std::process::exit`, `abort`, a panic with
//! `panic = "abort"`, a killed process) does not run destructors, so the hook
//! is not guaranteed to fire in those cases.

use std::panic::AssertUnwindSafe;
use std::sync::{Mutex, OnceLock};

type ExitCallback = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct ExitState {
    fired: bool,
    callbacks: Vec<ExitCallback>,
}

/// Callbacks run exactly once at application exit, in registration order.
#[derive(Default)]
pub struct ApplicationExit {
    state: Mutex<ExitState>,
}

impl ApplicationExit {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide exit hook.
    pub fn global() -> &'static ApplicationExit {
        static GLOBAL: OnceLock<ApplicationExit> = OnceLock::new();
        GLOBAL.get_or_init(ApplicationExit::new)
    }

    /// Register a callback.
    ///
    /// If the hook already fired, the callback runs immediately on the calling
    /// thread, so late registrations still get their cleanup.
    pub fn on_exit<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
            if !state.fired {
                state.callbacks.push(Box::new(callback));
                return;
            }
        }
        run_callback(Box::new(callback));
    }

    /// Run every registered callback. Only the first call does anything.
    ///
    /// Returns the number of callbacks run.
    pub fn fire(&self) -> usize {
        let callbacks = {
            let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
            if state.fired {
                return 0;
            }
            state.fired = true;
            std::mem::take(&mut state.callbacks)
        };

        tracing::debug!(callbacks = callbacks.len(), "application exit");
        let count = callbacks.len();
        for callback in callbacks {
            run_callback(callback);
        }
        count
    }

    pub fn has_fired(&self) -> bool {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).fired
    }

    /// Number of callbacks waiting for the hook to fire.
    pub fn pending(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .callbacks
            .len()
    }

    /// Guard that fires this hook when dropped.
    pub fn guard(&self) -> ExitGuard<'_> {
        ExitGuard { exit: self }
    }
}

impl core::fmt::Debug for ApplicationExit {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApplicationExit")
            .field("fired", &self.has_fired())
            .field("pending", &self.pending())
            .finish()
    }
}

// A panicking callback must not prevent the remaining ones from running.
fn run_callback(callback: ExitCallback) {
    if std::panic::catch_unwind(AssertUnwindSafe(callback)).is_err() {
        tracing::error!("application exit callback panicked");
    }
}

/// Fires its [`ApplicationExit`] when dropped.
#[must_use = "the exit hook fires when the guard is dropped"]
#[derive(Debug)]
pub struct ExitGuard<'a> {
    exit: &'a ApplicationExit,
}

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        self.exit.fire();
    }
}
