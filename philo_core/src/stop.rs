//! The single shared terminal-state signal.

use std::sync::atomic::{AtomicBool, Ordering};

/// Write-once stop flag.
///
/// Set by whichever component first detects the terminal condition and
/// never cleared. Readers use acquire ordering, so everything written before
/// the winning `trigger` is visible to anyone who observes it.
#[derive(Debug, Default)]
pub struct StopFlag {
    stopped: AtomicBool,
}

impl StopFlag {
    /// Creates a flag in the running state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once the flag has been triggered.
    pub fn observe(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Sets the flag. Returns true only for the call that actually set it.
    pub fn trigger(&self) -> bool {
        self.stopped
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Triggers the flag if dropped while the owning thread is unwinding.
pub struct StopOnPanic<'a>(pub &'a StopFlag);

impl Drop for StopOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.trigger();
        }
    }
}
