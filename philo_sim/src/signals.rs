//! Interrupt handling for the launcher.

use crate::error::SimError;
use philo_core::StopFlag;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::sync::Arc;
use std::thread;
use tracing::warn;

/// Signals that end a run as interrupted rather than failed.
const INTERRUPTS: [i32; 2] = [SIGINT, SIGTERM];

/// Routes SIGINT and SIGTERM to `stop` from a dedicated thread.
///
/// Only the launcher installs this. Philosopher processes keep the default
/// disposition and are reaped by the launcher either way.
pub fn install(stop: Arc<StopFlag>) -> Result<(), SimError> {
    let mut signals = Signals::new(INTERRUPTS).map_err(SimError::Signal)?;
    thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                warn!(signal, "interrupted, stopping the simulation");
                stop.trigger();
            }
        })
        .map_err(SimError::Signal)?;
    Ok(())
}

/// True if a child was killed by an interrupt. Ctrl-C reaches the whole
/// process group, so children can die of it before the launcher's own
/// handler runs.
pub fn interrupted(status: &ExitStatus) -> bool {
    status
        .signal()
        .is_some_and(|signal| INTERRUPTS.contains(&signal))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_statuses() {
        assert!(interrupted(&ExitStatus::from_raw(SIGINT)));
        assert!(interrupted(&ExitStatus::from_raw(SIGTERM)));
        assert!(!interrupted(&ExitStatus::from_raw(libc::SIGKILL)));
        // Normal exit with code 1.
        assert!(!interrupted(&ExitStatus::from_raw(1 << 8)));
    }
}
