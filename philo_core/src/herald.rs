//! Serialized state announcements.
//!
//! Every line has the form `<elapsed_ms> <id> <event>`. Lines never
//! interleave, and once the stop flag is observed only the death line may
//! still be written.

use crate::error::CoreError;
use crate::philosopher::PhilosopherId;
use crate::stop::StopFlag;
use philo_env::{Clock, CountingSemaphore};
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::Duration;

/// A state transition worth announcing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    TakenFork,
    Eating,
    Sleeping,
    Thinking,
    Died,
}

impl Event {
    /// The exact text printed after the philosopher id.
    pub fn message(&self) -> &'static str {
        match self {
            Event::TakenFork => "has taken a fork",
            Event::Eating => "is eating",
            Event::Sleeping => "is sleeping",
            Event::Thinking => "is thinking",
            Event::Died => "died",
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Announces philosopher state to the event log.
pub trait Herald: Send + Sync {
    /// Writes `event` for `who`, timestamped now. Silently skipped once the
    /// stop flag is set; returns whether the line was written.
    fn proclaim(&self, who: PhilosopherId, event: Event) -> Result<bool, CoreError>;

    /// Sets the stop flag and writes the death of `who`, detected at clock
    /// reading `at`. Always written; nothing follows it.
    fn proclaim_death(&self, who: PhilosopherId, at: Duration) -> Result<(), CoreError>;
}

fn write_line<W: Write>(
    sink: &mut W,
    elapsed: Duration,
    who: PhilosopherId,
    event: Event,
) -> Result<(), CoreError> {
    writeln!(sink, "{} {} {}", elapsed.as_millis(), who, event)?;
    sink.flush()?;
    Ok(())
}

/// Herald for the shared-memory model: one lock over the sink.
pub struct ConsoleHerald<C, W> {
    clock: C,
    sink: Mutex<W>,
    stop: Arc<StopFlag>,

    /// Simulation start, fixed once by [`ConsoleHerald::open`]
    epoch: OnceLock<Duration>,
}

impl<C: Clock, W: Write + Send> ConsoleHerald<C, W> {
    pub fn new(clock: C, sink: W, stop: Arc<StopFlag>) -> Self {
        Self {
            clock,
            sink: Mutex::new(sink),
            stop,
            epoch: OnceLock::new(),
        }
    }

    /// Fixes the timestamp origin. Later calls are ignored.
    pub fn open(&self, start: Duration) {
        let _ = self.epoch.set(start);
    }

    fn elapsed(&self, at: Duration) -> Duration {
        at.saturating_sub(self.epoch.get().copied().unwrap_or_default())
    }

    fn lock(&self) -> Result<MutexGuard<'_, W>, CoreError> {
        self.sink.lock().map_err(|_| CoreError::Poisoned("console"))
    }
}

impl<C: Clock, W: Write + Send> Herald for ConsoleHerald<C, W> {
    fn proclaim(&self, who: PhilosopherId, event: Event) -> Result<bool, CoreError> {
        let mut sink = self.lock()?;
        if self.stop.observe() {
            return Ok(false);
        }
        // Read the clock under the lock so timestamps never go backwards.
        let elapsed = self.elapsed(self.clock.now());
        write_line(&mut *sink, elapsed, who, event)?;
        Ok(true)
    }

    fn proclaim_death(&self, who: PhilosopherId, at: Duration) -> Result<(), CoreError> {
        let mut sink = self.lock()?;
        self.stop.trigger();
        write_line(&mut *sink, self.elapsed(at), who, Event::Died)
    }
}

/// Herald for the isolated-memory model.
///
/// Lines from every process are serialized through the shared print
/// semaphore. A local lock orders the philosopher thread and the watchdog
/// inside one process, so after a death the local thread never queues on a
/// semaphore that will not be released again.
pub struct SemaphoreHerald<S, C, W> {
    print: S,
    clock: C,
    sink: Mutex<W>,
    stop: Arc<StopFlag>,
    epoch: Duration,
}

impl<S, C, W> SemaphoreHerald<S, C, W>
where
    S: CountingSemaphore,
    C: Clock,
    W: Write + Send,
{
    pub fn new(print: S, clock: C, sink: W, stop: Arc<StopFlag>, epoch: Duration) -> Self {
        Self {
            print,
            clock,
            sink: Mutex::new(sink),
            stop,
            epoch,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, W>, CoreError> {
        self.sink.lock().map_err(|_| CoreError::Poisoned("console"))
    }
}

impl<S, C, W> Herald for SemaphoreHerald<S, C, W>
where
    S: CountingSemaphore,
    C: Clock,
    W: Write + Send,
{
    fn proclaim(&self, who: PhilosopherId, event: Event) -> Result<bool, CoreError> {
        let mut sink = self.lock()?;
        if self.stop.observe() {
            return Ok(false);
        }
        self.print.acquire()?;
        let elapsed = self.clock.now().saturating_sub(self.epoch);
        let written = write_line(&mut *sink, elapsed, who, event);
        self.print.release()?;
        written.map(|()| true)
    }

    fn proclaim_death(&self, who: PhilosopherId, at: Duration) -> Result<(), CoreError> {
        let mut sink = self.lock()?;
        self.stop.trigger();
        // The print permit is kept for good: siblings stay silent until the
        // launcher kills them.
        self.print.acquire()?;
        write_line(&mut *sink, at.saturating_sub(self.epoch), who, Event::Died)
    }
}
