//! POSIX named semaphores shared across processes.

use crate::error::EnvError;
use crate::semaphore::CountingSemaphore;
use crate::types::SemaphoreName;
use std::ffi::CString;
use std::io;
use std::ptr::NonNull;
use tracing::{debug, warn};

/// A named, kernel-backed counting semaphore.
///
/// The launcher `create`s one per fork plus one for console output; each
/// child process `open`s them by name. The creating handle owns the name and
/// unlinks it on drop, which must only happen after every child has been
/// reaped.
#[derive(Debug)]
pub struct NamedSemaphore {
    /// Handle returned by `sem_open`
    raw: NonNull<libc::sem_t>,

    /// Name the semaphore was opened under
    name: SemaphoreName,

    /// Whether dropping this handle removes the name
    owner: bool,
}

// SAFETY: POSIX semaphores are designed for concurrent use from any thread;
// the handle is never mutated after `sem_open` returns it.
unsafe impl Send for NamedSemaphore {}
unsafe impl Sync for NamedSemaphore {}

impl NamedSemaphore {
    /// Creates a fresh semaphore holding `permits` permits and owning `name`.
    ///
    /// A stale object left behind by a crashed run under the same name is
    /// removed first.
    pub fn create(name: SemaphoreName, permits: u32) -> Result<Self, EnvError> {
        let c_name = c_name(&name)?;
        // SAFETY: `c_name` is a valid NUL-terminated string; unlinking a
        // name that does not exist is harmless.
        unsafe {
            libc::sem_unlink(c_name.as_ptr());
        }

        // SAFETY: valid name, flags and the two variadic arguments that
        // O_CREAT requires (mode and initial value, promoted to c_uint).
        let raw = unsafe {
            libc::sem_open(
                c_name.as_ptr(),
                libc::O_CREAT | libc::O_EXCL,
                0o600 as libc::c_uint,
                permits as libc::c_uint,
            )
        };
        let raw = checked(raw).map_err(|source| EnvError::SemaphoreCreate {
            name: name.to_string(),
            source,
        })?;

        debug!(name = %name, permits, "created named semaphore");
        Ok(Self {
            raw,
            name,
            owner: true,
        })
    }

    /// Attaches to a semaphore created by another process.
    pub fn open(name: SemaphoreName) -> Result<Self, EnvError> {
        let c_name = c_name(&name)?;
        // SAFETY: valid NUL-terminated name and no O_CREAT, so no variadic
        // arguments are read.
        let raw = unsafe { libc::sem_open(c_name.as_ptr(), 0) };
        let raw = checked(raw).map_err(|source| EnvError::SemaphoreOpen {
            name: name.to_string(),
            source,
        })?;

        Ok(Self {
            raw,
            name,
            owner: false,
        })
    }

    /// Returns the semaphore's name.
    pub fn name(&self) -> &SemaphoreName {
        &self.name
    }

    /// Returns true if dropping this handle unlinks the name.
    pub fn is_owner(&self) -> bool {
        self.owner
    }
}

impl CountingSemaphore for NamedSemaphore {
    fn acquire(&self) -> Result<(), EnvError> {
        loop {
            // SAFETY: `raw` came from a successful `sem_open` and stays open
            // until drop.
            if unsafe { libc::sem_wait(self.raw.as_ptr()) } == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(EnvError::SemaphoreWait(err));
            }
        }
    }

    fn release(&self) -> Result<(), EnvError> {
        // SAFETY: see `acquire`.
        if unsafe { libc::sem_post(self.raw.as_ptr()) } == 0 {
            Ok(())
        } else {
            Err(EnvError::SemaphorePost(io::Error::last_os_error()))
        }
    }
}

impl Drop for NamedSemaphore {
    fn drop(&mut self) {
        // SAFETY: `raw` is open and is not used after this point.
        unsafe {
            libc::sem_close(self.raw.as_ptr());
        }
        if !self.owner {
            return;
        }
        match CString::new(self.name.as_str()) {
            // SAFETY: valid NUL-terminated name.
            Ok(c_name) => unsafe {
                if libc::sem_unlink(c_name.as_ptr()) != 0 {
                    warn!(name = %self.name, error = %io::Error::last_os_error(), "sem_unlink failed");
                }
            },
            Err(_) => warn!(name = %self.name, "cannot unlink semaphore with interior NUL"),
        }
    }
}

fn c_name(name: &SemaphoreName) -> Result<CString, EnvError> {
    CString::new(name.as_str()).map_err(|_| EnvError::InvalidName(name.to_string()))
}

fn checked(raw: *mut libc::sem_t) -> io::Result<NonNull<libc::sem_t>> {
    if raw == libc::SEM_FAILED {
        return Err(io::Error::last_os_error());
    }
    NonNull::new(raw).ok_or_else(io::Error::last_os_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RunId;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_create_open_and_share_permits() {
        let run = RunId::new();
        let owner = NamedSemaphore::create(run.print_name().unwrap(), 1).unwrap();
        let guest = NamedSemaphore::open(run.print_name().unwrap()).unwrap();

        assert!(owner.is_owner());
        assert!(!guest.is_owner());

        owner.acquire().unwrap();
        let waiter = {
            let guest = Arc::new(guest);
            let g = Arc::clone(&guest);
            thread::spawn(move || g.acquire().unwrap())
        };
        thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished());

        owner.release().unwrap();
        waiter.join().unwrap();
    }

    #[test]
    fn test_owner_drop_unlinks_name() {
        let run = RunId::new();
        let name = run.fork_name(0).unwrap();
        drop(NamedSemaphore::create(name.clone(), 1).unwrap());

        let err = NamedSemaphore::open(name).unwrap_err();
        assert!(matches!(err, EnvError::SemaphoreOpen { .. }));
    }

    #[test]
    fn test_guest_drop_keeps_name() {
        let run = RunId::new();
        let name = run.fork_name(1).unwrap();
        let _owner = NamedSemaphore::create(name.clone(), 1).unwrap();

        drop(NamedSemaphore::open(name.clone()).unwrap());
        assert!(NamedSemaphore::open(name).is_ok());
    }
}
