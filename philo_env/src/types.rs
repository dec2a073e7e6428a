//! Common types for the environment abstraction.

use crate::error::EnvError;
use uuid::Uuid;

/// Longest name accepted by every supported platform (macOS: 31 bytes).
const MAX_NAME_LEN: usize = 31;

/// Unique identifier for one launch of the simulation.
///
/// Generated once by the launcher and handed to every child process, which
/// derives the same semaphore names from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Creates a new random RunId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a RunId from a UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Derives the semaphore name for `role` within this run.
    ///
    /// Names look like `/ph1a2b3c4d5e6ff12`: a fixed prefix, 48 bits of the
    /// run UUID and the role. Short enough for the 31-byte limit even with
    /// a three-digit fork index.
    pub fn semaphore_name(&self, role: &str) -> Result<SemaphoreName, EnvError> {
        let hex = self.0.simple().to_string();
        SemaphoreName::new(format!("/ph{}{}", &hex[..12], role))
    }

    /// Name of the semaphore guarding fork `index`.
    pub fn fork_name(&self, index: usize) -> Result<SemaphoreName, EnvError> {
        self.semaphore_name(&format!("f{index}"))
    }

    /// Name of the semaphore serializing console output.
    pub fn print_name(&self) -> Result<SemaphoreName, EnvError> {
        self.semaphore_name("p")
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Validated name of a named semaphore.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SemaphoreName(String);

impl SemaphoreName {
    /// Validates a raw name: leading slash, no further slashes, no NUL,
    /// at most 31 bytes.
    pub fn new(name: impl Into<String>) -> Result<Self, EnvError> {
        let name = name.into();
        let valid = name.starts_with('/')
            && name.len() > 1
            && name.len() <= MAX_NAME_LEN
            && !name[1..].contains('/')
            && !name.contains('\0');
        if valid {
            Ok(Self(name))
        } else {
            Err(EnvError::InvalidName(name))
        }
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SemaphoreName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
