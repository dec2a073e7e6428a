//! Helpers shared by the unit tests of this crate.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// In-memory sink that can be cloned into a herald and read back afterwards.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, split into lines.
    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Splits a `<ms> <id> <event>` line.
pub fn parse_line(line: &str) -> (u64, u32, String) {
    let mut parts = line.splitn(3, ' ');
    let ms = parts.next().unwrap().parse().unwrap();
    let id = parts.next().unwrap().parse().unwrap();
    (ms, id, parts.next().unwrap().to_owned())
}
