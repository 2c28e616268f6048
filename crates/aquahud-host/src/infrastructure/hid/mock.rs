//! Fake transport for testing the session and controller without hardware.
//!
//! Reads are scripted ahead of time and replayed in order; an exhausted
//! script behaves like a timeout (zero-byte read).  Writes are recorded so
//! tests can assert on the exact frames the session produced.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{HidTransport, TransportError};

/// Shared inner state, so a test can keep a handle after the transport moves
/// into a session.
#[derive(Default)]
struct FakeState {
    writes: Vec<Vec<u8>>,
    reads: VecDeque<Vec<u8>>,
    fail_writes: bool,
    fail_reads: bool,
}

/// A scriptable [`HidTransport`] double.
#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `data` to be returned by the next unconsumed read.
    pub fn script_read(&self, data: Vec<u8>) {
        self.state.lock().expect("lock poisoned").reads.push_back(data);
    }

    /// Makes every subsequent write fail with [`TransportError::Write`].
    pub fn fail_writes(&self) {
        self.state.lock().expect("lock poisoned").fail_writes = true;
    }

    /// Makes every subsequent read fail with [`TransportError::Read`].
    pub fn fail_reads(&self) {
        self.state.lock().expect("lock poisoned").fail_reads = true;
    }

    /// Returns a copy of every report written so far, oldest first.
    pub fn recorded_writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().expect("lock poisoned").writes.clone()
    }
}

impl HidTransport for FakeTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        let mut state = self.state.lock().expect("lock poisoned");
        if state.fail_writes {
            return Err(TransportError::Write("scripted write failure".to_string()));
        }
        state.writes.push(data.to_vec());
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize, TransportError> {
        let mut state = self.state.lock().expect("lock poisoned");
        if state.fail_reads {
            return Err(TransportError::Read("scripted read failure".to_string()));
        }
        match state.reads.pop_front() {
            Some(data) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                Ok(n)
            }
            // No scripted data: behave like a timeout.
            None => Ok(0),
        }
    }
}
