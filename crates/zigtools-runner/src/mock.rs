//! Scripted in-memory transport for exercising the listener and session
//! without hardware.
//!
//! Clones share one device, so a test can keep a handle and feed bytes while a
//! [`Radio`](crate::Radio) owns another.
//!
//! ```
//! use zigtools_runner::{MockTransport, Transport};
//!
//! let mut mock = MockTransport::new();
//! mock.push_rx(&[0xB1, 0x01, 0x00]);
//! assert_eq!(mock.bytes_available().unwrap(), 3);
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use zigtools_protocol::{RESP_SYSTEM, STATUS_OK};

use crate::error::{RadioError, RadioResult};
use crate::transport::Transport;

#[derive(Debug, Default)]
struct MockState {
    /// Bytes waiting for the host to read.
    rx: VecDeque<u8>,
    /// Each `write_all` call, in order.
    writes: Vec<Vec<u8>>,
    closed: bool,
    fail_writes: bool,
}

/// A fake radio link.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create an idle mock with nothing to read.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock whose radio has already reported ready.
    pub fn ready() -> Self {
        let mock = Self::new();
        mock.push_rx(&[RESP_SYSTEM, 0x01, STATUS_OK]);
        mock
    }

    /// Queue bytes as if the radio had sent them.
    pub fn push_rx(&self, data: &[u8]) {
        self.state.lock().rx.extend(data.iter().copied());
    }

    /// Number of queued bytes the host has not read yet.
    pub fn pending_rx(&self) -> usize {
        self.state.lock().rx.len()
    }

    /// Every write made by the host, one entry per call.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().writes.clone()
    }

    /// All written bytes concatenated.
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().writes.concat()
    }

    /// Whether [`Transport::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Make subsequent writes fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }
}

impl Transport for MockTransport {
    fn bytes_available(&mut self) -> RadioResult<usize> {
        let state = self.state.lock();
        if state.closed {
            return Err(RadioError::Transport("mock transport closed".into()));
        }
        Ok(state.rx.len())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> RadioResult<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(RadioError::Transport("mock transport closed".into()));
        }
        if state.rx.len() < buf.len() {
            return Err(RadioError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "mock transport underrun",
            )));
        }
        let n = buf.len();
        for (slot, byte) in buf.iter_mut().zip(state.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(())
    }

    fn write_all(&mut self, data: &[u8]) -> RadioResult<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(RadioError::Transport("mock transport closed".into()));
        }
        if state.fail_writes {
            return Err(RadioError::Transport("mock write failure".into()));
        }
        state.writes.push(data.to_vec());
        Ok(())
    }

    fn close(&mut self) -> RadioResult<()> {
        self.state.lock().closed = true;
        Ok(())
    }
}
