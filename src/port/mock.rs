//! Mock link implementation for testing.
//!
//! `MockLink` simulates a device on the far side of a link without hardware.
//! Frames pushed into it are delivered one per read, writes are logged, and an
//! optional responder closure can answer each written frame, which is how the
//! integration tests stand in for a Chameleon device.

use super::error::PortError;
use super::traits::LinkAdapter;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

type Responder = Box<dyn FnMut(&[u8]) -> Option<Vec<u8>> + Send>;

struct MockLinkState {
    /// Frames waiting to be read, one frame per read call.
    read_queue: VecDeque<Vec<u8>>,
    /// Every frame written to the link.
    write_log: Vec<Vec<u8>>,
    responder: Option<Responder>,
    /// Fail the next writes with an I/O error.
    fail_writes: bool,
    /// Peer has gone away; reads drain the queue then report `Closed`.
    closed: bool,
    timeout: Duration,
    buffers_cleared: bool,
}

struct Shared {
    state: Mutex<MockLinkState>,
    readable: Condvar,
}

/// Mock link for tests.
///
/// Clones share the same underlying state, so a test can keep one handle to
/// script the "device" while the transport owns others.
///
/// # Example
/// ```
/// use chameleon_term::port::{LinkAdapter, MockLink};
///
/// let mut link = MockLink::new("MOCK0");
/// link.respond_with(|frame| (frame == [0x00, 0x00, 0x10, 0x00]).then(|| b"\x00v1".to_vec()));
///
/// link.write_bytes(&[0x00, 0x00, 0x10, 0x00]).unwrap();
/// let mut buffer = [0u8; 16];
/// let n = link.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"\x00v1");
/// ```
#[derive(Clone)]
pub struct MockLink {
    name: String,
    shared: Arc<Shared>,
}

impl MockLink {
    /// Create a new mock link with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shared: Arc::new(Shared {
                state: Mutex::new(MockLinkState {
                    read_queue: VecDeque::new(),
                    write_log: Vec::new(),
                    responder: None,
                    fail_writes: false,
                    closed: false,
                    timeout: Duration::from_millis(50),
                    buffers_cleared: false,
                }),
                readable: Condvar::new(),
            }),
        }
    }

    /// Queue a frame as if the device had sent it unprompted.
    pub fn push_frame(&self, frame: &[u8]) {
        let mut state = self.shared.state.lock();
        state.read_queue.push_back(frame.to_vec());
        self.shared.readable.notify_all();
    }

    /// Answer written frames with the closure's reply, if it returns one.
    pub fn respond_with<F>(&self, responder: F)
    where
        F: FnMut(&[u8]) -> Option<Vec<u8>> + Send + 'static,
    {
        self.shared.state.lock().responder = Some(Box::new(responder));
    }

    /// Get a copy of every frame written so far.
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.shared.state.lock().write_log.clone()
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.shared.state.lock().fail_writes = fail;
    }

    /// Simulate the peer dropping the link.
    pub fn close(&self) {
        let mut state = self.shared.state.lock();
        state.closed = true;
        self.shared.readable.notify_all();
    }

    /// Whether the peer side has been closed.
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// Timeout idle reads currently wait for.
    pub fn read_timeout(&self) -> Duration {
        self.shared.state.lock().timeout
    }

    /// Whether buffers were cleared since creation.
    pub fn was_cleared(&self) -> bool {
        self.shared.state.lock().buffers_cleared
    }

    /// Number of frames waiting to be read.
    pub fn pending_frames(&self) -> usize {
        self.shared.state.lock().read_queue.len()
    }
}

impl LinkAdapter for MockLink {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.shared.state.lock();

        if state.closed {
            return Err(PortError::Closed);
        }
        if state.fail_writes {
            return Err(PortError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock write failure",
            )));
        }

        state.write_log.push(data.to_vec());

        let reply = state.responder.as_mut().and_then(|respond| respond(data));
        if let Some(reply) = reply {
            state.read_queue.push_back(reply);
            self.shared.readable.notify_all();
        }

        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.shared.state.lock();

        if state.read_queue.is_empty() && !state.closed {
            let timeout = state.timeout;
            self.shared.readable.wait_for(&mut state, timeout);
        }

        match state.read_queue.pop_front() {
            Some(mut frame) => {
                if frame.len() > buffer.len() {
                    let rest = frame.split_off(buffer.len());
                    state.read_queue.push_front(rest);
                }
                buffer[..frame.len()].copy_from_slice(&frame);
                Ok(frame.len())
            }
            None if state.closed => Err(PortError::Closed),
            None => Err(PortError::timeout(state.timeout)),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.shared.state.lock().timeout = timeout;
        Ok(())
    }

    fn clear_buffers(&mut self) -> Result<(), PortError> {
        let mut state = self.shared.state.lock();
        state.read_queue.clear();
        state.buffers_cleared = true;
        Ok(())
    }

    fn try_clone_link(&self) -> Result<Box<dyn LinkAdapter>, PortError> {
        Ok(Box::new(self.clone()))
    }
}

impl std::fmt::Debug for MockLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLink")
            .field("name", &self.name)
            .field("pending_frames", &self.pending_frames())
            .finish()
    }
}
