//! Shared plumbing for link-backed transports.
//!
//! `LinkIo` owns the writer half of an open link and a dedicated reader
//! thread for the other half. The reader polls with the link's short timeout
//! and forwards every non-empty chunk into a bounded channel.

use super::TransportError;
use crate::config::LinkConfig;
use crate::port::{LinkAdapter, PortError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

type SharedWriter = Arc<Mutex<Option<Box<dyn LinkAdapter>>>>;

#[derive(Debug)]
pub(crate) struct LinkIo {
    writer: SharedWriter,
    /// One flag per attached link, shared with that link's reader thread.
    alive: Mutex<Arc<AtomicBool>>,
    inbound: Mutex<Option<mpsc::Receiver<Vec<u8>>>>,
    read_timeout: Duration,
    read_buffer: usize,
    capacity: usize,
}

impl LinkIo {
    pub(crate) fn new(link: &LinkConfig) -> Self {
        Self {
            writer: Arc::new(Mutex::new(None)),
            alive: Mutex::new(Arc::new(AtomicBool::new(false))),
            inbound: Mutex::new(None),
            read_timeout: link.read_timeout(),
            read_buffer: link.read_buffer.max(1),
            capacity: link.inbound_capacity.max(1),
        }
    }

    /// Take ownership of a freshly opened link and start reading from it.
    ///
    /// On error the link is dropped, which releases it.
    pub(crate) fn attach(&self, link: Box<dyn LinkAdapter>) -> Result<(), TransportError> {
        self.detach();

        // The reader polls with the configured timeout so it sees detach promptly.
        let mut reader_link = link.try_clone_link()?;
        reader_link.set_timeout(self.read_timeout)?;
        let name = link.name().to_string();
        let (tx, rx) = mpsc::channel(self.capacity);

        let alive = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&alive);
        let buffer_len = self.read_buffer;

        // The reader exits at its next poll once the flag drops; it is never
        // joined, so a slow driver cannot stall a disconnect.
        std::thread::Builder::new()
            .name(format!("link-rx {name}"))
            .spawn(move || reader_loop(reader_link, flag, tx, buffer_len))
            .map_err(PortError::Io)?;

        *self.writer.lock() = Some(link);
        *self.inbound.lock() = Some(rx);
        *self.alive.lock() = alive;

        debug!(link = %name, "link attached");
        Ok(())
    }

    /// Stop the reader and release the link. Idempotent.
    pub(crate) fn detach(&self) {
        self.alive.lock().store(false, Ordering::Release);
        self.inbound.lock().take();

        if let Some(link) = self.writer.lock().take() {
            debug!(link = %link.name(), "link released");
        }
    }

    pub(crate) fn take_inbound(&self) -> Option<mpsc::Receiver<Vec<u8>>> {
        self.inbound.lock().take()
    }

    /// Open and not dropped by the peer.
    pub(crate) fn is_connected(&self) -> bool {
        self.alive.lock().load(Ordering::Acquire) && self.writer.lock().is_some()
    }

    pub(crate) async fn write(&self, data: &[u8]) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        let writer = Arc::clone(&self.writer);
        let data = data.to_vec();
        tokio::task::spawn_blocking(move || {
            let mut guard = writer.lock();
            let link = guard.as_mut().ok_or(TransportError::NotConnected)?;
            link.write_bytes(&data)?;
            trace!(link = %link.name(), bytes = data.len(), "frame written");
            Ok(())
        })
        .await?
    }
}

impl Drop for LinkIo {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Blocking read loop, one per attached link.
fn reader_loop(
    mut link: Box<dyn LinkAdapter>,
    alive: Arc<AtomicBool>,
    tx: mpsc::Sender<Vec<u8>>,
    buffer_len: usize,
) {
    let mut buffer = vec![0u8; buffer_len];

    while alive.load(Ordering::Acquire) {
        match link.read_bytes(&mut buffer) {
            Ok(0) => continue,
            Ok(n) => {
                trace!(link = %link.name(), bytes = n, "chunk received");
                if tx.blocking_send(buffer[..n].to_vec()).is_err() {
                    debug!(link = %link.name(), "inbound receiver dropped");
                    break;
                }
            }
            Err(e) if e.is_idle() => continue,
            Err(e) => {
                if alive.swap(false, Ordering::AcqRel) {
                    warn!(link = %link.name(), error = %e, "link read failed");
                }
                break;
            }
        }
    }

    debug!(link = %link.name(), "reader stopped");
}
