//! Connection session: owns the active transport and correlates replies.
//!
//! The session is the only place the active [`Transport`] is created, swapped
//! or released. Inbound frames are fanned out on broadcast channels, and a
//! request waiting for a reply parks a one-shot handle in a FIFO queue that
//! the receive task completes in arrival order.

use crate::transport::{Transport, TransportError, TransportFactory, TransportKind};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Capacity of the inbound and unsolicited broadcast channels.
const BROADCAST_CAPACITY: usize = 256;

/// Lifecycle of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error(String),
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Connected => write!(f, "Connected"),
            ConnectionState::Error(reason) => write!(f, "Error: {reason}"),
        }
    }
}

/// Session failures.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Device not connected")]
    NotConnected,

    #[error("Connection failed: {0}")]
    Connect(#[source] TransportError),

    #[error("Failed to send command: {0}")]
    Send(#[source] TransportError),

    #[error("No response from device within {0:?}")]
    Timeout(Duration),

    #[error("Link closed before a reply arrived")]
    LinkClosed,
}

struct PendingReply {
    seq: u64,
    reply: oneshot::Sender<Vec<u8>>,
}

struct ActiveLink {
    transport: Arc<dyn Transport>,
    generation: u64,
    receiver: JoinHandle<()>,
}

struct Inner {
    factory: Arc<dyn TransportFactory>,
    active: Mutex<Option<ActiveLink>>,
    pending: Mutex<VecDeque<PendingReply>>,
    state: watch::Sender<ConnectionState>,
    inbound: broadcast::Sender<Vec<u8>>,
    unsolicited: broadcast::Sender<Vec<u8>>,
    next_seq: AtomicU64,
    generation: AtomicU64,
    /// Serialises connect and disconnect.
    lifecycle: tokio::sync::Mutex<()>,
    /// Held from registering a waiter until its frame is written, so the
    /// waiter queue and the wire agree on order.
    send_order: tokio::sync::Mutex<()>,
}

impl Inner {
    fn set_state(&self, state: ConnectionState) {
        debug!(%state, "connection state");
        self.state.send_replace(state);
    }

    fn transport(&self) -> Option<Arc<dyn Transport>> {
        self.active
            .lock()
            .as_ref()
            .map(|active| Arc::clone(&active.transport))
    }

    /// Hand a frame to the oldest live waiter, or publish it as unsolicited.
    fn dispatch(&self, frame: Vec<u8>) {
        let _ = self.inbound.send(frame.clone());

        let mut frame = frame;
        let mut pending = self.pending.lock();
        while let Some(waiter) = pending.pop_front() {
            match waiter.reply.send(frame) {
                Ok(()) => {
                    debug!(seq = waiter.seq, "reply matched");
                    return;
                }
                // waiter gave up; offer the frame to the next one
                Err(returned) => frame = returned,
            }
        }
        drop(pending);

        debug!(bytes = frame.len(), "unsolicited frame");
        let _ = self.unsolicited.send(frame);
    }

    fn forget(&self, seq: u64) {
        self.pending.lock().retain(|waiter| waiter.seq != seq);
    }

    /// Drop every waiter; their requests resolve as `LinkClosed`.
    fn fail_pending(&self) {
        let dropped = std::mem::take(&mut *self.pending.lock());
        if !dropped.is_empty() {
            debug!(count = dropped.len(), "pending requests failed");
        }
    }

    /// The reader of `generation` stopped on its own.
    fn link_ended(&self, generation: u64) -> Option<Arc<dyn Transport>> {
        let mut active = self.active.lock();
        if active.as_ref().map(|a| a.generation) != Some(generation) {
            return None;
        }
        let lost = active.take()?;
        drop(active);

        warn!(kind = %lost.transport.kind(), "link lost");
        self.fail_pending();
        self.set_state(ConnectionState::Error("link lost".to_string()));
        Some(lost.transport)
    }
}

/// Owner of the one active link.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct ConnectionSession {
    inner: Arc<Inner>,
}

impl ConnectionSession {
    pub fn new(factory: Arc<dyn TransportFactory>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let (inbound, _) = broadcast::channel(BROADCAST_CAPACITY);
        let (unsolicited, _) = broadcast::channel(BROADCAST_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                factory,
                active: Mutex::new(None),
                pending: Mutex::new(VecDeque::new()),
                state,
                inbound,
                unsolicited,
                next_seq: AtomicU64::new(1),
                generation: AtomicU64::new(0),
                lifecycle: tokio::sync::Mutex::new(()),
                send_order: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Connect over USB serial, to `target` or the first adapter found.
    pub async fn connect_usb(&self, target: Option<String>) -> Result<(), SessionError> {
        let transport = self.inner.factory.usb(target);
        self.connect_with(transport).await
    }

    /// Connect over radio, to `target` or the first matching bonded peer.
    pub async fn connect_radio(&self, target: Option<String>) -> Result<(), SessionError> {
        let transport = self.inner.factory.radio(target);
        self.connect_with(transport).await
    }

    /// Replace whatever link is active with `transport` and open it.
    #[instrument(skip_all, fields(kind = %transport.kind()))]
    pub async fn connect_with(&self, transport: Arc<dyn Transport>) -> Result<(), SessionError> {
        let _lifecycle = self.inner.lifecycle.lock().await;

        self.teardown().await;
        self.inner.set_state(ConnectionState::Connecting);

        if let Err(e) = transport.connect().await {
            transport.disconnect().await;
            warn!(error = %e, "connect failed");
            self.inner.set_state(ConnectionState::Error(e.to_string()));
            return Err(SessionError::Connect(e));
        }

        let Some(frames) = transport.inbound() else {
            transport.disconnect().await;
            let e = TransportError::NotConnected;
            self.inner.set_state(ConnectionState::Error(e.to_string()));
            return Err(SessionError::Connect(e));
        };

        let generation = self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let receiver = tokio::spawn(receive_loop(
            Arc::downgrade(&self.inner),
            frames,
            generation,
        ));

        *self.inner.active.lock() = Some(ActiveLink {
            transport: Arc::clone(&transport),
            generation,
            receiver,
        });
        self.inner.set_state(ConnectionState::Connected);
        info!(kind = %transport.kind(), "connected");
        Ok(())
    }

    /// Release the active link, if any. Never fails.
    pub async fn disconnect(&self) {
        let _lifecycle = self.inner.lifecycle.lock().await;
        self.teardown().await;
        self.inner.set_state(ConnectionState::Disconnected);
    }

    async fn teardown(&self) {
        let previous = self.inner.active.lock().take();
        if let Some(active) = previous {
            active.receiver.abort();
            active.transport.disconnect().await;
            info!(kind = %active.transport.kind(), "disconnected");
        }
        self.inner.fail_pending();
    }

    /// Write raw bytes to the active link.
    pub async fn send(&self, data: &[u8]) -> Result<(), SessionError> {
        let transport = self.inner.transport().ok_or(SessionError::NotConnected)?;
        transport.send(data).await.map_err(SessionError::Send)
    }

    /// Send `frame` and wait up to `timeout` for the reply matched to it.
    ///
    /// The waiter is registered before the frame goes out, so a fast reply
    /// cannot be missed. On timeout the waiter withdraws and the connection
    /// is left as it was.
    pub async fn request(&self, frame: &[u8], timeout: Duration) -> Result<Vec<u8>, SessionError> {
        let transport = self.inner.transport().ok_or(SessionError::NotConnected)?;
        if !transport.is_connected() {
            return Err(SessionError::NotConnected);
        }

        let seq = self.inner.next_seq.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        {
            let _order = self.inner.send_order.lock().await;
            self.inner
                .pending
                .lock()
                .push_back(PendingReply { seq, reply: tx });

            if let Err(e) = transport.send(frame).await {
                self.inner.forget(seq);
                return Err(SessionError::Send(e));
            }
        }
        debug!(seq, bytes = frame.len(), "request sent");

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(SessionError::LinkClosed),
            Err(_) => {
                self.inner.forget(seq);
                warn!(seq, ?timeout, "no reply");
                Err(SessionError::Timeout(timeout))
            }
        }
    }

    /// Whether a link is active and open.
    pub fn is_connected(&self) -> bool {
        self.inner
            .transport()
            .is_some_and(|transport| transport.is_connected())
    }

    pub fn active_transport_kind(&self) -> Option<TransportKind> {
        self.inner.transport().map(|transport| transport.kind())
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Every inbound frame, whether or not a request claims it.
    pub fn subscribe_inbound(&self) -> broadcast::Receiver<Vec<u8>> {
        self.inner.inbound.subscribe()
    }

    /// Inbound frames no pending request was waiting for.
    pub fn subscribe_unsolicited(&self) -> broadcast::Receiver<Vec<u8>> {
        self.inner.unsolicited.subscribe()
    }

    /// Number of requests currently waiting for a reply.
    pub fn pending_requests(&self) -> usize {
        self.inner.pending.lock().len()
    }
}

impl fmt::Debug for ConnectionSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSession")
            .field("state", &self.state())
            .field("kind", &self.active_transport_kind())
            .field("pending", &self.pending_requests())
            .finish()
    }
}

async fn receive_loop(inner: Weak<Inner>, mut frames: mpsc::Receiver<Vec<u8>>, generation: u64) {
    while let Some(frame) = frames.recv().await {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        inner.dispatch(frame);
    }

    let lost = inner.upgrade().and_then(|inner| inner.link_ended(generation));
    if let Some(transport) = lost {
        transport.disconnect().await;
    }
}
