//! Byte transports to the device.
//!
//! A [`Transport`] owns one physical link (USB serial or a bonded radio peer)
//! and exposes it as an async byte pipe. Everything it reads is handed to the
//! connection session through the receiver returned by [`Transport::inbound`],
//! one chunk per read.

mod discovery;
mod factory;
mod link_io;
mod radio;
mod usb;

pub use discovery::{
    BondedPeers, LinkInfo, LinkType, MockBus, SerialAdapters, SystemBondedPeers,
    SystemSerialAdapters,
};
pub use factory::{LinkTransports, TransportFactory};
pub use radio::RadioTransport;
pub use usb::UsbSerialTransport;

#[cfg(test)]
pub use discovery::{MockBondedPeers, MockSerialAdapters};

use crate::port::PortError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tokio::sync::mpsc;

/// Which kind of link a transport drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Usb,
    Radio,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Usb => write!(f, "USB"),
            TransportKind::Radio => write!(f, "Bluetooth"),
        }
    }
}

/// Transport failures.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("No USB devices found")]
    NoUsbDevice,

    #[error("No suitable Chameleon device found")]
    NoRadioPeer,

    #[error("Device '{0}' not found")]
    TargetNotFound(String),

    #[error("Not connected")]
    NotConnected,

    #[error(transparent)]
    Port(#[from] PortError),

    #[error("Link worker failed: {0}")]
    Worker(String),
}

impl From<tokio::task::JoinError> for TransportError {
    fn from(err: tokio::task::JoinError) -> Self {
        TransportError::Worker(err.to_string())
    }
}

/// An async byte pipe to the device.
///
/// All methods take `&self`; implementations keep their link state behind
/// interior locks so a transport can be shared as `Arc<dyn Transport>`.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Open the link. Connecting an already connected transport is a no-op.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Release the link. Idempotent.
    async fn disconnect(&self);

    /// Write `data` to the link.
    async fn send(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Take the receiver of inbound chunks for the current link.
    ///
    /// Returns `None` if there is no open link or the receiver was already
    /// taken. The receiver yields `None` once the link goes away.
    fn inbound(&self) -> Option<mpsc::Receiver<Vec<u8>>>;

    /// Whether the link is currently open.
    fn is_connected(&self) -> bool;

    fn kind(&self) -> TransportKind;
}
