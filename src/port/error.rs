//! Link-level error types.
//!
//! These errors describe failures of the raw byte handle underneath a
//! transport. Higher layers wrap them rather than matching on `std::io`.

use thiserror::Error;

/// Errors that can occur while opening or driving a raw link handle.
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested device path or peer is not present.
    #[error("Link not found: {0}")]
    NotFound(String),

    /// An I/O error occurred during link operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The link rejected its configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A read or write did not complete within the handle's timeout.
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The handle has been closed, locally or by the peer.
    #[error("Link is closed")]
    Closed,

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a device path or peer name.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a Timeout error from a duration.
    pub fn timeout(duration: std::time::Duration) -> Self {
        Self::Timeout(duration)
    }

    /// Whether this error only means "nothing arrived yet".
    ///
    /// Reader loops poll with a short timeout and must keep going on these.
    pub fn is_idle(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}
