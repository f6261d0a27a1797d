//! Building transports for a connect request.

use super::discovery::{BondedPeers, SerialAdapters, SystemBondedPeers, SystemSerialAdapters};
use super::radio::RadioTransport;
use super::usb::UsbSerialTransport;
use super::Transport;
use crate::config::{Config, LinkConfig, RadioConfig};
use std::sync::Arc;

/// Creates a fresh transport for each connect.
pub trait TransportFactory: Send + Sync {
    fn usb(&self, target: Option<String>) -> Arc<dyn Transport>;

    fn radio(&self, target: Option<String>) -> Arc<dyn Transport>;
}

/// Factory for link-backed transports.
#[derive(Clone)]
pub struct LinkTransports {
    adapters: Arc<dyn SerialAdapters>,
    peers: Arc<dyn BondedPeers>,
    link: LinkConfig,
    radio: RadioConfig,
}

impl LinkTransports {
    pub fn new(
        adapters: Arc<dyn SerialAdapters>,
        peers: Arc<dyn BondedPeers>,
        config: &Config,
    ) -> Self {
        Self {
            adapters,
            peers,
            link: config.link.clone(),
            radio: config.radio.clone(),
        }
    }

    /// Transports over the host's real adapters and bonded peers.
    pub fn system(config: &Config) -> Self {
        Self::new(
            Arc::new(SystemSerialAdapters),
            Arc::new(SystemBondedPeers),
            config,
        )
    }
}

impl TransportFactory for LinkTransports {
    fn usb(&self, target: Option<String>) -> Arc<dyn Transport> {
        Arc::new(UsbSerialTransport::new(
            Arc::clone(&self.adapters),
            target,
            &self.link,
        ))
    }

    fn radio(&self, target: Option<String>) -> Arc<dyn Transport> {
        Arc::new(RadioTransport::new(
            Arc::clone(&self.peers),
            target,
            &self.link,
            &self.radio,
        ))
    }
}

impl std::fmt::Debug for LinkTransports {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkTransports")
            .field("link", &self.link)
            .field("radio", &self.radio)
            .finish()
    }
}
