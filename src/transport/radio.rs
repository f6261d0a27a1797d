//! Radio (RFCOMM / SPP) transport.

use super::discovery::{BondedPeers, LinkInfo};
use super::link_io::LinkIo;
use super::{Transport, TransportError, TransportKind};
use crate::config::{LinkConfig, RadioConfig};
use crate::port::{LinkAdapter, LinkSettings};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Transport over a stream channel to a bonded radio peer.
///
/// With no explicit target it picks the first bonded peer whose name
/// contains the configured filter, ignoring case.
pub struct RadioTransport {
    peers: Arc<dyn BondedPeers>,
    target: Option<String>,
    name_filter: String,
    service: Uuid,
    settings: LinkSettings,
    io: LinkIo,
}

impl RadioTransport {
    pub fn new(
        peers: Arc<dyn BondedPeers>,
        target: Option<String>,
        link: &LinkConfig,
        radio: &RadioConfig,
    ) -> Self {
        Self {
            peers,
            target,
            name_filter: radio.name_filter.clone(),
            service: radio.service_uuid,
            settings: link.settings(),
            io: LinkIo::new(link),
        }
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }
}

/// Pick the peer to connect to.
pub(crate) fn select_peer(
    bonded: &[LinkInfo],
    target: Option<&str>,
    name_filter: &str,
) -> Result<LinkInfo, TransportError> {
    match target {
        Some(target) => bonded
            .iter()
            .find(|peer| peer.matches(target))
            .cloned()
            .ok_or_else(|| TransportError::TargetNotFound(target.to_string())),
        None => {
            let filter = name_filter.to_lowercase();
            bonded
                .iter()
                .find(|peer| {
                    peer.name
                        .as_deref()
                        .is_some_and(|name| name.to_lowercase().contains(&filter))
                })
                .cloned()
                .ok_or(TransportError::NoRadioPeer)
        }
    }
}

#[async_trait]
impl Transport for RadioTransport {
    #[instrument(skip(self))]
    async fn connect(&self) -> Result<(), TransportError> {
        if self.io.is_connected() {
            return Ok(());
        }

        let peers = Arc::clone(&self.peers);
        let target = self.target.clone();
        let filter = self.name_filter.clone();
        let service = self.service;
        let settings = self.settings.clone();

        let (peer, link) = tokio::task::spawn_blocking(
            move || -> Result<(LinkInfo, Box<dyn LinkAdapter>), TransportError> {
                let bonded = peers.bonded()?;
                let peer = select_peer(&bonded, target.as_deref(), &filter)?;
                let link = peers.open_channel(&peer, service, &settings)?;
                Ok((peer, link))
            },
        )
        .await??;

        self.io.attach(link)?;
        info!(peer = %peer, target = ?self.target, %service, "radio link open");
        Ok(())
    }

    async fn disconnect(&self) {
        self.io.detach();
    }

    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        self.io.write(data).await
    }

    fn inbound(&self) -> Option<mpsc::Receiver<Vec<u8>>> {
        self.io.take_inbound()
    }

    fn is_connected(&self) -> bool {
        self.io.is_connected()
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Radio
    }
}

impl fmt::Debug for RadioTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RadioTransport")
            .field("target", &self.target)
            .field("name_filter", &self.name_filter)
            .field("service", &self.service)
            .field("connected", &self.io.is_connected())
            .finish()
    }
}
