//! USB serial transport.

use super::discovery::{LinkInfo, LinkType, SerialAdapters};
use super::link_io::LinkIo;
use super::{Transport, TransportError, TransportKind};
use crate::config::LinkConfig;
use crate::port::{LinkAdapter, LinkSettings};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, instrument};

/// Transport over a USB CDC serial adapter.
///
/// With no explicit target it opens the first USB adapter the host lists.
pub struct UsbSerialTransport {
    adapters: Arc<dyn SerialAdapters>,
    target: Option<String>,
    settings: LinkSettings,
    io: LinkIo,
}

impl UsbSerialTransport {
    pub fn new(adapters: Arc<dyn SerialAdapters>, target: Option<String>, link: &LinkConfig) -> Self {
        Self {
            adapters,
            target,
            settings: link.settings(),
            io: LinkIo::new(link),
        }
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }
}

/// Pick the adapter to open.
///
/// An explicit target is looked up by path or product name; one the host
/// does not enumerate is still tried as a raw path.
pub(crate) fn select_adapter(
    available: &[LinkInfo],
    target: Option<&str>,
) -> Result<LinkInfo, TransportError> {
    match target {
        Some(target) => Ok(available
            .iter()
            .find(|info| info.matches(target))
            .cloned()
            .unwrap_or_else(|| LinkInfo::new(target, LinkType::Other, None))),
        None => available
            .iter()
            .find(|info| info.link_type == LinkType::Usb)
            .cloned()
            .ok_or(TransportError::NoUsbDevice),
    }
}

#[async_trait]
impl Transport for UsbSerialTransport {
    #[instrument(skip(self))]
    async fn connect(&self) -> Result<(), TransportError> {
        if self.io.is_connected() {
            return Ok(());
        }

        let adapters = Arc::clone(&self.adapters);
        let target = self.target.clone();
        let settings = self.settings.clone();

        let (info, link) = tokio::task::spawn_blocking(
            move || -> Result<(LinkInfo, Box<dyn LinkAdapter>), TransportError> {
                let available = adapters.list()?;
                let info = select_adapter(&available, target.as_deref())?;
                let mut link = adapters.open(&info, &settings)?;
                link.clear_buffers()?;
                Ok((info, link))
            },
        )
        .await??;

        self.io.attach(link)?;
        info!(adapter = %info, target = ?self.target, baud = self.settings.baud_rate, "USB link open");
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
        TransportKind::Usb
    }
}

impl fmt::Debug for UsbSerialTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsbSerialTransport")
            .field("target", &self.target)
            .field("settings", &self.settings)
            .field("connected", &self.io.is_connected())
            .finish()
    }
}
