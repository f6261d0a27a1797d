//! Finding links to open.
//!
//! Two seams: [`SerialAdapters`] enumerates and opens USB serial adapters,
//! [`BondedPeers`] enumerates already-paired radio peers and opens an RFCOMM
//! channel to one of them. The system implementations sit on `serialport`;
//! [`MockBus`] stands in for both in tests.

use crate::port::{LinkAdapter, LinkSettings, MockLink, PortError, SerialLink};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serialport::SerialPortType;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// What kind of hardware sits behind an enumerated link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Usb,
    Bluetooth,
    Other,
}

/// One enumerated link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkInfo {
    /// Device path used to open the link
    pub path: String,
    pub link_type: LinkType,
    /// Product name for USB adapters, peer name for radio peers
    pub name: Option<String>,
}

impl LinkInfo {
    pub fn new(path: impl Into<String>, link_type: LinkType, name: Option<String>) -> Self {
        Self {
            path: path.into(),
            link_type,
            name,
        }
    }

    /// The name if known, otherwise the path.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.path)
    }

    /// Whether `target` names this link, by exact path or case-insensitive name.
    pub fn matches(&self, target: &str) -> bool {
        self.path == target
            || self
                .name
                .as_deref()
                .is_some_and(|name| name.eq_ignore_ascii_case(target))
    }
}

impl fmt::Display for LinkInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", self.path, name),
            None => write!(f, "{}", self.path),
        }
    }
}

impl From<serialport::SerialPortInfo> for LinkInfo {
    fn from(port: serialport::SerialPortInfo) -> Self {
        match port.port_type {
            SerialPortType::UsbPort(usb) => {
                let name = usb.product.or(usb.manufacturer);
                LinkInfo::new(port.port_name, LinkType::Usb, name)
            }
            SerialPortType::BluetoothPort => {
                let name = peer_name_from_path(&port.port_name);
                LinkInfo::new(port.port_name, LinkType::Bluetooth, name)
            }
            _ if port.port_name.contains("rfcomm") => {
                LinkInfo::new(port.port_name, LinkType::Bluetooth, None)
            }
            _ => LinkInfo::new(port.port_name, LinkType::Other, None),
        }
    }
}

/// Recover a peer name from an OS device node like `/dev/cu.ChameleonUltra`.
fn peer_name_from_path(path: &str) -> Option<String> {
    let file = path.rsplit(['/', '\\']).next()?;
    let name = file
        .strip_prefix("cu.")
        .or_else(|| file.strip_prefix("tty."))
        .unwrap_or(file);
    (!name.is_empty()).then(|| name.to_string())
}

/// USB serial adapter enumeration.
///
/// Called from blocking worker threads.
#[cfg_attr(test, mockall::automock)]
pub trait SerialAdapters: Send + Sync {
    /// Every serial link the host currently exposes.
    fn list(&self) -> Result<Vec<LinkInfo>, PortError>;

    fn open(
        &self,
        info: &LinkInfo,
        settings: &LinkSettings,
    ) -> Result<Box<dyn LinkAdapter>, PortError>;
}

/// Paired radio peers.
///
/// Called from blocking worker threads.
#[cfg_attr(test, mockall::automock)]
pub trait BondedPeers: Send + Sync {
    /// Peers the host is already bonded with.
    fn bonded(&self) -> Result<Vec<LinkInfo>, PortError>;

    /// Open an RFCOMM channel to `service` on `peer`.
    fn open_channel(
        &self,
        peer: &LinkInfo,
        service: Uuid,
        settings: &LinkSettings,
    ) -> Result<Box<dyn LinkAdapter>, PortError>;
}

/// Host serial adapters via `serialport`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSerialAdapters;

impl SerialAdapters for SystemSerialAdapters {
    fn list(&self) -> Result<Vec<LinkInfo>, PortError> {
        let ports = serialport::available_ports()?;
        Ok(ports.into_iter().map(LinkInfo::from).collect())
    }

    fn open(
        &self,
        info: &LinkInfo,
        settings: &LinkSettings,
    ) -> Result<Box<dyn LinkAdapter>, PortError> {
        Ok(Box::new(SerialLink::open(&info.path, settings)?))
    }
}

/// Bonded peers the OS exposes as serial device nodes.
///
/// Pairing binds the peer's SPP service to a node (`/dev/rfcomm*`,
/// `/dev/cu.*`, an outgoing COM port), so opening the channel is opening
/// that node. Peers that never had the service bound are not listed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBondedPeers;

impl BondedPeers for SystemBondedPeers {
    fn bonded(&self) -> Result<Vec<LinkInfo>, PortError> {
        let ports = serialport::available_ports()?;
        Ok(ports
            .into_iter()
            .map(LinkInfo::from)
            .filter(|info| info.link_type == LinkType::Bluetooth)
            .collect())
    }

    fn open_channel(
        &self,
        peer: &LinkInfo,
        service: Uuid,
        settings: &LinkSettings,
    ) -> Result<Box<dyn LinkAdapter>, PortError> {
        debug!(peer = %peer, %service, "opening rfcomm channel");
        Ok(Box::new(SerialLink::open(&peer.path, settings)?))
    }
}

#[derive(Debug, Default)]
struct MockBusState {
    devices: Vec<(LinkInfo, MockLink)>,
    fail_open: bool,
    opened: Vec<String>,
    services: Vec<Uuid>,
}

/// In-memory adapters and peers for tests.
///
/// Each registered device is backed by a [`MockLink`]; the handle returned on
/// registration scripts the device while the transport owns its clones.
#[derive(Debug, Clone, Default)]
pub struct MockBus {
    state: Arc<Mutex<MockBusState>>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a USB serial adapter.
    pub fn add_usb(&self, path: &str, product: Option<&str>) -> MockLink {
        self.add(LinkInfo::new(path, LinkType::Usb, product.map(str::to_string)))
    }

    /// Register a bonded radio peer.
    pub fn add_peer(&self, path: &str, name: &str) -> MockLink {
        self.add(LinkInfo::new(path, LinkType::Bluetooth, Some(name.to_string())))
    }

    fn add(&self, info: LinkInfo) -> MockLink {
        let link = MockLink::new(info.path.clone());
        self.state.lock().devices.push((info, link.clone()));
        link
    }

    /// Make every open fail as if the device vanished.
    pub fn set_fail_open(&self, fail: bool) {
        self.state.lock().fail_open = fail;
    }

    /// Paths opened so far, in order.
    pub fn opened(&self) -> Vec<String> {
        self.state.lock().opened.clone()
    }

    /// Services requested through [`BondedPeers::open_channel`].
    pub fn requested_services(&self) -> Vec<Uuid> {
        self.state.lock().services.clone()
    }

    fn open_path(&self, path: &str) -> Result<Box<dyn LinkAdapter>, PortError> {
        let mut state = self.state.lock();
        if state.fail_open {
            return Err(PortError::not_found(path));
        }
        let link = state
            .devices
            .iter()
            .find(|(info, _)| info.path == path)
            .map(|(_, link)| link.clone())
            .ok_or_else(|| PortError::not_found(path))?;
        state.opened.push(path.to_string());
        Ok(Box::new(link))
    }
}

impl SerialAdapters for MockBus {
    fn list(&self) -> Result<Vec<LinkInfo>, PortError> {
        Ok(self
            .state
            .lock()
            .devices
            .iter()
            .map(|(info, _)| info.clone())
            .collect())
    }

    fn open(
        &self,
        info: &LinkInfo,
        _settings: &LinkSettings,
    ) -> Result<Box<dyn LinkAdapter>, PortError> {
        self.open_path(&info.path)
    }
}

impl BondedPeers for MockBus {
    fn bonded(&self) -> Result<Vec<LinkInfo>, PortError> {
        Ok(self
            .state
            .lock()
            .devices
            .iter()
            .filter(|(info, _)| info.link_type == LinkType::Bluetooth)
            .map(|(info, _)| info.clone())
            .collect())
    }

    fn open_channel(
        &self,
        peer: &LinkInfo,
        service: Uuid,
        _settings: &LinkSettings,
    ) -> Result<Box<dyn LinkAdapter>, PortError> {
        self.state.lock().services.push(service);
        self.open_path(&peer.path)
    }
}
