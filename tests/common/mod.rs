//! Shared test utilities.
//!
//! This module provides common test infrastructure including:
//! - A mock Chameleon device on a mock bus
//! - A harness wiring session, device and terminal together
//! - Reply frame builders and state waiters

#![allow(dead_code)]

use chameleon_term::config::Config;
use chameleon_term::terminal::Terminal;
use chameleon_term::transport::{LinkTransports, MockBus};
use chameleon_term::{ConnectionSession, ConnectionState, DeviceSession, MockLink, Opcode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub const USB_PATH: &str = "/dev/ttyACM0";
pub const PEER_PATH: &str = "/dev/rfcomm0";

/// Build a reply frame.
pub fn reply(status: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![status];
    frame.extend_from_slice(payload);
    frame
}

/// Opcode of a written command frame.
pub fn opcode_of(frame: &[u8]) -> Option<Opcode> {
    let header: [u8; 4] = frame.get(..4)?.try_into().ok()?;
    Opcode::try_from(u32::from_be_bytes(header)).ok()
}

/// Answer like a healthy device: version string, one card, slot 0.
pub fn firmware(version: &'static str) -> impl FnMut(&[u8]) -> Option<Vec<u8>> + Send + 'static {
    move |frame: &[u8]| {
        let reply = match opcode_of(frame) {
            Some(Opcode::GetVersion) => reply(0x00, version.as_bytes()),
            Some(Opcode::Hf14aScan) => reply(0x00, &[0x04, 0xA1, 0xB2, 0xC3]),
            Some(Opcode::GetSlot) => reply(0x00, &[0x00]),
            Some(_) => reply(0x00, &[]),
            None => reply(0x02, &[]),
        };
        Some(reply)
    }
}

/// Wait until the watched state satisfies `pred`, or panic after two seconds.
pub async fn wait_for_state(
    rx: &mut watch::Receiver<ConnectionState>,
    pred: impl Fn(&ConnectionState) -> bool,
) -> ConnectionState {
    let waited = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|state| pred(state)))
        .await
        .expect("state change timed out")
        .expect("state channel closed");
    waited.clone()
}

/// One mock USB device and one bonded radio peer behind a live session.
pub struct Harness {
    pub bus: MockBus,
    pub usb: MockLink,
    pub peer: MockLink,
    pub config: Config,
    pub session: ConnectionSession,
    pub device: DeviceSession,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let bus = MockBus::new();
        let usb = bus.add_usb(USB_PATH, Some("ChameleonUltra"));
        let peer = bus.add_peer(PEER_PATH, "ChameleonUltra-BT");

        let factory = LinkTransports::new(Arc::new(bus.clone()), Arc::new(bus.clone()), &config);
        let session = ConnectionSession::new(Arc::new(factory));
        let device = DeviceSession::new(session.clone(), config.device.clone());

        Self {
            bus,
            usb,
            peer,
            config,
            session,
            device,
        }
    }

    /// A harness already connected over USB to a device answering like `firmware`.
    pub async fn connected() -> Self {
        let harness = Self::new();
        harness.usb.respond_with(firmware("ChameleonUltra v2.0"));
        harness
            .session
            .connect_usb(None)
            .await
            .expect("mock connect failed");
        harness
    }

    pub fn terminal(&self) -> Terminal {
        Terminal::new(self.device.clone(), self.config.terminal.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_of() {
        assert_eq!(opcode_of(&[0x00, 0x00, 0x10, 0x01, 0x03]), Some(Opcode::SetSlot));
        assert_eq!(opcode_of(&[0x00, 0x00]), None);
    }

    #[test]
    fn test_firmware_responder() {
        let mut respond = firmware("v1");
        assert_eq!(respond(&[0x00, 0x00, 0x10, 0x00]), Some(b"\x00v1".to_vec()));
        assert_eq!(respond(&[0xFF, 0xFF, 0xFF, 0xFF]), Some(vec![0x02]));
    }
}
