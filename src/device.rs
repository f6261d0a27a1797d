//! Device session: typed operations over the connection session.
//!
//! Each operation builds a command frame, sends it as a correlated request,
//! waits for the reply up to its deadline and decodes it. A timeout fails the
//! operation only; the connection stays as it was.

use crate::command::{parse_hex, to_hex};
use crate::config::DeviceConfig;
use crate::connection::{ConnectionSession, SessionError};
use crate::protocol::{decode, Opcode, ProtocolCommand, ProtocolResponse, Slot, SlotError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Device operation failures.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Empty reply from device")]
    EmptyReply,

    #[error("{opcode} failed with status {status}")]
    Rejected { opcode: Opcode, status: String },

    #[error(transparent)]
    InvalidSlot(#[from] SlotError),

    #[error("Invalid UID hex: '{0}'")]
    InvalidUid(String),

    #[error("Malformed reply to {opcode}: {reason}")]
    MalformedReply { opcode: Opcode, reason: String },
}

impl DeviceError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DeviceError::Session(SessionError::Timeout(_)))
    }
}

/// Typed device operations with per-operation deadlines.
#[derive(Debug, Clone)]
pub struct DeviceSession {
    connection: ConnectionSession,
    timeouts: DeviceConfig,
}

impl DeviceSession {
    pub fn new(connection: ConnectionSession, timeouts: DeviceConfig) -> Self {
        Self {
            connection,
            timeouts,
        }
    }

    pub fn connection(&self) -> &ConnectionSession {
        &self.connection
    }

    pub fn timeouts(&self) -> &DeviceConfig {
        &self.timeouts
    }

    /// Send any command and decode its reply without judging the status.
    #[instrument(skip(self, command), fields(opcode = %command.opcode()))]
    pub async fn execute(
        &self,
        command: &ProtocolCommand,
        timeout: Duration,
    ) -> Result<ProtocolResponse, DeviceError> {
        let reply = self.connection.request(&command.to_frame(), timeout).await?;
        let response = decode(&reply).ok_or(DeviceError::EmptyReply)?;
        debug!(status = %response.status_label(), bytes = response.payload.len(), "reply decoded");
        Ok(response)
    }

    /// Like [`execute`](Self::execute), but any status other than OK fails.
    async fn execute_ok(
        &self,
        command: ProtocolCommand,
        timeout: Duration,
    ) -> Result<Vec<u8>, DeviceError> {
        let response = self.execute(&command, timeout).await?;
        if response.is_ok() {
            Ok(response.payload)
        } else {
            Err(DeviceError::Rejected {
                opcode: command.opcode(),
                status: response.status_label(),
            })
        }
    }

    /// Firmware version string.
    pub async fn get_version(&self) -> Result<String, DeviceError> {
        let payload = self
            .execute_ok(ProtocolCommand::get_version(), self.timeouts.version_timeout())
            .await?;
        Ok(String::from_utf8_lossy(&payload).into_owned())
    }

    /// Scan for an ISO14443-A tag.
    ///
    /// The device reports at most one card; an empty payload means none.
    pub async fn scan_tags(&self) -> Result<Vec<String>, DeviceError> {
        let payload = self
            .execute_ok(ProtocolCommand::hf14a_scan(), self.timeouts.scan_timeout())
            .await?;
        if payload.is_empty() {
            return Ok(Vec::new());
        }
        info!(uid = %to_hex(&payload), "card found");
        Ok(vec![format!("Card found: {}", to_hex(&payload))])
    }

    /// Select the active emulation slot. Out-of-range values fail before
    /// anything is sent.
    pub async fn set_slot(&self, slot: i64) -> Result<(), DeviceError> {
        let slot = Slot::try_from(slot)?;
        self.execute_ok(ProtocolCommand::set_slot(slot), self.timeouts.set_timeout())
            .await?;
        Ok(())
    }

    pub async fn get_slot(&self) -> Result<Slot, DeviceError> {
        let payload = self
            .execute_ok(ProtocolCommand::get_slot(), self.timeouts.set_timeout())
            .await?;
        let malformed = |reason: String| DeviceError::MalformedReply {
            opcode: Opcode::GetSlot,
            reason,
        };
        let byte = payload
            .first()
            .copied()
            .ok_or_else(|| malformed("empty payload".to_string()))?;
        Slot::new(byte).map_err(|e| malformed(e.to_string()))
    }

    /// Set the emulated UID from a hex string such as `"04a1b2c3"`.
    pub async fn set_uid(&self, uid_hex: &str) -> Result<(), DeviceError> {
        let uid = parse_hex(uid_hex.trim())
            .filter(|uid| !uid.is_empty())
            .ok_or_else(|| DeviceError::InvalidUid(uid_hex.to_string()))?;
        self.execute_ok(ProtocolCommand::set_uid(uid), self.timeouts.set_timeout())
            .await?;
        Ok(())
    }

    pub async fn set_sak(&self, sak: u8) -> Result<(), DeviceError> {
        self.execute_ok(ProtocolCommand::set_sak(sak), self.timeouts.set_timeout())
            .await?;
        Ok(())
    }

    pub async fn set_atqa(&self, atqa: [u8; 2]) -> Result<(), DeviceError> {
        self.execute_ok(ProtocolCommand::set_atqa(atqa), self.timeouts.set_timeout())
            .await?;
        Ok(())
    }

    pub async fn start_emulation(&self) -> Result<(), DeviceError> {
        self.execute_ok(ProtocolCommand::emulator_start(), self.timeouts.set_timeout())
            .await?;
        Ok(())
    }

    pub async fn stop_emulation(&self) -> Result<(), DeviceError> {
        self.execute_ok(ProtocolCommand::emulator_stop(), self.timeouts.set_timeout())
            .await?;
        Ok(())
    }

    /// Send an already encoded frame and return the decoded reply.
    ///
    /// The status is left for the caller to interpret.
    pub async fn send_raw(&self, frame: &[u8]) -> Result<ProtocolResponse, DeviceError> {
        let reply = self
            .connection
            .request(frame, self.timeouts.raw_timeout())
            .await?;
        decode(&reply).ok_or(DeviceError::EmptyReply)
    }
}
