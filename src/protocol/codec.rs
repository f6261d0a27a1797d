//! Frame encoding and decoding.
//!
//! There is no length prefix, checksum or delimiter at this layer: the link
//! is assumed to hand over exactly one frame per read.

use super::opcode::{Opcode, Status};
use super::slot::Slot;

/// Size of the opcode header on command frames.
pub const OPCODE_LEN: usize = 4;

/// Encode a command frame: big-endian opcode followed by the payload as-is.
pub fn encode(opcode: u32, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(OPCODE_LEN + payload.len());
    frame.extend_from_slice(&opcode.to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Decode a reply frame.
///
/// Returns `None` for an empty frame. The status byte is not validated
/// against [`Status`]; unknown values are passed through.
pub fn decode(raw: &[u8]) -> Option<ProtocolResponse> {
    let (&status, payload) = raw.split_first()?;
    Some(ProtocolResponse {
        status,
        payload: payload.to_vec(),
    })
}

/// Outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolCommand {
    opcode: Opcode,
    payload: Vec<u8>,
}

impl ProtocolCommand {
    pub fn new(opcode: Opcode, payload: Vec<u8>) -> Self {
        Self { opcode, payload }
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Wire representation of this command.
    pub fn to_frame(&self) -> Vec<u8> {
        encode(self.opcode.code(), &self.payload)
    }

    pub fn get_version() -> Self {
        Self::new(Opcode::GetVersion, Vec::new())
    }

    pub fn hf14a_scan() -> Self {
        Self::new(Opcode::Hf14aScan, Vec::new())
    }

    pub fn hf14a_raw(data: Vec<u8>) -> Self {
        Self::new(Opcode::Hf14aRaw, data)
    }

    pub fn set_slot(slot: Slot) -> Self {
        Self::new(Opcode::SetSlot, vec![slot.get()])
    }

    pub fn get_slot() -> Self {
        Self::new(Opcode::GetSlot, Vec::new())
    }

    pub fn set_uid(uid: Vec<u8>) -> Self {
        Self::new(Opcode::SetUid, uid)
    }

    pub fn set_sak(sak: u8) -> Self {
        Self::new(Opcode::SetSak, vec![sak])
    }

    pub fn set_atqa(atqa: [u8; 2]) -> Self {
        Self::new(Opcode::SetAtqa, atqa.to_vec())
    }

    pub fn emulator_start() -> Self {
        Self::new(Opcode::EmulatorStart, Vec::new())
    }

    pub fn emulator_stop() -> Self {
        Self::new(Opcode::EmulatorStop, Vec::new())
    }
}

/// Inbound reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolResponse {
    pub status: u8,
    pub payload: Vec<u8>,
}

impl ProtocolResponse {
    /// True when the status byte is `OK`.
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok.as_byte()
    }

    /// Registered status, if the byte is known.
    pub fn known_status(&self) -> Option<Status> {
        Status::from_byte(self.status)
    }

    /// Status name for display, or the raw byte when unregistered.
    pub fn status_label(&self) -> String {
        match self.known_status() {
            Some(status) => status.to_string(),
            None => format!("0x{:02X}", self.status),
        }
    }
}
