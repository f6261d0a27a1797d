//! Opcode and status registries.
//!
//! ```text
//! command frame: opcode (u32, big-endian) | payload
//! reply frame:   status (u8)              | payload
//! ```

use std::fmt;

/// Binary command identifiers understood by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Opcode {
    GetVersion = 0x1000,
    SetSlot = 0x1001,
    GetSlot = 0x1002,
    Hf14aScan = 0x2000,
    Hf14aRaw = 0x2001,
    EmulatorStart = 0x3000,
    EmulatorStop = 0x3001,
    SetUid = 0x3002,
    SetSak = 0x3003,
    SetAtqa = 0x3004,
}

impl Opcode {
    /// Every registered opcode, in registry order.
    pub const ALL: [Opcode; 10] = [
        Opcode::GetVersion,
        Opcode::SetSlot,
        Opcode::GetSlot,
        Opcode::Hf14aScan,
        Opcode::Hf14aRaw,
        Opcode::EmulatorStart,
        Opcode::EmulatorStop,
        Opcode::SetUid,
        Opcode::SetSak,
        Opcode::SetAtqa,
    ];

    /// Numeric wire value.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Short mnemonic used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Opcode::GetVersion => "GET_VERSION",
            Opcode::SetSlot => "SET_SLOT",
            Opcode::GetSlot => "GET_SLOT",
            Opcode::Hf14aScan => "HF14A_SCAN",
            Opcode::Hf14aRaw => "HF14A_RAW",
            Opcode::EmulatorStart => "EMULATOR_START",
            Opcode::EmulatorStop => "EMULATOR_STOP",
            Opcode::SetUid => "SET_UID",
            Opcode::SetSak => "SET_SAK",
            Opcode::SetAtqa => "SET_ATQA",
        }
    }
}

impl TryFrom<u32> for Opcode {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Opcode::ALL
            .into_iter()
            .find(|op| op.code() == value)
            .ok_or(value)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:04X})", self.name(), self.code())
    }
}

/// Reply status codes.
///
/// Replies carry a raw status byte; values outside this table are passed
/// through undecoded and only rendered as hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    Error = 0x01,
    InvalidParam = 0x02,
    Timeout = 0x03,
}

impl Status {
    /// Look up a raw status byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Status::Ok),
            0x01 => Some(Status::Error),
            0x02 => Some(Status::InvalidParam),
            0x03 => Some(Status::Timeout),
            _ => None,
        }
    }

    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Ok => "OK",
            Status::Error => "ERROR",
            Status::InvalidParam => "INVALID_PARAM",
            Status::Timeout => "TIMEOUT",
        };
        f.write_str(name)
    }
}
