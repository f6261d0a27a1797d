//! Configuration schema definitions.
//!
//! Every section has serde defaults, so a partial file (or none) is valid.

use crate::port::{DataBits, FlowControl, LinkSettings, Parity, StopBits};
use crate::protocol::Opcode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Serial Port Profile service class, the well-known RFCOMM service id.
pub const SPP_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_1101_0000_1000_8000_0080_5F9B_34FB);

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Line settings shared by both link kinds
    pub link: LinkConfig,
    /// Radio peer discovery
    pub radio: RadioConfig,
    /// Per-operation reply deadlines
    pub device: DeviceConfig,
    /// Terminal facade
    pub terminal: TerminalConfig,
    /// Logging
    pub logging: LoggingConfig,
}

/// Link section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    /// Reader poll interval; bounds how long a disconnect takes to be noticed
    pub read_timeout_ms: u64,
    /// Largest chunk handed up per read
    pub read_buffer: usize,
    /// Frames buffered between the reader thread and the session
    pub inbound_capacity: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            read_timeout_ms: 50,
            read_buffer: 1024,
            inbound_capacity: 64,
        }
    }
}

impl LinkConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Settings passed to a link when it is opened.
    pub fn settings(&self) -> LinkSettings {
        LinkSettings {
            baud_rate: self.baud_rate,
            data_bits: self.data_bits,
            flow_control: self.flow_control,
            parity: self.parity,
            stop_bits: self.stop_bits,
            read_timeout: self.read_timeout(),
        }
    }
}

/// Radio section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    /// Case-insensitive substring a bonded peer's name must contain
    pub name_filter: String,
    /// RFCOMM service to open on the peer
    pub service_uuid: Uuid,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            name_filter: "chameleon".to_string(),
            service_uuid: SPP_SERVICE_UUID,
        }
    }
}

/// Device section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub version_timeout_ms: u64,
    pub scan_timeout_ms: u64,
    /// Slot, UID and the other setters
    pub set_timeout_ms: u64,
    pub raw_timeout_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            version_timeout_ms: 5_000,
            scan_timeout_ms: 10_000,
            set_timeout_ms: 3_000,
            raw_timeout_ms: 5_000,
        }
    }
}

impl DeviceConfig {
    pub fn version_timeout(&self) -> Duration {
        Duration::from_millis(self.version_timeout_ms)
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_millis(self.scan_timeout_ms)
    }

    pub fn set_timeout(&self) -> Duration {
        Duration::from_millis(self.set_timeout_ms)
    }

    pub fn raw_timeout(&self) -> Duration {
        Duration::from_millis(self.raw_timeout_ms)
    }

    /// Reply deadline for a command, chosen by its opcode.
    pub fn deadline_for(&self, opcode: Opcode) -> Duration {
        match opcode {
            Opcode::GetVersion => self.version_timeout(),
            Opcode::Hf14aScan => self.scan_timeout(),
            Opcode::Hf14aRaw => self.raw_timeout(),
            Opcode::SetSlot
            | Opcode::GetSlot
            | Opcode::SetUid
            | Opcode::SetSak
            | Opcode::SetAtqa
            | Opcode::EmulatorStart
            | Opcode::EmulatorStop => self.set_timeout(),
        }
    }
}

/// Terminal section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Prefix echoed before each executed line
    pub prompt: String,
    /// Executed lines remembered for previous/next navigation
    pub history_size: usize,
    /// Output lines kept before the oldest are dropped
    pub output_limit: usize,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            prompt: "proxmark3> ".to_string(),
            history_size: 100,
            output_limit: 1000,
        }
    }
}

/// Logging section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset: "trace" ... "error"
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line with colors
    #[default]
    Pretty,
    /// Single line per event
    Compact,
}
