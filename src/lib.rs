//! Chameleon terminal library
//!
//! Executes Proxmark-dialect text commands against a Chameleon Ultra style
//! device over USB serial or a radio SPP link.
//!
//! # Modules
//!
//! - `command`: dialect catalog, parser and translator
//! - `protocol`: opcode/status registries and the frame codec
//! - `port`: raw blocking link handles (serial device, mock)
//! - `transport`: USB and radio transports behind one async contract
//! - `connection`: the connection session and reply correlation
//! - `device`: typed device operations with deadlines
//! - `terminal`: the line-in, lines-out facade with history
//! - `config`: configuration management with TOML support
//! - `error`: operator-facing error type

pub mod command;
pub mod config;
pub mod connection;
pub mod device;
pub mod error;
pub mod port;
pub mod protocol;
pub mod terminal;
pub mod transport;

// Re-export commonly used types for convenience
pub use command::{parse, translate, CommandCategory, TextCommand, TranslateError};
pub use connection::{ConnectionSession, ConnectionState, SessionError};
pub use device::{DeviceError, DeviceSession};
pub use error::{AppError, AppResult};
pub use port::{LinkAdapter, LinkSettings, MockLink, PortError};
pub use protocol::{decode, encode, Opcode, ProtocolCommand, ProtocolResponse, Slot, Status};
pub use terminal::{Directive, Execution, LineKind, Terminal, TerminalLine};
pub use transport::{
    LinkTransports, MockBus, Transport, TransportError, TransportFactory, TransportKind,
};

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
