//! Maps dialect commands onto device opcodes.
//!
//! Only a small subset translates; everything else is reported as
//! unsupported, including many commands the catalog recognises.

use super::hex::parse_hex_args;
use super::parser::TextCommand;
use crate::protocol::{ProtocolCommand, Slot};
use thiserror::Error;
use tracing::debug;

/// Why a command produced no device frame.
///
/// Both variants are shown to the operator as "Command not supported"; the
/// split exists for logs and tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// No binary mapping exists for this command.
    #[error("no device mapping for '{0}'")]
    Unsupported(String),

    /// The command maps, but its arguments were rejected.
    #[error("invalid argument for '{command}': {reason}")]
    InvalidArgument { command: String, reason: String },
}

impl TranslateError {
    fn invalid(cmd: &TextCommand, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            command: cmd.full_command(),
            reason: reason.into(),
        }
    }
}

/// Translate a parsed command into a device command.
pub fn translate(cmd: &TextCommand) -> Result<ProtocolCommand, TranslateError> {
    let unsupported = || TranslateError::Unsupported(cmd.full_command());

    let translated = match (cmd.keyword.as_str(), cmd.arg(0)) {
        ("hw", Some("version" | "status")) => ProtocolCommand::get_version(),

        ("hf", Some("search")) => ProtocolCommand::hf14a_scan(),
        ("hf", Some("14a")) => match cmd.arg(1) {
            Some("info" | "reader") => ProtocolCommand::hf14a_scan(),
            Some("raw") => {
                let data = parse_hex_args(&cmd.args[2..])
                    .ok_or_else(|| TranslateError::invalid(cmd, "expected an even number of hex digits"))?;
                ProtocolCommand::hf14a_raw(data)
            }
            _ => return Err(unsupported()),
        },

        ("data", Some("setslot")) => {
            let slot = cmd
                .arg(1)
                .ok_or_else(|| TranslateError::invalid(cmd, "missing slot number"))?
                .parse::<Slot>()
                .map_err(|e| TranslateError::invalid(cmd, e.to_string()))?;
            ProtocolCommand::set_slot(slot)
        }

        _ => return Err(unsupported()),
    };

    debug!(command = %cmd, opcode = %translated.opcode(), "translated command");
    Ok(translated)
}
