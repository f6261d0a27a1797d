use crate::config::ConfigError;
use crate::connection::SessionError;
use crate::device::DeviceError;
use std::time::Duration;
use thiserror::Error;

/// A specialized `Result` type for terminal-level operations.
pub type AppResult<T> = Result<T, AppError>;

/// Unified application error type.
///
/// Every failure the operator can see is one of these; the `Display` text is
/// exactly what the terminal prints.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid command format")]
    Parse,

    #[error("Unknown command: {keyword}")]
    UnknownCommand {
        keyword: String,
        suggestions: Vec<String>,
    },

    #[error("Command not supported: {0}")]
    Unsupported(String),

    #[error("Device not connected")]
    NotConnected,

    #[error("Failed to send command: {0}")]
    Transport(String),

    #[error("No response from device within {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("{0}")]
    Device(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("An I/O error occurred: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// The follow-up hint for an unknown command, if any suggestions exist.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::UnknownCommand { suggestions, .. } if !suggestions.is_empty() => {
                Some(format!("Did you mean: {}", suggestions.join(", ")))
            }
            _ => None,
        }
    }
}

// `From` conversions so `?` maps layer errors onto what the operator sees.
impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotConnected => AppError::NotConnected,
            SessionError::Timeout(timeout) => AppError::Timeout(timeout),
            SessionError::Connect(e) | SessionError::Send(e) => AppError::Transport(e.to_string()),
            SessionError::LinkClosed => {
                AppError::Transport("link closed before a reply arrived".to_string())
            }
        }
    }
}

impl From<DeviceError> for AppError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::Session(e) => e.into(),
            other => AppError::Device(other.to_string()),
        }
    }
}
