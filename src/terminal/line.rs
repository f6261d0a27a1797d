//! Rendered output lines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What produced an output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// Echo of what the operator typed
    Command,
    /// Data from the device
    Response,
    Error,
    Info,
    /// Plain spacer or passthrough text
    Output,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalLine {
    pub text: String,
    pub kind: LineKind,
    pub timestamp: DateTime<Utc>,
}

impl TerminalLine {
    pub fn new(text: impl Into<String>, kind: LineKind) -> Self {
        Self {
            text: text.into(),
            kind,
            timestamp: Utc::now(),
        }
    }

    pub fn command(text: impl Into<String>) -> Self {
        Self::new(text, LineKind::Command)
    }

    pub fn response(text: impl Into<String>) -> Self {
        Self::new(text, LineKind::Response)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, LineKind::Error)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(text, LineKind::Info)
    }

    pub fn blank() -> Self {
        Self::new("", LineKind::Output)
    }
}

impl fmt::Display for TerminalLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
