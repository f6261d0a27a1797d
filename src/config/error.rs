//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Why a `chameleon-term.toml` or a `CHAMELEON_TERM_*` override was rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file {} is not valid TOML: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot render config as TOML: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("cannot write config file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A loaded value the link, device or terminal cannot run with.
    #[error("[{section}] {key} {reason}")]
    Invalid {
        section: &'static str,
        key: &'static str,
        reason: &'static str,
    },

    /// An environment override that does not parse as its key's type.
    #[error("{var}={value:?} is not a valid {expected}")]
    Env {
        var: String,
        value: String,
        expected: &'static str,
    },
}

impl ConfigError {
    pub fn invalid(section: &'static str, key: &'static str, reason: &'static str) -> Self {
        Self::Invalid {
            section,
            key,
            reason,
        }
    }

    /// Name of the offending `CHAMELEON_TERM_*` variable, if any.
    pub fn env_var(&self) -> Option<&str> {
        match self {
            Self::Env { var, .. } => Some(var),
            _ => None,
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
