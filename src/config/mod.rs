//! Configuration for the terminal.
//!
//! TOML-based, with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! 1. `CHAMELEON_TERM_CONFIG` environment variable (explicit path)
//! 2. `./chameleon-term.toml` (current directory)
//! 3. The platform config directory, e.g. `~/.config/chameleon-term/chameleon-term.toml`
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is `CHAMELEON_TERM_<SECTION>_<KEY>`:
//! - `CHAMELEON_TERM_LINK_BAUD_RATE=921600`
//! - `CHAMELEON_TERM_DEVICE_SCAN_TIMEOUT_MS=20000`
//! - `CHAMELEON_TERM_RADIO_NAME_FILTER=ultra`
//!
//! # Example
//!
//! ```rust,no_run
//! use chameleon_term::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load()?;
//! println!("Scan timeout: {:?}", loader.config().device.scan_timeout());
//! # Ok::<(), chameleon_term::config::ConfigError>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{
    Config, DeviceConfig, LinkConfig, LogFormat, LoggingConfig, RadioConfig, TerminalConfig,
    SPP_SERVICE_UUID,
};
