//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "CHAMELEON_TERM";

/// Config file name
const CONFIG_FILE_NAME: &str = "chameleon-term.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "CHAMELEON_TERM_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `CHAMELEON_TERM_CONFIG` environment variable (explicit path)
    /// 2. `./chameleon-term.toml` (current directory)
    /// 3. The platform config directory (`~/.config/chameleon-term/` on Linux)
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables override file values, and the result is validated.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = match config_path {
            Some(ref path) => load_from_file(path)?,
            None => Config::default(),
        };

        apply_env_overrides(&mut config)?;
        validate(&config)?;

        debug!(path = ?config_path, "configuration loaded");
        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        validate(&config)?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    ///
    /// Environment overrides still apply; if any is malformed, all are dropped.
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        if let Err(e) = apply_env_overrides(&mut config).and_then(|_| validate(&config)) {
            warn!(var = e.env_var(), error = %e, "ignoring environment overrides");
            config = Config::default();
        }

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Save the current configuration to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.config, path.as_ref())
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    get_default_config_path().filter(|path| path.exists())
}

/// Get the platform config directory for this application.
pub fn get_default_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "chameleon-term").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the default config file path for creating new config files.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn save_to_file(config: &Config, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Read `CHAMELEON_TERM_<key>` and parse it, if set.
fn env_value<T: FromStr>(key: &str, expected: &'static str) -> ConfigResult<Option<T>> {
    let var = format!("{ENV_PREFIX}_{key}");
    let Ok(value) = std::env::var(&var) else {
        return Ok(None);
    };
    match value.trim().parse() {
        Ok(parsed) => Ok(Some(parsed)),
        Err(_) => Err(ConfigError::Env {
            var,
            value,
            expected,
        }),
    }
}

/// Apply environment variable overrides to the configuration.
///
/// Variables follow the pattern `CHAMELEON_TERM_<SECTION>_<KEY>`, for example
/// `CHAMELEON_TERM_LINK_BAUD_RATE=921600`.
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Link
    if let Some(val) = env_value("LINK_BAUD_RATE", "baud rate")? {
        config.link.baud_rate = val;
    }
    if let Some(val) = env_value("LINK_READ_TIMEOUT_MS", "timeout")? {
        config.link.read_timeout_ms = val;
    }

    // Radio
    if let Some(val) = env_value::<String>("RADIO_NAME_FILTER", "name filter")? {
        config.radio.name_filter = val;
    }
    if let Some(val) = env_value("RADIO_SERVICE_UUID", "service uuid")? {
        config.radio.service_uuid = val;
    }

    // Device
    if let Some(val) = env_value("DEVICE_VERSION_TIMEOUT_MS", "timeout")? {
        config.device.version_timeout_ms = val;
    }
    if let Some(val) = env_value("DEVICE_SCAN_TIMEOUT_MS", "timeout")? {
        config.device.scan_timeout_ms = val;
    }
    if let Some(val) = env_value("DEVICE_SET_TIMEOUT_MS", "timeout")? {
        config.device.set_timeout_ms = val;
    }
    if let Some(val) = env_value("DEVICE_RAW_TIMEOUT_MS", "timeout")? {
        config.device.raw_timeout_ms = val;
    }

    // Terminal
    if let Some(val) = env_value("TERMINAL_HISTORY_SIZE", "history size")? {
        config.terminal.history_size = val;
    }
    if let Some(val) = env_value("TERMINAL_OUTPUT_LIMIT", "output limit")? {
        config.terminal.output_limit = val;
    }

    // Logging
    if let Some(val) = env_value::<String>("LOGGING_LEVEL", "log level")? {
        config.logging.level = val;
    }

    Ok(())
}

/// Reject values the runtime cannot work with.
fn validate(config: &Config) -> ConfigResult<()> {
    const ZERO: &str = "must be greater than zero";

    let link = &config.link;
    let terminal = &config.terminal;
    let checks = [
        ("link", "baud_rate", link.baud_rate == 0),
        ("link", "read_timeout_ms", link.read_timeout_ms == 0),
        ("link", "read_buffer", link.read_buffer == 0),
        ("link", "inbound_capacity", link.inbound_capacity == 0),
        ("terminal", "history_size", terminal.history_size == 0),
        ("terminal", "output_limit", terminal.output_limit == 0),
    ];

    match checks.into_iter().find(|(_, _, failed)| *failed) {
        Some((section, key, _)) => Err(ConfigError::invalid(section, key, ZERO)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_default_loader() {
        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().link.baud_rate, 115_200);
        assert!(loader.config_path.is_none());
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("CHAMELEON_TERM_LINK_BAUD_RATE", "921600");
        env::set_var("CHAMELEON_TERM_DEVICE_SCAN_TIMEOUT_MS", "250");

        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().link.baud_rate, 921_600);
        assert_eq!(loader.config().device.scan_timeout_ms, 250);

        env::remove_var("CHAMELEON_TERM_LINK_BAUD_RATE");
        env::remove_var("CHAMELEON_TERM_DEVICE_SCAN_TIMEOUT_MS");
    }

    #[test]
    #[serial]
    fn test_bad_env_value_is_reported() {
        env::set_var("CHAMELEON_TERM_TERMINAL_HISTORY_SIZE", "lots");
        let mut config = Config::default();
        let err = apply_env_overrides(&mut config).unwrap_err();
        assert!(matches!(err, ConfigError::Env { ref value, .. } if value == "lots"));
        assert_eq!(err.env_var(), Some("CHAMELEON_TERM_TERMINAL_HISTORY_SIZE"));
        env::remove_var("CHAMELEON_TERM_TERMINAL_HISTORY_SIZE");
    }

    #[test]
    #[serial]
    fn test_load_from_file_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chameleon-term.toml");
        std::fs::write(&path, "[terminal]\nhistory_size = 20\n").unwrap();

        let loader = ConfigLoader::load_from(&path).unwrap();
        assert_eq!(loader.config().terminal.history_size, 20);
        assert_eq!(loader.config_path.as_deref(), Some(path.as_path()));

        let copy = dir.path().join("nested").join("copy.toml");
        loader.save_to(&copy).unwrap();
        let reloaded = ConfigLoader::load_from(&copy).unwrap();
        assert_eq!(reloaded.config(), loader.config());
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let mut config = Config::default();
        config.link.inbound_capacity = 0;
        let err = validate(&config).unwrap_err();
        assert_eq!(err.to_string(), "[link] inbound_capacity must be greater than zero");
    }

    #[test]
    #[serial]
    fn test_missing_file_is_read_error() {
        let err = ConfigLoader::load_from("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    #[serial]
    fn test_malformed_file_names_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chameleon-term.toml");
        std::fs::write(&path, "[link\nbaud_rate = ").unwrap();

        let err = ConfigLoader::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { path: ref p, .. } if p == &path));
        assert!(err.to_string().contains("chameleon-term.toml"));
    }
}
