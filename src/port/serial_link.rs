//! Blocking link handle backed by the `serialport` crate.
//!
//! Used for both USB CDC adapters and Bluetooth SPP peers that the OS exposes
//! as serial devices (`/dev/rfcomm*`, `COMx`, `/dev/cu.*`).

use super::error::PortError;
use super::traits::{LinkAdapter, LinkSettings};
use std::io::{Read, Write};
use std::time::Duration;

/// Link handle wrapping `serialport::SerialPort`.
pub struct SerialLink {
    port: Box<dyn serialport::SerialPort>,
    name: String,
}

impl SerialLink {
    /// Open a serial device with the given settings.
    ///
    /// # Example
    /// ```no_run
    /// use chameleon_term::port::{LinkSettings, SerialLink};
    ///
    /// let link = SerialLink::open("/dev/ttyACM0", &LinkSettings::default())?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(path: &str, settings: &LinkSettings) -> Result<Self, PortError> {
        let port = serialport::new(path, settings.baud_rate)
            .data_bits(settings.data_bits.into())
            .flow_control(settings.flow_control.into())
            .parity(settings.parity.into())
            .stop_bits(settings.stop_bits.into())
            .timeout(settings.read_timeout)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => PortError::not_found(path),
                serialport::ErrorKind::InvalidInput => PortError::config(e.to_string()),
                _ => PortError::Serial(e),
            })?;

        Ok(Self {
            port,
            name: path.to_string(),
        })
    }
}

impl LinkAdapter for SerialLink {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        match self.port.read(buffer) {
            // A serial read of zero bytes means the device went away.
            Ok(0) => Err(PortError::Closed),
            Ok(n) => Ok(n),
            Err(e) => Err(PortError::Io(e)),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.port.set_timeout(timeout).map_err(PortError::Serial)
    }

    fn clear_buffers(&mut self) -> Result<(), PortError> {
        self.port
            .clear(serialport::ClearBuffer::All)
            .map_err(PortError::Serial)
    }

    fn try_clone_link(&self) -> Result<Box<dyn LinkAdapter>, PortError> {
        let port = self.port.try_clone()?;
        Ok(Box::new(Self {
            port,
            name: self.name.clone(),
        }))
    }
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink")
            .field("name", &self.name)
            .field("baud_rate", &self.port.baud_rate().ok())
            .finish()
    }
}
