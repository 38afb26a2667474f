//! Serial channel backed by the `serialport` crate.

use std::io::Write;
use std::time::Duration;

use serialport::SerialPort;
use tracing::info;

use crate::application::device::{ChannelError, SerialChannel};

/// Write timeout for a single command.  Commands are at most five bytes, so a
/// write that takes longer than this means the device is gone.  This also
/// caps how long one write can hold the device link.
const WRITE_TIMEOUT: Duration = Duration::from_millis(500);

/// A physical serial port to the input-emulation device.
pub struct SerialPortChannel {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialPortChannel {
    /// Opens `path` at `baud_rate`.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::DeviceUnavailable`] if the port cannot be opened.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, ChannelError> {
        let port = serialport::new(path, baud_rate)
            .timeout(WRITE_TIMEOUT)
            .open()
            .map_err(|e| ChannelError::DeviceUnavailable(format!("{path}: {e}")))?;
        info!(port = path, baud_rate, "serial device opened");
        Ok(Self {
            port,
            name: path.to_string(),
        })
    }

    /// Port path this channel was opened on.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl SerialChannel for SerialPortChannel {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), ChannelError> {
        self.port
            .write_all(bytes)
            .and_then(|()| self.port.flush())
            .map_err(|e| ChannelError::WriteFailure(format!("{}: {e}", self.name)))
    }
}
