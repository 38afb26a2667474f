//! Locating the input-emulation device among the host's serial ports.
//!
//! The firmware enumerates as a USB CDC device.  On macOS each device shows up
//! twice (`cu.*` and `tty.*`) and boards flashed with the HID sketch carry
//! `HID` in their name; those are preferred.  Ranking, best first:
//!
//! 1. `cu.usbmodem*HID*`
//! 2. `tty.usbmodem*HID*`
//! 3. `cu.usbmodem*`, `cu.usbserial*`
//! 4. `tty.usbmodem*`, `tty.usbserial*`
//! 5. `ttyACM*`, `ttyUSB*` (Linux)
//! 6. `COM*` (Windows)
//!
//! Anything else is ignored.  Ties break on the port name.

use tracing::{debug, info};

use crate::application::device::ChannelError;

/// Returns the rank of `port` (lower is better), or `None` if it cannot be
/// the device.
pub fn rank_port(port: &str) -> Option<u8> {
    let name = port.rsplit('/').next().unwrap_or(port);
    let hid = name.contains("HID");

    if name.starts_with("cu.usbmodem") && hid {
        Some(0)
    } else if name.starts_with("tty.usbmodem") && hid {
        Some(1)
    } else if name.starts_with("cu.usbmodem") || name.starts_with("cu.usbserial") {
        Some(2)
    } else if name.starts_with("tty.usbmodem") || name.starts_with("tty.usbserial") {
        Some(3)
    } else if name.starts_with("ttyACM") || name.starts_with("ttyUSB") {
        Some(4)
    } else if name.starts_with("COM") {
        Some(5)
    } else {
        None
    }
}

/// Picks the best candidate from `ports`.
pub fn select_port<'a, I>(ports: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    ports
        .into_iter()
        .filter_map(|p| rank_port(p).map(|r| (r, p)))
        .min()
        .map(|(_, p)| p.to_string())
}

/// Enumerates the host's serial ports and picks the device.
///
/// # Errors
///
/// Returns [`ChannelError::DeviceUnavailable`] if enumeration fails or no
/// port looks like the device.
pub fn discover_port() -> Result<String, ChannelError> {
    let ports = serialport::available_ports()
        .map_err(|e| ChannelError::DeviceUnavailable(format!("cannot enumerate serial ports: {e}")))?;
    debug!(
        candidates = ?ports.iter().map(|p| p.port_name.as_str()).collect::<Vec<_>>(),
        "serial ports found"
    );

    let chosen = select_port(ports.iter().map(|p| p.port_name.as_str())).ok_or_else(|| {
        ChannelError::DeviceUnavailable(
            "no serial port matches usbmodem/usbserial/ttyACM/ttyUSB/COM".to_string(),
        )
    })?;
    info!(port = %chosen, "input device discovered");
    Ok(chosen)
}
