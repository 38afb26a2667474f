//! Encoder and decoder for device commands.
//!
//! Encoding is infallible: every [`DeviceCommand`] has exactly one byte
//! representation.  Decoding is the inverse and is used by test doubles and
//! diagnostics to turn a captured byte stream back into commands.

use thiserror::Error;

use crate::domain::{MotionDelta, MouseAction};
use crate::keymap::KeyCode;
use crate::protocol::messages::{DeviceCommand, Opcode, WireStep, SCROLL_MAGNITUDE};

/// Errors that can occur while decoding a device byte stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The slice ends before the command is complete.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The first byte is not a known opcode.
    #[error("unknown opcode: 0x{0:02X}")]
    UnknownOpcode(u8),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes `cmd` into the bytes written to the serial link.
///
/// # Examples
///
/// ```rust
/// use keyrelay_core::domain::MotionDelta;
/// use keyrelay_core::keymap::KeyCode;
/// use keyrelay_core::protocol::{encode_command, DeviceCommand};
///
/// assert_eq!(encode_command(&DeviceCommand::KeyDown(KeyCode(b'a'))), vec![1, b'a']);
/// assert_eq!(
///     encode_command(&DeviceCommand::MouseMove(MotionDelta::new(183, -16))),
///     vec![3, 0xB7, 0x00, 0xF0, 0xFF],
/// );
/// ```
pub fn encode_command(cmd: &DeviceCommand) -> Vec<u8> {
    let mut buf = Vec::with_capacity(cmd.encoded_len());
    buf.push(cmd.opcode() as u8);
    match *cmd {
        DeviceCommand::KeyDown(code) | DeviceCommand::KeyUp(code) => buf.push(code.as_u8()),
        DeviceCommand::MouseMove(delta) => {
            buf.extend_from_slice(&delta.dx.to_le_bytes());
            buf.extend_from_slice(&delta.dy.to_le_bytes());
        }
        DeviceCommand::MouseClick => {}
        DeviceCommand::MouseScroll(magnitude) => buf.extend_from_slice(&magnitude.to_le_bytes()),
    }
    buf
}

/// Decodes one command from the start of `bytes`.
///
/// Returns the command and the number of bytes it occupied.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the opcode is unknown or the payload is cut short.
pub fn decode_command(bytes: &[u8]) -> Result<(DeviceCommand, usize), ProtocolError> {
    let Some(&first) = bytes.first() else {
        return Err(ProtocolError::InsufficientData { needed: 1, available: 0 });
    };
    let opcode = Opcode::try_from(first).map_err(|_| ProtocolError::UnknownOpcode(first))?;
    let total = 1 + opcode.payload_len();
    if bytes.len() < total {
        return Err(ProtocolError::InsufficientData {
            needed: total,
            available: bytes.len(),
        });
    }

    let p = &bytes[1..total];
    let cmd = match opcode {
        Opcode::KeyDown => DeviceCommand::KeyDown(KeyCode(p[0])),
        Opcode::KeyUp => DeviceCommand::KeyUp(KeyCode(p[0])),
        Opcode::MouseMove => DeviceCommand::MouseMove(MotionDelta::new(
            i16::from_le_bytes([p[0], p[1]]),
            i16::from_le_bytes([p[2], p[3]]),
        )),
        Opcode::MouseClick => DeviceCommand::MouseClick,
        Opcode::MouseScroll => DeviceCommand::MouseScroll(i16::from_le_bytes([p[0], p[1]])),
    };
    Ok((cmd, total))
}

/// Decodes a whole byte stream into commands.
///
/// # Errors
///
/// Returns the first [`ProtocolError`] encountered; trailing partial commands
/// are an error.
pub fn decode_stream(mut bytes: &[u8]) -> Result<Vec<DeviceCommand>, ProtocolError> {
    let mut out = Vec::new();
    while !bytes.is_empty() {
        let (cmd, used) = decode_command(bytes)?;
        out.push(cmd);
        bytes = &bytes[used..];
    }
    Ok(out)
}

/// Builds the ordered write plan for a mouse request.
///
/// A bare move is a single write.  Click and scroll first move the pointer,
/// then wait for it to settle, then send the action.
pub fn mouse_sequence(action: MouseAction, delta: MotionDelta) -> Vec<WireStep> {
    let motion = WireStep::Write(DeviceCommand::MouseMove(delta));
    match action {
        MouseAction::Move => vec![motion],
        MouseAction::Click => vec![
            motion,
            WireStep::Settle,
            WireStep::Write(DeviceCommand::MouseClick),
        ],
        MouseAction::ScrollDown => vec![
            motion,
            WireStep::Settle,
            WireStep::Write(DeviceCommand::MouseScroll(SCROLL_MAGNITUDE)),
        ],
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
