//! Device-bound command types and wire constants.
//!
//! Wire format: one opcode byte followed by a fixed-size payload.  Multi-byte
//! integers are little-endian, as the firmware reads them straight into an
//! `int16_t`.
//!
//! | Opcode        | Value | Payload                          |
//! |---------------|-------|----------------------------------|
//! | `KeyDown`     | 1     | key code (1 byte)                |
//! | `KeyUp`       | 2     | key code (1 byte)                |
//! | `MouseMove`   | 3     | dx (i16 LE) + dy (i16 LE)        |
//! | `MouseClick`  | 4     | none                             |
//! | `MouseScroll` | 5     | magnitude (i16 LE)               |
//!
//! The link is one-way: the device never acknowledges a command.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::MotionDelta;
use crate::keymap::KeyCode;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Scroll magnitude sent for a scroll-down action.
pub const SCROLL_MAGNITUDE: i16 = 1000;

/// Default pause between a pointer move and the click/scroll that depends on it.
///
/// The device has no "motion complete" signal, so this is a heuristic.
pub const SETTLE_DELAY: Duration = Duration::from_millis(80);

// ── Opcodes ───────────────────────────────────────────────────────────────────

/// First byte of every device command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    KeyDown = 1,
    KeyUp = 2,
    MouseMove = 3,
    MouseClick = 4,
    MouseScroll = 5,
}

impl Opcode {
    /// Number of payload bytes that follow this opcode.
    pub fn payload_len(self) -> usize {
        match self {
            Opcode::KeyDown | Opcode::KeyUp => 1,
            Opcode::MouseMove => 4,
            Opcode::MouseClick => 0,
            Opcode::MouseScroll => 2,
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Opcode::KeyDown),
            2 => Ok(Opcode::KeyUp),
            3 => Ok(Opcode::MouseMove),
            4 => Ok(Opcode::MouseClick),
            5 => Ok(Opcode::MouseScroll),
            _ => Err(()),
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// A single logical command for the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceCommand {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    MouseMove(MotionDelta),
    MouseClick,
    MouseScroll(i16),
}

impl DeviceCommand {
    /// Returns the opcode this command is sent with.
    pub fn opcode(&self) -> Opcode {
        match self {
            DeviceCommand::KeyDown(_) => Opcode::KeyDown,
            DeviceCommand::KeyUp(_) => Opcode::KeyUp,
            DeviceCommand::MouseMove(_) => Opcode::MouseMove,
            DeviceCommand::MouseClick => Opcode::MouseClick,
            DeviceCommand::MouseScroll(_) => Opcode::MouseScroll,
        }
    }

    /// Total encoded size (opcode + payload).
    pub fn encoded_len(&self) -> usize {
        1 + self.opcode().payload_len()
    }
}

/// One step of a multi-command plan, e.g. move-then-click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireStep {
    /// Write this command to the device.
    Write(DeviceCommand),
    /// Pause for the settle delay before the next write.
    Settle,
}
