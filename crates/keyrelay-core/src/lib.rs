//! # keyrelay-core
//!
//! Pure building blocks for the keyrelay input relay:
//!
//! - **`keymap`** – the closed set of abstract [`Key`]s accepted over RPC and
//!   the [`KeyTable`] that maps each one to the single-byte code the
//!   input-emulation firmware understands.
//! - **`protocol`** – the device-bound wire format.  [`DeviceCommand`]s are
//!   encoded to an opcode byte plus a small little-endian payload, and
//!   [`mouse_sequence`] plans the move/settle/action order for mouse requests.
//! - **`domain`** – screen points, saturating motion deltas, mouse actions,
//!   and the generation counter used to tag key release timers.
//!
//! Nothing in this crate touches a serial port, a socket, or the OS.

pub mod domain;
pub mod keymap;
pub mod protocol;

pub use domain::{CoordinateMode, GenerationCounter, MotionDelta, MouseAction, ScreenPoint};
pub use keymap::{Key, KeyCode, KeyTable, KeymapError};
pub use protocol::{
    decode_command, encode_command, mouse_sequence, DeviceCommand, ProtocolError, WireStep,
};
