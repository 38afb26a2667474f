//! Device wire protocol: command types, encoder, and decoder.

pub mod codec;
pub mod messages;

pub use codec::{decode_command, decode_stream, encode_command, mouse_sequence, ProtocolError};
pub use messages::{DeviceCommand, Opcode, WireStep, SCROLL_MAGNITUDE, SETTLE_DELAY};
