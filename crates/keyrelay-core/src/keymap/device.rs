//! Key codes understood by the input-emulation firmware.
//!
//! The device runs an Arduino-style keyboard sketch: printable keys are sent
//! as their lowercase ASCII character and the remaining keys use the
//! firmware's `KEY_*` constants in the 0x80–0xE0 range.
//!
//! This table is a compatibility contract with the firmware.  Changing a
//! value here changes which physical key the device emits.

use super::key::{Key, KEY_COUNT};

/// Device code for every [`Key`], in wire-id order.
///
/// Indexed by [`Key::index`]; `DEVICE_CODES[k.index()]` is the byte sent after
/// the key-down / key-up opcode.
pub(crate) const DEVICE_CODES: [u8; KEY_COUNT] = [
    // Letters
    b'a', b'b', b'c', b'd', b'e', b'f', b'g', b'h', b'i', b'j', b'k', b'l', b'm',
    b'n', b'o', b'p', b'q', b'r', b's', b't', b'u', b'v', b'w', b'x', b'y', b'z',
    // Digits
    b'0', b'1', b'2', b'3', b'4', b'5', b'6', b'7', b'8', b'9',
    // F1–F12
    0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0xCA, 0xCB, 0xCC, 0xCD,
    // Up, Down, Left, Right
    0xDA, 0xD9, 0xD8, 0xD7,
    // Home, End, PageUp, PageDown, Insert, Delete
    0xD2, 0xD5, 0xD3, 0xD6, 0xD1, 0xD4,
    // Ctrl, Enter, Space
    0x80, 0xE0, b' ',
    // Tilde, Quote, Semicolon, Comma, Period, Slash
    b'`', b'\'', b';', b',', b'.', b'/',
    // Esc, Shift, Alt
    0xB1, 0x81, 0x82,
];

/// Returns the device code for `key`.
pub(crate) fn device_code(key: Key) -> u8 {
    DEVICE_CODES[key.index()]
}
