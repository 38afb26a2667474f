//! Key identifiers and the key → device-code table.
//!
//! The RPC surface speaks in abstract [`Key`]s; the device speaks in one-byte
//! [`KeyCode`]s.  [`KeyTable`] is the bridge between the two.  It is built
//! once at startup and only read afterwards, so it can be shared across
//! threads without a lock.

pub mod device;
pub mod key;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use key::{Key, KEY_COUNT};

/// Errors produced while resolving keys.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum KeymapError {
    /// The key id is not part of the [`Key`] enumeration, or the table has no
    /// entry for it.
    #[error("unknown key id: {0}")]
    UnknownKey(i32),
}

/// One-byte key code understood by the device firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyCode(pub u8);

impl KeyCode {
    /// Returns the raw byte.
    pub fn as_u8(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for KeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

/// Immutable lookup table from [`Key`] to [`KeyCode`].
///
/// # Examples
///
/// ```rust
/// use keyrelay_core::keymap::{Key, KeyCode, KeyTable};
///
/// let table = KeyTable::device();
/// assert_eq!(table.resolve(Key::A), Ok(KeyCode(b'a')));
/// assert_eq!(table.resolve_id(0), Ok(KeyCode(b'a')));
/// assert!(table.resolve_id(999).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct KeyTable {
    codes: [Option<KeyCode>; KEY_COUNT],
}

impl KeyTable {
    /// Builds the table for the input-emulation firmware.
    pub fn device() -> Self {
        let mut codes = [None; KEY_COUNT];
        for key in Key::ALL {
            codes[key.index()] = Some(KeyCode(device::device_code(key)));
        }
        Self { codes }
    }

    /// Resolves `key` to its device code.
    ///
    /// # Errors
    ///
    /// Returns [`KeymapError::UnknownKey`] if the table has no entry for `key`.
    /// The device table is total, so this only happens for hand-built tables.
    pub fn resolve(&self, key: Key) -> Result<KeyCode, KeymapError> {
        self.codes[key.index()].ok_or(KeymapError::UnknownKey(key.id()))
    }

    /// Resolves a numeric wire id straight to a device code.
    ///
    /// # Errors
    ///
    /// Returns [`KeymapError::UnknownKey`] if `id` is not a known [`Key`].
    pub fn resolve_id(&self, id: i32) -> Result<KeyCode, KeymapError> {
        self.resolve(Key::try_from(id)?)
    }

    /// Number of keys with an entry.
    pub fn len(&self) -> usize {
        self.codes.iter().filter(|c| c.is_some()).count()
    }

    /// Returns `true` if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for KeyTable {
    fn default() -> Self {
        Self::device()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
