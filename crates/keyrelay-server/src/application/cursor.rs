//! Cursor position capability.
//!
//! Mouse requests carry absolute screen targets, but the device only moves
//! the pointer relatively.  The dispatcher asks a [`CursorLocator`] where the
//! pointer is right now and sends the difference.

use keyrelay_core::domain::ScreenPoint;
use thiserror::Error;

/// Error type for cursor queries.
#[derive(Debug, Error)]
pub enum CursorError {
    /// The OS call to read the pointer position failed.
    #[error("cursor query failed: {0}")]
    Platform(String),
}

/// Reads the current on-screen pointer position.
///
/// OS-specific implementations live in `infrastructure::cursor`.
#[cfg_attr(test, mockall::automock)]
pub trait CursorLocator: Send + Sync {
    /// Returns the pointer position in screen pixels, origin top-left.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::Platform`] if the position cannot be read.
    fn position(&self) -> Result<ScreenPoint, CursorError>;
}
