//! Platform-specific pointer position queries.
//!
//! Each platform implements [`CursorLocator`]; the right one is selected at
//! compile time and re-exported as `NativeCursorLocator`:
//!
//! | Module    | OS      | API used                          |
//! |-----------|---------|-----------------------------------|
//! | `windows` | Windows | `GetCursorPos`                    |
//! | `linux`   | Linux   | `XQueryPointer` (Xlib)            |
//! | `macos`   | macOS   | `CGEvent::location`               |
//!
//! [`FixedCursorLocator`] is always compiled so tests on any platform can use
//! it without a display.

use std::sync::Mutex;

use keyrelay_core::domain::ScreenPoint;

use crate::application::cursor::{CursorError, CursorLocator};

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "windows")]
pub use self::windows::WindowsCursorLocator as NativeCursorLocator;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "linux")]
pub use self::linux::LinuxCursorLocator as NativeCursorLocator;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "macos")]
pub use self::macos::MacosCursorLocator as NativeCursorLocator;

// ── Fixed locator (always compiled for tests) ─────────────────────────────────

/// A locator that reports a settable position and never touches the OS.
#[derive(Debug, Default)]
pub struct FixedCursorLocator {
    position: Mutex<ScreenPoint>,
}

impl FixedCursorLocator {
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            position: Mutex::new(ScreenPoint::new(x, y)),
        }
    }

    /// Moves the reported pointer, as if the user had moved the mouse.
    pub fn set(&self, x: i32, y: i32) {
        if let Ok(mut p) = self.position.lock() {
            *p = ScreenPoint::new(x, y);
        }
    }
}

impl CursorLocator for FixedCursorLocator {
    fn position(&self) -> Result<ScreenPoint, CursorError> {
        self.position
            .lock()
            .map(|p| *p)
            .map_err(|e| CursorError::Platform(e.to_string()))
    }
}
