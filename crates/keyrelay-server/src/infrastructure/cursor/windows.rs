//! Windows pointer query via `GetCursorPos`.

use keyrelay_core::domain::ScreenPoint;
use windows::Win32::Foundation::POINT;
use windows::Win32::UI::WindowsAndMessaging::GetCursorPos;

use crate::application::cursor::{CursorError, CursorLocator};

/// Windows implementation of [`CursorLocator`].
#[derive(Debug, Default)]
pub struct WindowsCursorLocator;

impl WindowsCursorLocator {
    pub fn new() -> Self {
        Self
    }
}

impl CursorLocator for WindowsCursorLocator {
    fn position(&self) -> Result<ScreenPoint, CursorError> {
        let mut point = POINT::default();
        // SAFETY: `point` is a valid, writable POINT for the duration of the call.
        unsafe { GetCursorPos(&mut point) }
            .map_err(|e| CursorError::Platform(format!("GetCursorPos: {e}")))?;
        Ok(ScreenPoint::new(point.x, point.y))
    }
}
