//! macOS pointer query via Core Graphics.
//!
//! `CGEvent::location` on a fresh null event reports the pointer in global
//! display coordinates, origin top-left of the main display, which is the
//! convention mouse targets use.

use core_graphics::event::CGEvent;
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use keyrelay_core::domain::ScreenPoint;

use crate::application::cursor::{CursorError, CursorLocator};

/// macOS implementation of [`CursorLocator`].
#[derive(Debug, Default)]
pub struct MacosCursorLocator;

impl MacosCursorLocator {
    pub fn new() -> Self {
        Self
    }
}

impl CursorLocator for MacosCursorLocator {
    fn position(&self) -> Result<ScreenPoint, CursorError> {
        let source = CGEventSource::new(CGEventSourceStateID::CombinedSessionState)
            .map_err(|()| CursorError::Platform("CGEventSourceCreate failed".to_string()))?;
        let event = CGEvent::new(source)
            .map_err(|()| CursorError::Platform("CGEventCreate failed".to_string()))?;
        let location = event.location();
        Ok(ScreenPoint::new(location.x as i32, location.y as i32))
    }
}
